use std::collections::BTreeMap;

use serde_json::Value;

use super::command_registry::{
    CommandSpec, ARG_COMMANDS, LABEL_ANSWERS, NO_ARG_COMMANDS, PICK_ANSWERS,
};

/// One parsed line of interactive play input.
#[derive(Debug, Clone, PartialEq)]
pub struct Intent {
    pub action: String,
    pub raw: String,
    pub command_args: BTreeMap<String, Value>,
}

impl Intent {
    fn new(action: &str, raw: &str) -> Self {
        Self {
            action: action.to_string(),
            raw: raw.to_string(),
            command_args: BTreeMap::new(),
        }
    }

    fn with_arg(mut self, key: &str, value: Value) -> Self {
        self.command_args.insert(key.to_string(), value);
        self
    }

    pub fn arg_str(&self, key: &str) -> Option<&str> {
        self.command_args
            .get(key)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
    }
}

fn find_action(command: &str, specs: &[CommandSpec]) -> Option<&'static str> {
    specs
        .iter()
        .find(|spec| spec.command == command)
        .map(|spec| spec.action)
}

pub fn parse_intent(text: &str) -> Intent {
    let raw_trimmed = text.trim();
    if raw_trimmed.is_empty() {
        return Intent::new("noop", text);
    }

    if let Some(slash_tail) = raw_trimmed.strip_prefix('/') {
        let command_len = slash_tail
            .chars()
            .take_while(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
            .count();
        if command_len > 0 {
            let command = slash_tail[..command_len].to_ascii_lowercase();
            let arg = slash_tail[command_len..].trim();

            if let Some(action) = find_action(&command, ARG_COMMANDS) {
                let key = if action == "set_category" {
                    "category"
                } else {
                    "mode"
                };
                return Intent::new(action, text)
                    .with_arg(key, Value::String(arg.to_ascii_lowercase()));
            }

            if let Some(action) = find_action(&command, NO_ARG_COMMANDS) {
                return Intent::new(action, text);
            }

            return Intent::new("unknown", text)
                .with_arg("command", Value::String(command))
                .with_arg("arg", Value::String(arg.to_string()));
        }
    }

    let answer = raw_trimmed.to_ascii_lowercase();
    if let Some((_, side)) = PICK_ANSWERS.iter().find(|(key, _)| *key == answer) {
        return Intent::new("pick", text).with_arg("side", Value::from(*side));
    }
    if let Some((_, kind)) = LABEL_ANSWERS.iter().find(|(key, _)| *key == answer) {
        return Intent::new("label", text).with_arg("kind", Value::String((*kind).to_string()));
    }

    Intent::new("unrecognized", text)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::parse_intent;

    #[test]
    fn parse_blank_is_noop() {
        assert_eq!(parse_intent("   \n").action, "noop");
    }

    #[test]
    fn parse_category_and_mode_commands() {
        let category = parse_intent("/category  Nature ");
        assert_eq!(category.action, "set_category");
        assert_eq!(category.arg_str("category"), Some("nature"));

        let mode = parse_intent("/MODE swipe");
        assert_eq!(mode.action, "set_mode");
        assert_eq!(mode.command_args["mode"], json!("swipe"));
    }

    #[test]
    fn parse_category_without_argument_has_no_value() {
        let intent = parse_intent("/category");
        assert_eq!(intent.action, "set_category");
        assert_eq!(intent.arg_str("category"), None);
    }

    #[test]
    fn parse_no_arg_commands() {
        assert_eq!(parse_intent("/reset").action, "reset");
        assert_eq!(parse_intent("/score").action, "score");
        assert_eq!(parse_intent("/help").action, "help");
        assert_eq!(parse_intent("/exit").action, "quit");
    }

    #[test]
    fn parse_answers() {
        let pick = parse_intent("2");
        assert_eq!(pick.action, "pick");
        assert_eq!(pick.command_args["side"], json!(2));

        assert_eq!(parse_intent("LEFT").command_args["side"], json!(1));

        let label = parse_intent("Fake");
        assert_eq!(label.action, "label");
        assert_eq!(label.command_args["kind"], json!("ai"));
        assert_eq!(parse_intent("r").command_args["kind"], json!("real"));
    }

    #[test]
    fn parse_unknown_slash_command_keeps_arguments() {
        let intent = parse_intent("/share twitter");
        assert_eq!(intent.action, "unknown");
        assert_eq!(intent.command_args["command"], json!("share"));
        assert_eq!(intent.command_args["arg"], json!("twitter"));
    }

    #[test]
    fn parse_free_text_is_unrecognized() {
        assert_eq!(parse_intent("maybe the left one").action, "unrecognized");
    }
}
