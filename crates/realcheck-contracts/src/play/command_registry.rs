#[derive(Clone, Copy, Debug)]
pub(crate) struct CommandSpec {
    pub command: &'static str,
    pub action: &'static str,
}

pub(crate) const ARG_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "category",
        action: "set_category",
    },
    CommandSpec {
        command: "mode",
        action: "set_mode",
    },
];

pub(crate) const NO_ARG_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "reset",
        action: "reset",
    },
    CommandSpec {
        command: "score",
        action: "score",
    },
    CommandSpec {
        command: "help",
        action: "help",
    },
    CommandSpec {
        command: "quit",
        action: "quit",
    },
    CommandSpec {
        command: "exit",
        action: "quit",
    },
];

/// Bare answers: pair-mode side picks and swipe-mode labels.
pub(crate) const PICK_ANSWERS: &[(&str, u64)] = &[("1", 1), ("2", 2), ("left", 1), ("right", 2)];
pub(crate) const LABEL_ANSWERS: &[(&str, &str)] = &[
    ("real", "real"),
    ("r", "real"),
    ("ai", "ai"),
    ("a", "ai"),
    ("fake", "ai"),
];

pub const PLAY_HELP_COMMANDS: &[&str] = &[
    "1|2",
    "real|ai",
    "/category",
    "/mode",
    "/reset",
    "/score",
    "/help",
    "/quit",
];
