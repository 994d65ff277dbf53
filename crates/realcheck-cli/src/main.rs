use std::collections::BTreeMap;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use realcheck_contracts::catalog::{AssetCatalog, Category, CategoryFilter, ImageKind};
use realcheck_contracts::config::SamplerConfig;
use realcheck_contracts::events::EventLog;
use realcheck_contracts::history::SessionHistory;
use realcheck_contracts::play::{parse_intent, Intent, PLAY_HELP_COMMANDS};
use realcheck_contracts::runs::summary::write_summary;
use realcheck_engine::{GameSession, PairSampler, PlayMode, Presented, RoundOutcome, SequencePlanner};
use serde_json::{json, Value};

#[derive(Debug, Parser)]
#[command(name = "realcheck", version, about = "Real-or-AI image game")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Catalog(CatalogArgs),
    Play(PlayArgs),
    Simulate(SimulateArgs),
}

#[derive(Debug, Parser)]
struct CatalogArgs {
    #[arg(long)]
    manifest: PathBuf,
}

#[derive(Debug, Parser)]
struct PlayArgs {
    #[arg(long)]
    manifest: PathBuf,
    #[arg(long, default_value = "pairs")]
    mode: PlayMode,
    #[arg(long, default_value = "all")]
    category: CategoryFilter,
    #[arg(long)]
    out: Option<PathBuf>,
    #[arg(long)]
    events: Option<PathBuf>,
    /// Pause between revealing an answer and the next round.
    #[arg(long, default_value_t = 0)]
    reveal_ms: u64,
    #[command(flatten)]
    sampler: SamplerArgs,
}

#[derive(Debug, Parser)]
struct SimulateArgs {
    #[arg(long)]
    manifest: PathBuf,
    #[arg(long, default_value = "pairs")]
    mode: PlayMode,
    #[arg(long, default_value = "all")]
    category: CategoryFilter,
    #[arg(long, default_value_t = 20)]
    rounds: usize,
    #[command(flatten)]
    sampler: SamplerArgs,
}

#[derive(Debug, Args)]
struct SamplerArgs {
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    history_len: Option<usize>,
    #[arg(long)]
    primary: Option<Category>,
    #[arg(long, conflicts_with = "primary")]
    no_primary: bool,
    #[arg(long)]
    primary_weight: Option<usize>,
    #[arg(long)]
    unique_target: Option<usize>,
    #[arg(long)]
    max_attempts: Option<usize>,
}

impl SamplerArgs {
    fn config(&self) -> Result<SamplerConfig> {
        let mut config = SamplerConfig::default();
        if let Some(value) = self.history_len {
            config.history_len = value;
        }
        if let Some(primary) = self.primary {
            config.primary_category = Some(primary);
        }
        if self.no_primary {
            config.primary_category = None;
        }
        if let Some(value) = self.primary_weight {
            config.primary_weight = value;
        }
        if let Some(value) = self.unique_target {
            config.unique_target = value;
        }
        if let Some(value) = self.max_attempts {
            config.max_attempts = value;
        }
        config.validate()?;
        Ok(config)
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("realcheck error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Catalog(args) => run_catalog(args),
        Command::Play(args) => run_play(args),
        Command::Simulate(args) => run_simulate(args),
    }
}

fn load_catalog(path: &Path) -> Result<Arc<AssetCatalog>> {
    Ok(Arc::new(AssetCatalog::from_manifest_path(path)?))
}

fn run_catalog(args: CatalogArgs) -> Result<i32> {
    let catalog = load_catalog(&args.manifest)?;
    for (category, pool) in catalog.categories() {
        let status = if pool.is_available() {
            "available"
        } else {
            "unavailable"
        };
        println!(
            "{category}: real={} ai={} {status}",
            pool.real.len(),
            pool.ai.len()
        );
    }
    if catalog.available_categories().is_empty() {
        eprintln!("No category has both real and AI images.");
        return Ok(2);
    }
    Ok(0)
}

fn run_play(args: PlayArgs) -> Result<i32> {
    let catalog = load_catalog(&args.manifest)?;
    let config = args.sampler.config()?;
    let mut session = GameSession::new(catalog, config, args.sampler.rng())?;

    let events_path = args
        .events
        .clone()
        .or_else(|| args.out.as_ref().map(|out| out.join("events.jsonl")));
    if let Some(path) = events_path {
        session.attach_events(EventLog::for_new_session(&path)?)?;
    }

    let reveal = Duration::from_millis(args.reveal_ms);
    let mut mode = args.mode;
    match session.start(mode, args.category) {
        Ok(presented) => print_presented(presented),
        Err(err) => eprintln!("{err}"),
    }

    println!("Real or AI? Type /help for commands.");
    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        io::stdout().flush()?;

        line.clear();
        let read = match stdin.read_line(&mut line) {
            Ok(read) => read,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };
        if read == 0 {
            break;
        }

        let intent = parse_intent(line.trim_end_matches(['\n', '\r']));
        match intent.action.as_str() {
            "noop" => {}
            "quit" => break,
            "help" => println!("Commands: {}", PLAY_HELP_COMMANDS.join(" ")),
            "score" => {
                let score = session.score();
                println!(
                    "Score {}/{} ({:.0}%), streak {}, best {}",
                    score.correct,
                    score.rounds,
                    score.accuracy() * 100.0,
                    score.streak,
                    score.best_streak
                );
            }
            "reset" => match session.reset() {
                Ok(Some(presented)) => print_presented(presented),
                Ok(None) => println!("Session reset."),
                Err(err) => eprintln!("{err}"),
            },
            "set_category" => {
                let Some(filter) = parse_arg::<CategoryFilter>(&intent, "category") else {
                    continue;
                };
                match session.start(mode, filter) {
                    Ok(presented) => print_presented(presented),
                    Err(err) => eprintln!("{err}"),
                }
            }
            "set_mode" => {
                let Some(next_mode) = parse_arg::<PlayMode>(&intent, "mode") else {
                    continue;
                };
                let filter = session.filter();
                match session.start(next_mode, filter) {
                    Ok(presented) => {
                        mode = next_mode;
                        print_presented(presented);
                    }
                    Err(err) => eprintln!("{err}"),
                }
            }
            "pick" => {
                let outcome = guess_by_side(&mut session, &intent);
                finish_round(&mut session, outcome, reveal)?;
            }
            "label" => {
                let outcome = intent
                    .arg_str("kind")
                    .unwrap_or_default()
                    .parse::<ImageKind>()
                    .map_err(anyhow::Error::msg)
                    .and_then(|kind| session.guess_swipe(kind));
                finish_round(&mut session, outcome, reveal)?;
            }
            "unknown" => println!("Unknown command. Type /help for commands."),
            _ => println!("Answer with 1 or 2 (pairs) or real/ai (swipe)."),
        }
    }

    if let Some(out) = args.out.as_ref() {
        let path = out.join("summary.json");
        write_summary(&path, &session.summary(), None)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    Ok(0)
}

fn parse_arg<T>(intent: &Intent, key: &str) -> Option<T>
where
    T: std::str::FromStr<Err = String>,
{
    let Some(raw) = intent.arg_str(key) else {
        println!("/{key} requires a value");
        return None;
    };
    match raw.parse() {
        Ok(value) => Some(value),
        Err(err) => {
            println!("{err}");
            None
        }
    }
}

fn guess_by_side(session: &mut GameSession, intent: &Intent) -> Result<RoundOutcome> {
    let side = intent
        .command_args
        .get("side")
        .and_then(Value::as_u64)
        .unwrap_or(0);
    let Some(presented) = session
        .presented()
        .filter(|presented| matches!(presented, Presented::Pair { .. }))
    else {
        bail!("pick 1 or 2 only works in pairs mode; answer real or ai");
    };
    let ai_id = side
        .checked_sub(1)
        .and_then(|idx| presented.images().get(idx as usize).map(|image| image.id.clone()))
        .unwrap_or_default();
    session.guess_pair(&ai_id)
}

fn finish_round(
    session: &mut GameSession,
    outcome: Result<RoundOutcome>,
    reveal: Duration,
) -> Result<()> {
    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(err) => {
            println!("{err}");
            return Ok(());
        }
    };
    let verdict = if outcome.correct { "Correct" } else { "Wrong" };
    println!(
        "{verdict}! {} was {}. Streak {} (best {}).",
        outcome.truth.src,
        if outcome.truth.is_ai() { "AI" } else { "real" },
        outcome.score.streak,
        outcome.score.best_streak
    );
    if !reveal.is_zero() {
        thread::sleep(reveal);
    }
    match session.fire(outcome.ticket) {
        Ok(Some(presented)) => print_presented(presented),
        Ok(None) => {}
        Err(err) => eprintln!("{err}"),
    }
    Ok(())
}

fn print_presented(presented: &Presented) {
    match presented {
        Presented::Pair { pair, .. } => {
            println!("[{}] Which one is AI?", pair.category);
            for (idx, image) in presented.images().iter().enumerate() {
                println!("  {}) {}", idx + 1, image.src);
            }
        }
        Presented::Single { image } => {
            println!("[{}] Real or AI?  {}", image.category, image.src);
        }
    }
}

fn run_simulate(args: SimulateArgs) -> Result<i32> {
    let catalog = load_catalog(&args.manifest)?;
    let config = args.sampler.config()?;
    let mut rng = args.sampler.rng();
    let mut history = SessionHistory::new(config.history_len);
    let mut shown: BTreeMap<String, u64> = BTreeMap::new();

    match args.mode {
        PlayMode::Pairs => {
            let sampler = PairSampler::new(catalog, config)?;
            for round in 1..=args.rounds {
                let pair = sampler.next_pair(args.category, &mut history, &mut rng)?;
                println!("{round:>4} {} real={} ai={}", pair.category, pair.real.id, pair.ai.id);
                *shown.entry(pair.category.to_string()).or_default() += 1;
            }
        }
        PlayMode::Swipe => {
            let mut planner = SequencePlanner::new(catalog, config)?;
            planner.initialize(args.category, &mut history, &mut rng)?;
            for round in 1..=args.rounds {
                let image = if round == 1 {
                    planner.current().cloned()
                } else {
                    planner.advance(&mut history, &mut rng).cloned()
                };
                let Some(image) = image else {
                    bail!("swipe sequence is empty");
                };
                let reshuffled = planner
                    .last_reshuffle()
                    .map(|trigger| format!(" (reshuffled: {})", trigger.as_str()))
                    .unwrap_or_default();
                println!("{round:>4} {}{reshuffled}", image.id);
                *shown.entry(image.category.to_string()).or_default() += 1;
            }
        }
    }

    println!(
        "{}",
        serde_json::to_string_pretty(&json!({"rounds_by_category": shown}))?
    );
    Ok(0)
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use realcheck_contracts::catalog::{Category, CategoryFilter};

    use super::{Cli, Command};
    use realcheck_engine::PlayMode;

    #[test]
    fn play_flags_override_sampler_defaults() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from([
            "realcheck",
            "play",
            "--manifest",
            "catalog.json",
            "--mode",
            "swipe",
            "--category",
            "nature",
            "--history-len",
            "4",
            "--no-primary",
            "--unique-target",
            "10",
        ])?;
        let Command::Play(args) = cli.command else {
            panic!("expected play command");
        };
        assert_eq!(args.mode, PlayMode::Swipe);
        assert_eq!(args.category, CategoryFilter::Only(Category::Nature));

        let config = args.sampler.config()?;
        assert_eq!(config.history_len, 4);
        assert_eq!(config.primary_category, None);
        assert_eq!(config.unique_target, 10);
        assert_eq!(config.max_attempts, 20);
        Ok(())
    }

    #[test]
    fn zero_history_is_rejected() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from([
            "realcheck",
            "simulate",
            "--manifest",
            "catalog.json",
            "--history-len",
            "0",
        ])?;
        let Command::Simulate(args) = cli.command else {
            panic!("expected simulate command");
        };
        assert!(args.sampler.config().is_err());
        Ok(())
    }

    #[test]
    fn oversized_primary_weight_is_rejected() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from([
            "realcheck",
            "simulate",
            "--manifest",
            "catalog.json",
            "--primary-weight",
            "18446744073709551615",
        ])?;
        let Command::Simulate(args) = cli.command else {
            panic!("expected simulate command");
        };
        assert!(args.sampler.config().is_err());
        Ok(())
    }

    #[test]
    fn primary_conflicts_with_no_primary() {
        let parsed = Cli::try_parse_from([
            "realcheck",
            "play",
            "--manifest",
            "catalog.json",
            "--primary",
            "city",
            "--no-primary",
        ]);
        assert!(parsed.is_err());
    }
}
