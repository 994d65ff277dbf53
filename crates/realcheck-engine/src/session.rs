use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{bail, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use realcheck_contracts::catalog::{AssetCatalog, CategoryFilter, Image, ImageKind, ImagePair};
use realcheck_contracts::config::SamplerConfig;
use realcheck_contracts::error::SamplerError;
use realcheck_contracts::events::{new_session_id, now_utc_iso, EventLog, SessionEvent};
use realcheck_contracts::history::SessionHistory;
use realcheck_contracts::runs::scoreboard::Scoreboard;
use realcheck_contracts::runs::summary::SessionSummary;
use serde::{Deserialize, Serialize};

use crate::pairs::PairSampler;
use crate::sequence::SequencePlanner;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayMode {
    Pairs,
    Swipe,
}

impl PlayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayMode::Pairs => "pairs",
            PlayMode::Swipe => "swipe",
        }
    }
}

impl fmt::Display for PlayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlayMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pairs" | "pair" | "compare" => Ok(PlayMode::Pairs),
            "swipe" | "single" => Ok(PlayMode::Swipe),
            other => Err(format!("Unknown mode '{other}'.")),
        }
    }
}

/// Content currently on screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Presented {
    Pair { pair: ImagePair, ai_first: bool },
    Single { image: Image },
}

impl Presented {
    /// Images in display order.
    pub fn images(&self) -> Vec<&Image> {
        match self {
            Presented::Pair { pair, ai_first: true } => vec![&pair.ai, &pair.real],
            Presented::Pair { pair, ai_first: false } => vec![&pair.real, &pair.ai],
            Presented::Single { image } => vec![image],
        }
    }
}

/// Handle for the advance a caller schedules after revealing an answer.
/// Only the most recent ticket of the current mode/category is honoured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvanceTicket {
    epoch: u64,
    round: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoundOutcome {
    pub correct: bool,
    /// The AI image of a pair, or the image labelled in swipe mode.
    pub truth: Image,
    pub score: Scoreboard,
    pub ticket: AdvanceTicket,
}

/// One play session: a shared history, both samplers and the score.
pub struct GameSession<R: Rng = StdRng> {
    session_id: String,
    started_at: String,
    history: SessionHistory,
    rng: R,
    pairs: PairSampler,
    sequence: SequencePlanner,
    mode: Option<PlayMode>,
    filter: CategoryFilter,
    presented: Option<Presented>,
    awaiting_guess: bool,
    score: Scoreboard,
    images_shown: u64,
    epoch: u64,
    pending: Option<AdvanceTicket>,
    events: Option<EventLog>,
}

impl GameSession<StdRng> {
    pub fn seeded(catalog: Arc<AssetCatalog>, config: SamplerConfig, seed: u64) -> Result<Self> {
        Self::new(catalog, config, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> GameSession<R> {
    pub fn new(catalog: Arc<AssetCatalog>, config: SamplerConfig, rng: R) -> Result<Self> {
        let pairs = PairSampler::new(Arc::clone(&catalog), config.clone())?;
        let sequence = SequencePlanner::new(catalog, config.clone())?;
        Ok(Self {
            session_id: new_session_id(),
            started_at: now_utc_iso(),
            history: SessionHistory::new(config.history_len),
            rng,
            pairs,
            sequence,
            mode: None,
            filter: CategoryFilter::All,
            presented: None,
            awaiting_guess: false,
            score: Scoreboard::default(),
            images_shown: 0,
            epoch: 0,
            pending: None,
            events: None,
        })
    }

    /// Routes session events to `log`; the session adopts its id.
    pub fn attach_events(&mut self, log: EventLog) -> Result<()> {
        self.session_id = log.session_id().to_string();
        self.events = Some(log);
        self.emit(&SessionEvent::SessionStarted {
            started_at: &self.started_at,
            config: self.pairs.config(),
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn mode(&self) -> Option<PlayMode> {
        self.mode
    }

    pub fn filter(&self) -> CategoryFilter {
        self.filter
    }

    pub fn presented(&self) -> Option<&Presented> {
        self.presented.as_ref()
    }

    pub fn score(&self) -> Scoreboard {
        self.score
    }

    pub fn history(&self) -> &SessionHistory {
        &self.history
    }

    pub fn is_awaiting_guess(&self) -> bool {
        self.awaiting_guess
    }

    /// Switches mode and category and shows fresh content. Any advance
    /// scheduled before the switch is invalidated. On error the session keeps
    /// its previous mode, category and content.
    pub fn start(&mut self, mode: PlayMode, filter: CategoryFilter) -> Result<&Presented> {
        let presented = self.draw(mode, filter, true)?;
        self.epoch += 1;
        self.pending = None;
        self.mode = Some(mode);
        self.filter = filter;
        self.emit(&SessionEvent::ModeChanged {
            mode: mode.as_str(),
            category: filter,
        })?;
        self.show(presented)
    }

    pub fn guess_pair(&mut self, ai_id: &str) -> Result<RoundOutcome> {
        let Some(Presented::Pair { pair, .. }) = self.presented.as_ref() else {
            bail!("no pair is being shown");
        };
        let truth = pair.ai.clone();
        let correct = truth.id == ai_id;
        self.finish_round(correct, truth)
    }

    pub fn guess_swipe(&mut self, kind: ImageKind) -> Result<RoundOutcome> {
        let Some(Presented::Single { image }) = self.presented.as_ref() else {
            bail!("no single image is being shown");
        };
        let truth = image.clone();
        let correct = truth.kind == kind;
        self.finish_round(correct, truth)
    }

    /// Performs a scheduled advance. Stale tickets are discarded and yield
    /// `Ok(None)`.
    pub fn fire(&mut self, ticket: AdvanceTicket) -> Result<Option<&Presented>> {
        let Some(mode) = self.mode else {
            bail!("session has not been started");
        };
        if self.pending != Some(ticket) {
            self.emit(&SessionEvent::AdvanceDiscarded {
                ticket_epoch: ticket.epoch,
                ticket_round: ticket.round,
            })?;
            return Ok(None);
        }
        let presented = self.draw(mode, self.filter, false)?;
        self.pending = None;
        self.show(presented).map(Some)
    }

    /// Clears history, score and pending advances, then re-presents content
    /// for the current mode and category. When no fresh content can be drawn
    /// the session is left exactly as it was.
    pub fn reset(&mut self) -> Result<Option<&Presented>> {
        let history = self.history.clone();
        let sequence = self.sequence.clone();
        self.history.clear();
        self.sequence.clear();

        let presented = match self.mode {
            Some(mode) => match self.draw(mode, self.filter, true) {
                Ok(presented) => Some(presented),
                Err(err) => {
                    self.history = history;
                    self.sequence = sequence;
                    return Err(err);
                }
            },
            None => None,
        };

        self.score.reset();
        self.images_shown = 0;
        self.epoch += 1;
        self.pending = None;
        self.presented = None;
        self.awaiting_guess = false;
        self.emit(&SessionEvent::SessionReset)?;
        match presented {
            Some(presented) => self.show(presented).map(Some),
            None => Ok(None),
        }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.session_id.clone(),
            started_at: self.started_at.clone(),
            finished_at: now_utc_iso(),
            mode: self
                .mode
                .map(|mode| mode.as_str().to_string())
                .unwrap_or_else(|| "none".to_string()),
            category: self.filter.to_string(),
            score: self.score,
            images_shown: self.images_shown,
        }
    }

    fn draw(&mut self, mode: PlayMode, filter: CategoryFilter, restart: bool) -> Result<Presented> {
        let drawn = match (mode, restart) {
            (PlayMode::Pairs, _) => self
                .pairs
                .next_pair(filter, &mut self.history, &mut self.rng)
                .map(|pair| {
                    Some(Presented::Pair {
                        pair,
                        ai_first: self.rng.gen_bool(0.5),
                    })
                }),
            (PlayMode::Swipe, true) => self
                .sequence
                .initialize(filter, &mut self.history, &mut self.rng)
                .map(|()| self.current_single()),
            (PlayMode::Swipe, false) => Ok(self
                .sequence
                .advance(&mut self.history, &mut self.rng)
                .cloned()
                .map(|image| Presented::Single { image })),
        };

        let presented = match drawn {
            Ok(Some(presented)) => presented,
            Ok(None) => bail!("swipe sequence has no current image"),
            Err(err) => {
                self.log_sampler_error(&err, mode, filter)?;
                return Err(err.into());
            }
        };

        match &presented {
            Presented::Pair { pair, .. } => self.emit(&SessionEvent::PairDrawn {
                category: pair.category,
                real_id: &pair.real.id,
                ai_id: &pair.ai.id,
            })?,
            Presented::Single { image } if restart => {
                self.emit(&SessionEvent::SequenceInitialized {
                    category: filter,
                    pool_len: self.sequence.pool_len(),
                    image_id: &image.id,
                })?
            }
            Presented::Single { image } => {
                if let Some(trigger) = self.sequence.last_reshuffle() {
                    self.emit(&SessionEvent::SequenceReshuffled {
                        trigger: trigger.as_str(),
                        reshuffles: self.sequence.reshuffles(),
                    })?;
                }
                self.emit(&SessionEvent::ImageShown {
                    image_id: &image.id,
                    cursor: self.sequence.cursor(),
                })?;
            }
        }
        Ok(presented)
    }

    fn current_single(&self) -> Option<Presented> {
        self.sequence
            .current()
            .cloned()
            .map(|image| Presented::Single { image })
    }

    fn show(&mut self, presented: Presented) -> Result<&Presented> {
        self.images_shown += presented.images().len() as u64;
        self.awaiting_guess = true;
        let presented: &Presented = self.presented.insert(presented);
        Ok(presented)
    }

    fn finish_round(&mut self, correct: bool, truth: Image) -> Result<RoundOutcome> {
        if !self.awaiting_guess {
            bail!("this round was already answered");
        }
        self.awaiting_guess = false;
        self.score.record(correct);
        let ticket = AdvanceTicket {
            epoch: self.epoch,
            round: self.score.rounds,
        };
        self.pending = Some(ticket);
        self.emit(&SessionEvent::GuessRecorded {
            image_id: &truth.id,
            correct,
            score: self.score,
        })?;
        Ok(RoundOutcome {
            correct,
            truth,
            score: self.score,
            ticket,
        })
    }

    fn log_sampler_error(
        &self,
        err: &SamplerError,
        mode: PlayMode,
        filter: CategoryFilter,
    ) -> Result<()> {
        self.emit(&SessionEvent::SamplerError {
            code: err.code(),
            message: err.to_string(),
            mode: mode.as_str(),
            category: filter,
        })
    }

    fn emit(&self, event: &SessionEvent<'_>) -> Result<()> {
        if let Some(log) = self.events.as_ref() {
            log.record(event)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use realcheck_contracts::catalog::Category;
    use serde_json::{json, Value};

    use super::*;

    fn catalog() -> Arc<AssetCatalog> {
        let mut builder = AssetCatalog::builder();
        for key in ["1", "2", "3"] {
            builder
                .insert(Category::People, ImageKind::Real, key, format!("people/real/{key}.jpg"))
                .expect("insert real");
            builder
                .insert(Category::People, ImageKind::Ai, key, format!("people/ai/{key}.jpg"))
                .expect("insert ai");
        }
        builder
            .insert(Category::Nature, ImageKind::Real, "1", "nature/real/1.jpg")
            .expect("insert nature");
        builder
            .insert(Category::City, ImageKind::Real, "1", "city/real/1.jpg")
            .expect("insert city");
        builder
            .insert(Category::City, ImageKind::Ai, "1", "city/ai/1.jpg")
            .expect("insert city ai");
        Arc::new(builder.build())
    }

    fn session() -> GameSession {
        GameSession::seeded(catalog(), SamplerConfig::default(), 42).expect("session")
    }

    fn ai_id(session: &GameSession) -> String {
        match session.presented() {
            Some(Presented::Pair { pair, .. }) => pair.ai.id.clone(),
            _ => String::new(),
        }
    }

    #[test]
    fn pair_rounds_update_score_and_streak() -> anyhow::Result<()> {
        let mut session = session();
        session.start(PlayMode::Pairs, CategoryFilter::All)?;

        let answer = ai_id(&session);
        let outcome = session.guess_pair(&answer)?;
        assert!(outcome.correct);
        assert_eq!(outcome.truth.id, answer);
        assert_eq!(outcome.score.streak, 1);
        session.fire(outcome.ticket)?;

        let outcome = session.guess_pair("not-an-id")?;
        assert!(!outcome.correct);
        assert_eq!(outcome.score.rounds, 2);
        assert_eq!(outcome.score.streak, 0);
        assert_eq!(outcome.score.best_streak, 1);
        Ok(())
    }

    #[test]
    fn pair_images_are_listed_in_display_order() -> anyhow::Result<()> {
        let mut session = session();
        let presented = session.start(PlayMode::Pairs, CategoryFilter::All)?.clone();
        let Presented::Pair { pair, ai_first } = &presented else {
            panic!("expected a pair");
        };
        let images = presented.images();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].is_ai(), *ai_first);
        assert!(images.contains(&&pair.real));
        assert!(images.contains(&&pair.ai));
        Ok(())
    }

    #[test]
    fn answering_twice_is_rejected() -> anyhow::Result<()> {
        let mut session = session();
        session.start(PlayMode::Pairs, CategoryFilter::All)?;
        let answer = ai_id(&session);
        session.guess_pair(&answer)?;
        assert!(session.guess_pair(&answer).is_err());
        assert_eq!(session.score().rounds, 1);
        Ok(())
    }

    #[test]
    fn swipe_guesses_compare_image_kind() -> anyhow::Result<()> {
        let mut session = session();
        session.start(PlayMode::Swipe, CategoryFilter::Only(Category::People))?;

        let kind = match session.presented() {
            Some(Presented::Single { image }) => image.kind,
            _ => panic!("expected a single image"),
        };
        let outcome = session.guess_swipe(kind)?;
        assert!(outcome.correct);

        let next = session.fire(outcome.ticket)?.cloned();
        assert!(matches!(next, Some(Presented::Single { .. })));
        assert!(session.guess_pair("people-ai-1").is_err());
        Ok(())
    }

    #[test]
    fn stale_ticket_after_category_switch_is_discarded() -> anyhow::Result<()> {
        let mut session = session();
        session.start(PlayMode::Swipe, CategoryFilter::All)?;
        let kind = ImageKind::Ai;
        let outcome = session.guess_swipe(kind)?;

        session.start(PlayMode::Swipe, CategoryFilter::Only(Category::City))?;
        let before = session.presented().cloned();
        assert!(session.fire(outcome.ticket)?.is_none());
        assert_eq!(session.presented().cloned(), before);
        assert!(session.is_awaiting_guess());
        Ok(())
    }

    #[test]
    fn ticket_fires_only_once() -> anyhow::Result<()> {
        let mut session = session();
        session.start(PlayMode::Pairs, CategoryFilter::Only(Category::People))?;
        let outcome = session.guess_pair("people-ai-1")?;
        assert!(session.fire(outcome.ticket)?.is_some());
        assert!(session.fire(outcome.ticket)?.is_none());
        Ok(())
    }

    #[test]
    fn reset_clears_score_history_and_pending_advance() -> anyhow::Result<()> {
        let mut session = session();
        session.start(PlayMode::Pairs, CategoryFilter::All)?;
        let outcome = session.guess_pair("people-ai-1")?;

        let presented = session.reset()?.cloned();
        assert!(presented.is_some());
        assert_eq!(session.score(), Scoreboard::default());
        assert_eq!(session.history().len(), 2);
        assert!(session.fire(outcome.ticket)?.is_none());
        Ok(())
    }

    #[test]
    fn failed_reset_leaves_session_untouched() -> anyhow::Result<()> {
        let mut session = session();
        session.start(PlayMode::Pairs, CategoryFilter::Only(Category::People))?;
        let outcome = session.guess_pair("people-ai-1")?;
        let presented = session.presented().cloned();
        let history: Vec<String> = session.history().iter().map(str::to_string).collect();

        // Nature has no AI images, so nothing can be redrawn.
        session.filter = CategoryFilter::Only(Category::Nature);
        assert!(session.reset().is_err());

        assert_eq!(session.presented().cloned(), presented);
        assert_eq!(session.score(), outcome.score);
        assert_eq!(
            session.history().iter().map(str::to_string).collect::<Vec<_>>(),
            history
        );
        session.filter = CategoryFilter::Only(Category::People);
        assert!(session.fire(outcome.ticket)?.is_some());
        Ok(())
    }

    #[test]
    fn failed_swipe_reset_keeps_the_sequence() -> anyhow::Result<()> {
        let mut session = session();
        session.start(PlayMode::Swipe, CategoryFilter::Only(Category::City))?;
        let current = session.presented().cloned();

        session.filter = CategoryFilter::Only(Category::Nature);
        assert!(session.reset().is_err());
        session.filter = CategoryFilter::Only(Category::City);

        assert_eq!(session.presented().cloned(), current);
        assert_eq!(session.sequence.pool_len(), 2);
        assert!(session.is_awaiting_guess());
        Ok(())
    }

    #[test]
    fn failed_switch_keeps_previous_state_and_logs_error() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let events_path = temp.path().join("events.jsonl");
        let mut session = session();
        session.attach_events(EventLog::open(&events_path, "session-abc")?)?;
        session.start(PlayMode::Pairs, CategoryFilter::Only(Category::People))?;

        let err = session
            .start(PlayMode::Pairs, CategoryFilter::Only(Category::Nature))
            .err()
            .and_then(|err| err.downcast::<SamplerError>().ok());
        assert_eq!(
            err,
            Some(SamplerError::CategoryUnavailable {
                category: Category::Nature
            })
        );
        assert_eq!(
            session.filter(),
            CategoryFilter::Only(Category::People)
        );

        let raw = std::fs::read_to_string(&events_path)?;
        let events: Vec<Value> = raw
            .lines()
            .map(|line| serde_json::from_str::<Value>(line))
            .collect::<Result<_, _>>()?;
        let types: Vec<&str> = events
            .iter()
            .filter_map(|event| event["type"].as_str())
            .collect();
        assert_eq!(
            types,
            vec!["session_started", "pair_drawn", "mode_changed", "sampler_error"]
        );
        assert!(events
            .iter()
            .all(|event| event["session_id"] == json!("session-abc")));
        assert_eq!(events[3]["code"], json!("category_unavailable"));
        assert_eq!(events[3]["category"], json!("nature"));
        assert_eq!(events[2]["mode"], json!("pairs"));
        assert_eq!(events[1]["category"], json!("people"));
        let seqs: Vec<u64> = events.iter().filter_map(|event| event["seq"].as_u64()).collect();
        assert_eq!(seqs, vec![1, 2, 3, 4]);
        Ok(())
    }

    #[test]
    fn swipe_reshuffle_is_logged() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let events_path = temp.path().join("events.jsonl");
        let mut session = session();
        session.attach_events(EventLog::open(&events_path, "session-abc")?)?;
        session.start(PlayMode::Swipe, CategoryFilter::Only(Category::City))?;
        for _ in 0..2 {
            let outcome = session.guess_swipe(ImageKind::Real)?;
            session.fire(outcome.ticket)?;
        }

        let raw = std::fs::read_to_string(&events_path)?;
        let reshuffles: Vec<Value> = raw
            .lines()
            .filter_map(|line| serde_json::from_str::<Value>(line).ok())
            .filter(|event| event["type"] == json!("sequence_reshuffled"))
            .collect();
        assert_eq!(reshuffles.len(), 1);
        assert_eq!(reshuffles[0]["trigger"], json!("end_of_pass"));
        assert_eq!(reshuffles[0]["reshuffles"], json!(1));
        Ok(())
    }

    #[test]
    fn summary_reflects_session_progress() -> anyhow::Result<()> {
        let mut session = session();
        assert_eq!(session.summary().mode, "none");
        session.start(PlayMode::Pairs, CategoryFilter::All)?;
        let answer = ai_id(&session);
        session.guess_pair(&answer)?;

        let summary = session.summary();
        assert_eq!(summary.session_id, session.session_id());
        assert_eq!(summary.mode, "pairs");
        assert_eq!(summary.category, "all");
        assert_eq!(summary.images_shown, 2);
        assert_eq!(summary.score.correct, 1);
        Ok(())
    }

    #[test]
    fn fire_before_start_is_an_error() {
        let mut session = session();
        let ticket = AdvanceTicket { epoch: 0, round: 0 };
        assert!(session.fire(ticket).is_err());
    }

    #[test]
    fn mode_parses_aliases() {
        assert_eq!("Compare".parse::<PlayMode>(), Ok(PlayMode::Pairs));
        assert_eq!("single".parse::<PlayMode>(), Ok(PlayMode::Swipe));
        assert!("slideshow".parse::<PlayMode>().is_err());
    }
}
