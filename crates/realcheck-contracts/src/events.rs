use std::fs::{File, OpenOptions};
use std::io::{LineWriter, Write};
use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::catalog::{Category, CategoryFilter};
use crate::config::SamplerConfig;
use crate::runs::scoreboard::Scoreboard;

/// Everything a play session writes to its event log.
///
/// Serializes with a snake_case `type` tag; the log adds `session_id`, `seq`
/// and `ts` on top.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent<'a> {
    SessionStarted {
        started_at: &'a str,
        config: &'a SamplerConfig,
    },
    ModeChanged {
        mode: &'a str,
        category: CategoryFilter,
    },
    PairDrawn {
        category: Category,
        real_id: &'a str,
        ai_id: &'a str,
    },
    SequenceInitialized {
        category: CategoryFilter,
        pool_len: usize,
        image_id: &'a str,
    },
    SequenceReshuffled {
        trigger: &'a str,
        reshuffles: u64,
    },
    ImageShown {
        image_id: &'a str,
        cursor: usize,
    },
    GuessRecorded {
        image_id: &'a str,
        correct: bool,
        score: Scoreboard,
    },
    AdvanceDiscarded {
        ticket_epoch: u64,
        ticket_round: u64,
    },
    SessionReset,
    SamplerError {
        code: &'a str,
        message: String,
        mode: &'a str,
        category: CategoryFilter,
    },
}

/// Append-only `events.jsonl` for one session, one compact object per line.
#[derive(Debug)]
pub struct EventLog {
    session_id: String,
    state: Mutex<LogState>,
}

#[derive(Debug)]
struct LogState {
    out: LineWriter<File>,
    seq: u64,
}

impl EventLog {
    /// Opens `path` for appending, creating parent directories.
    pub fn open(path: &Path, session_id: impl Into<String>) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open event log {}", path.display()))?;
        Ok(Self {
            session_id: session_id.into(),
            state: Mutex::new(LogState {
                out: LineWriter::new(file),
                seq: 0,
            }),
        })
    }

    /// Log with a fresh random session id.
    pub fn for_new_session(path: &Path) -> anyhow::Result<Self> {
        Self::open(path, new_session_id())
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Appends `event` and returns the line as written.
    pub fn record(&self, event: &SessionEvent<'_>) -> anyhow::Result<Value> {
        let mut line = serde_json::to_value(event)?;
        let mut state = self
            .state
            .lock()
            .map_err(|_| anyhow::anyhow!("event log lock poisoned"))?;
        state.seq += 1;
        if let Value::Object(fields) = &mut line {
            fields.insert("session_id".to_string(), Value::from(self.session_id.as_str()));
            fields.insert("seq".to_string(), Value::from(state.seq));
            fields.insert("ts".to_string(), Value::from(now_utc_iso()));
        }
        serde_json::to_writer(&mut state.out, &line)?;
        state.out.write_all(b"\n")?;
        Ok(line)
    }
}

pub fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn now_utc_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}
