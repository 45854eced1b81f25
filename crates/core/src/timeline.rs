use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::envelope::Envelope;

/// How many journal lines a tail scan inspects by default.
pub const DEFAULT_TAIL_LIMIT: usize = 200;

#[derive(Debug, Error)]
pub enum TimelineError {
  #[error("io: {0}")]
  Io(#[from] std::io::Error),
  #[error("serialize: {0}")]
  Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TimelineError>;

/// One observed event. `from` is set for envelopes drained out of an agent's
/// outbox; command-built envelopes omit it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineRecord {
  pub ts: DateTime<Utc>,
  pub event: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub from: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub envelope: Option<Envelope>,
}

impl TimelineRecord {
  pub fn now(event: impl Into<String>, envelope: Envelope) -> Self {
    Self {
      ts: Utc::now(),
      event: event.into(),
      from: None,
      envelope: Some(envelope),
    }
  }

  /// Record for an envelope collected from `from`'s outbox.
  pub fn agent_out(from: impl Into<String>, envelope: Envelope) -> Self {
    Self {
      ts: Utc::now(),
      event: "agent.out".to_string(),
      from: Some(from.into()),
      envelope: Some(envelope),
    }
  }
}

/// Append-only audit journal of every envelope the core observes. Records are
/// never mutated or deleted; reads are windowed tails, not full scans.
pub trait Timeline {
  fn append(&self, record: &TimelineRecord) -> Result<()>;

  /// The newest records, oldest first. `limit` bounds the scanned window (so
  /// records older than the last `limit` journal lines are never returned);
  /// `since` then keeps only records strictly newer than the given instant.
  /// Unparsable lines are skipped.
  fn tail(&self, since: Option<DateTime<Utc>>, limit: usize) -> Result<Vec<TimelineRecord>>;
}

/// `timeline.jsonl` on disk, one record per line.
#[derive(Debug, Clone)]
pub struct JsonlTimeline {
  path: PathBuf,
}

impl JsonlTimeline {
  pub fn new(path: PathBuf) -> Self {
    Self { path }
  }
}

impl Timeline for JsonlTimeline {
  fn append(&self, record: &TimelineRecord) -> Result<()> {
    let line = serde_json::to_string(record)?;
    let mut file = OpenOptions::new()
      .create(true)
      .append(true)
      .open(&self.path)?;
    writeln!(file, "{line}")?;
    Ok(())
  }

  fn tail(&self, since: Option<DateTime<Utc>>, limit: usize) -> Result<Vec<TimelineRecord>> {
    let raw = match std::fs::read_to_string(&self.path) {
      Ok(raw) => raw,
      Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
      Err(err) => return Err(err.into()),
    };
    let lines: Vec<&str> = raw.lines().filter(|l| !l.trim().is_empty()).collect();
    let window = lines.len().saturating_sub(limit);
    let mut records = Vec::new();
    for line in &lines[window..] {
      let Ok(record) = serde_json::from_str::<TimelineRecord>(line) else {
        continue;
      };
      if since.is_none_or(|ts| record.ts > ts) {
        records.push(record);
      }
    }
    Ok(records)
  }
}
