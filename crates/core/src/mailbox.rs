use std::fs;
use std::path::PathBuf;

use thiserror::Error;
use tracing::warn;

use crate::adapters::fs::RelayPaths;
use crate::domain::envelope::Envelope;

#[derive(Debug, Error)]
pub enum MailboxError {
  #[error("io: {0}")]
  Io(#[from] std::io::Error),
  #[error("serialize: {0}")]
  Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MailboxError>;

/// One envelope collected from an agent's outbox, together with the claim
/// needed to remove it after processing.
#[derive(Debug, Clone)]
pub struct OutboxEntry {
  pub from: String,
  pub envelope: Envelope,
  pub path: PathBuf,
}

/// Per-agent delivery queue. The filesystem tree is the default medium, but
/// the router and reconciler only ever speak through this trait.
pub trait Mailbox {
  /// Write a copy of the envelope into `agent`'s inbox.
  fn deliver(&self, agent: &str, envelope: &Envelope) -> Result<()>;

  /// Read every parseable envelope currently in `agent`'s outbox. Entries
  /// that cannot be read or parsed are skipped, not errors.
  fn collect(&self, agent: &str) -> Result<Vec<OutboxEntry>>;

  /// Remove a processed entry. A missing file means another pass got there
  /// first; that counts as removed.
  fn remove(&self, entry: &OutboxEntry) -> Result<()>;
}

/// Mailboxes as directories: `<agent>.in` / `<agent>.out` under the
/// mailboxes root, one `<id>-<millis>.json` file per envelope copy.
#[derive(Debug, Clone)]
pub struct FsMailbox {
  paths: RelayPaths,
}

impl FsMailbox {
  pub fn new(paths: RelayPaths) -> Self {
    Self { paths }
  }
}

impl Mailbox for FsMailbox {
  fn deliver(&self, agent: &str, envelope: &Envelope) -> Result<()> {
    let inbox = self.paths.inbox_dir(agent);
    fs::create_dir_all(&inbox)?;
    let file = inbox.join(envelope.filename());
    let body = serde_json::to_string_pretty(envelope)?;
    fs::write(file, body)?;
    Ok(())
  }

  fn collect(&self, agent: &str) -> Result<Vec<OutboxEntry>> {
    let outbox = self.paths.outbox_dir(agent);
    let entries = match fs::read_dir(&outbox) {
      Ok(entries) => entries,
      Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
      Err(err) => return Err(err.into()),
    };

    let mut names: Vec<String> = entries
      .filter_map(|e| e.ok())
      .map(|e| e.file_name().to_string_lossy().into_owned())
      .filter(|name| name.ends_with(".json"))
      .collect();
    names.sort();

    let mut collected = Vec::new();
    for name in names {
      let path = outbox.join(&name);
      let envelope = fs::read_to_string(&path)
        .map_err(MailboxError::from)
        .and_then(|s| serde_json::from_str::<Envelope>(&s).map_err(MailboxError::from));
      match envelope {
        Ok(envelope) => collected.push(OutboxEntry {
          from: agent.to_string(),
          envelope,
          path,
        }),
        Err(err) => {
          warn!(
            event = "drain_skip",
            agent,
            file = %path.display(),
            error = %err,
            "skipping unreadable outbox entry"
          );
        }
      }
    }
    Ok(collected)
  }

  fn remove(&self, entry: &OutboxEntry) -> Result<()> {
    match fs::remove_file(&entry.path) {
      Ok(()) => Ok(()),
      Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
      Err(err) => {
        warn!(
          event = "drain_remove_failed",
          file = %entry.path.display(),
          error = %err,
          "could not remove processed outbox entry"
        );
        Ok(())
      }
    }
  }
}
