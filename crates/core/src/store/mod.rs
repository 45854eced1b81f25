pub mod fold;

use std::fs;
use std::path::PathBuf;

use thiserror::Error;
use tracing::warn;

use crate::domain::task::{Task, TasksDocument};

pub use fold::{RECOGNIZED_PROVIDERS, fold_envelope, upsert};

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("io: {0}")]
  Io(#[from] std::io::Error),
  #[error("serialize: {0}")]
  Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Whole-document persistence for task state. Mutation happens exclusively
/// through the fold in [`fold`]; implementations only move the document
/// between memory and storage.
pub trait TaskStore {
  /// The persisted document. A missing or unreadable file yields an empty
  /// document, never an error; corruption resets the store.
  fn load(&self) -> TasksDocument;

  /// Overwrite the whole document.
  fn save(&self, doc: &TasksDocument) -> Result<()>;
}

/// `tasks.json` on disk, pretty-printed. Also accepts a bare top-level task
/// array, the layout older state files used.
#[derive(Debug, Clone)]
pub struct JsonTaskStore {
  path: PathBuf,
}

impl JsonTaskStore {
  pub fn new(path: PathBuf) -> Self {
    Self { path }
  }
}

impl TaskStore for JsonTaskStore {
  fn load(&self) -> TasksDocument {
    let raw = match fs::read_to_string(&self.path) {
      Ok(raw) => raw,
      Err(err) if err.kind() == std::io::ErrorKind::NotFound => return TasksDocument::default(),
      Err(err) => {
        warn!(
          event = "store_reset",
          path = %self.path.display(),
          error = %err,
          "task store unreadable, treating as empty"
        );
        return TasksDocument::default();
      }
    };
    if let Ok(doc) = serde_json::from_str::<TasksDocument>(&raw) {
      return doc;
    }
    if let Ok(tasks) = serde_json::from_str::<Vec<Task>>(&raw) {
      return TasksDocument { tasks };
    }
    warn!(
      event = "store_reset",
      path = %self.path.display(),
      "task store corrupt, treating as empty"
    );
    TasksDocument::default()
  }

  fn save(&self, doc: &TasksDocument) -> Result<()> {
    let body = serde_json::to_string_pretty(doc)?;
    fs::write(&self.path, body)?;
    Ok(())
  }
}
