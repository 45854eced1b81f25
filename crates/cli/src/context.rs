use std::path::PathBuf;

use anyhow::{Context as _, Result};
use relay_core::adapters::fs::RelayPaths;
use relay_core::config::{self, Config};
use relay_core::mailbox::FsMailbox;
use relay_core::store::JsonTaskStore;
use relay_core::timeline::JsonlTimeline;

/// Everything a command needs up front: the project root, the merged config,
/// and the resolved bus paths. Storage handles are built on demand.
#[derive(Debug, Clone)]
pub struct CommandContext {
  pub root: PathBuf,
  pub config: Config,
  pub paths: RelayPaths,
}

impl CommandContext {
  pub fn resolve() -> Result<Self> {
    let root = std::env::current_dir().context("cannot resolve working directory")?;
    Self::at(root)
  }

  pub fn at(root: PathBuf) -> Result<Self> {
    let config = config::load(Some(&root)).context("failed to load config")?;
    let paths = RelayPaths::resolve(&root, &config);
    Ok(Self {
      root,
      config,
      paths,
    })
  }

  pub fn store(&self) -> JsonTaskStore {
    JsonTaskStore::new(self.paths.tasks_path())
  }

  pub fn timeline(&self) -> JsonlTimeline {
    JsonlTimeline::new(self.paths.timeline_path())
  }

  pub fn mailbox(&self) -> FsMailbox {
    FsMailbox::new(self.paths.clone())
  }
}
