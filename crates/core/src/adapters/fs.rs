use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::domain::task::TasksDocument;

/// Environment override for the mailboxes root.
pub const MAILBOX_ROOT_ENV: &str = "RELAY_MAILBOX_ROOT";
/// Environment override for the state root.
pub const STATE_ROOT_ENV: &str = "RELAY_STATE_ROOT";

/// Return path to the `.relay` folder inside the given project root
pub fn relay_dir(project_root: &Path) -> PathBuf {
  project_root.join(".relay")
}

pub fn logs_path(project_root: &Path) -> PathBuf {
  relay_dir(project_root).join("logs.jsonl")
}

/// Resolved locations of the bus directories. The mailboxes and state roots
/// are relocatable (env var first, then config, then the `.relay` default);
/// everything else hangs off the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayPaths {
  project_root: PathBuf,
  mailboxes_root: PathBuf,
  state_root: PathBuf,
}

impl RelayPaths {
  pub fn resolve(project_root: &Path, cfg: &Config) -> Self {
    let env_mailboxes = std::env::var(MAILBOX_ROOT_ENV).ok().map(PathBuf::from);
    let env_state = std::env::var(STATE_ROOT_ENV).ok().map(PathBuf::from);
    Self::resolve_with(project_root, cfg, env_mailboxes, env_state)
  }

  pub(crate) fn resolve_with(
    project_root: &Path,
    cfg: &Config,
    env_mailboxes: Option<PathBuf>,
    env_state: Option<PathBuf>,
  ) -> Self {
    let mailboxes_root = env_mailboxes
      .or_else(|| cfg.mailboxes_root.clone())
      .unwrap_or_else(|| relay_dir(project_root).join("mailboxes"));
    let state_root = env_state
      .or_else(|| cfg.state_root.clone())
      .unwrap_or_else(|| relay_dir(project_root).join("state"));
    Self {
      project_root: project_root.to_path_buf(),
      mailboxes_root,
      state_root,
    }
  }

  pub fn project_root(&self) -> &Path {
    &self.project_root
  }

  pub fn relay_dir(&self) -> PathBuf {
    relay_dir(&self.project_root)
  }

  pub fn logs_path(&self) -> PathBuf {
    logs_path(&self.project_root)
  }

  pub fn mailboxes_root(&self) -> &Path {
    &self.mailboxes_root
  }

  pub fn state_dir(&self) -> &Path {
    &self.state_root
  }

  pub fn tasks_path(&self) -> PathBuf {
    self.state_root.join("tasks.json")
  }

  pub fn timeline_path(&self) -> PathBuf {
    self.state_root.join("timeline.jsonl")
  }

  /// Inbox directory for an agent, as `<agent>.in`
  pub fn inbox_dir(&self, agent: &str) -> PathBuf {
    self.mailboxes_root.join(format!("{agent}.in"))
  }

  /// Outbox directory for an agent, as `<agent>.out`
  pub fn outbox_dir(&self, agent: &str) -> PathBuf {
    self.mailboxes_root.join(format!("{agent}.out"))
  }
}

/// Ensure the bus layout exists: mailbox directories for every registered
/// agent, the state directory with seeded empty files, and the `.relay`
/// folder itself (the logs file is lazily created by the logging subsystem).
pub fn ensure_layout<'a>(
  paths: &RelayPaths,
  agents: impl IntoIterator<Item = &'a str>,
) -> std::io::Result<()> {
  fs::create_dir_all(paths.relay_dir())?;
  fs::create_dir_all(paths.mailboxes_root())?;
  fs::create_dir_all(paths.state_dir())?;
  for agent in agents {
    fs::create_dir_all(paths.inbox_dir(agent))?;
    fs::create_dir_all(paths.outbox_dir(agent))?;
  }
  let tasks_path = paths.tasks_path();
  if !tasks_path.exists() {
    let empty = serde_json::to_string_pretty(&TasksDocument::default())
      .unwrap_or_else(|_| String::from("{\"tasks\": []}"));
    fs::write(&tasks_path, empty)?;
  }
  let timeline_path = paths.timeline_path();
  if !timeline_path.exists() {
    fs::write(&timeline_path, "")?;
  }
  Ok(())
}
