use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

use super::defaults::default_provider;

/// Log level for the CLI and reconciler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
  Off,
  Warn,
  #[default]
  Info,
  Debug,
  Trace,
}

/// One registered agent: the role it fills and the repos it works on.
/// An empty `repos` list means the agent is unaffected by repo filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSpec {
  pub role: String,
  #[serde(default)]
  pub repos: Vec<String>,
}

/// Endpoint configuration for the text-generation provider used by
/// `tasks report`. The API key is read from the environment variable named
/// in `api_key_env`, never from the config file itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
  /// Provider label recorded on artifacts produced through this endpoint.
  pub name: String,
  pub api_url: String,
  /// Model used for plain generation.
  pub model: String,
  /// Model used for task summaries.
  pub summary_model: String,
  pub api_key_env: String,
}

impl Default for ProviderConfig {
  fn default() -> Self {
    default_provider()
  }
}

/// Effective configuration after merging defaults, global, and project config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
  pub log_level: LogLevel,
  /// Reconciler pass interval in milliseconds (defaults to 1000)
  pub poll_interval_ms: u64,
  /// Optional relocation of the mailboxes tree
  #[serde(skip_serializing_if = "Option::is_none")]
  pub mailboxes_root: Option<PathBuf>,
  /// Optional relocation of the state tree
  #[serde(skip_serializing_if = "Option::is_none")]
  pub state_root: Option<PathBuf>,
  pub provider: ProviderConfig,
  /// Agent registry resolved by the router: `[agents.<name>]` tables.
  pub agents: BTreeMap<String, AgentSpec>,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      log_level: LogLevel::Info,
      poll_interval_ms: 1000,
      mailboxes_root: None,
      state_root: None,
      provider: ProviderConfig::default(),
      agents: BTreeMap::new(),
    }
  }
}

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("io: {0}")]
  Io(#[from] std::io::Error),
  #[error("toml: {0}")]
  Toml(#[from] toml::de::Error),
  #[error("agent `{agent}` must declare a non-empty role")]
  InvalidAgentDefinition { agent: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
