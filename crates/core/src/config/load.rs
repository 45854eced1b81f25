use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::paths::{global_config_path, project_config_path};
use super::types::{AgentSpec, Config, LogLevel, ProviderConfig, Result};
use super::validate::validate_agents;

/// Load configuration by resolving the default global and project paths.
/// Project config overrides global; both override defaults.
pub fn load(project_root: Option<&Path>) -> Result<Config> {
  let defaults = Config::default();
  let mut cfg = defaults;

  // Global
  if let Some(global_path) = global_config_path()
    && let Ok(s) = fs::read_to_string(&global_path)
  {
    let partial: PartialConfig = toml::from_str(&s)?;
    cfg = partial.merge_over(cfg);
  }

  // Project
  if let Some(root) = project_root {
    let project_path = project_config_path(root);
    if let Ok(s) = fs::read_to_string(&project_path) {
      let partial: PartialConfig = toml::from_str(&s)?;
      cfg = partial.merge_over(cfg);
    }
  }

  validate_agents(&cfg)?;

  Ok(cfg)
}

/// Test helper: load configuration from explicit file paths (if present).
#[cfg(test)]
pub(crate) fn load_from_paths(global: Option<&Path>, project: Option<&Path>) -> Result<Config> {
  let defaults = Config::default();
  let mut cfg = defaults;

  if let Some(g) = global
    && let Ok(s) = fs::read_to_string(g)
  {
    let partial: PartialConfig = toml::from_str(&s)?;
    cfg = partial.merge_over(cfg);
  }

  if let Some(p) = project
    && let Ok(s) = fs::read_to_string(p)
  {
    let partial: PartialConfig = toml::from_str(&s)?;
    cfg = partial.merge_over(cfg);
  }

  validate_agents(&cfg)?;

  Ok(cfg)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
struct PartialProviderConfig {
  pub name: Option<String>,
  pub api_url: Option<String>,
  pub model: Option<String>,
  pub summary_model: Option<String>,
  pub api_key_env: Option<String>,
}

impl PartialProviderConfig {
  fn merge_over(self, base: ProviderConfig) -> ProviderConfig {
    ProviderConfig {
      name: self.name.unwrap_or(base.name),
      api_url: self.api_url.unwrap_or(base.api_url),
      model: self.model.unwrap_or(base.model),
      summary_model: self.summary_model.unwrap_or(base.summary_model),
      api_key_env: self.api_key_env.unwrap_or(base.api_key_env),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
struct PartialConfig {
  pub log_level: Option<LogLevel>,
  pub poll_interval_ms: Option<u64>,
  pub mailboxes_root: Option<PathBuf>,
  pub state_root: Option<PathBuf>,
  pub provider: Option<PartialProviderConfig>,
  pub agents: Option<BTreeMap<String, AgentSpec>>,
}

impl PartialConfig {
  fn merge_over(self, base: Config) -> Config {
    let PartialConfig {
      log_level,
      poll_interval_ms,
      mailboxes_root,
      state_root,
      provider,
      agents,
    } = self;

    let Config {
      log_level: base_log_level,
      poll_interval_ms: base_poll_interval_ms,
      mailboxes_root: base_mailboxes_root,
      state_root: base_state_root,
      provider: base_provider,
      agents: base_agents,
    } = base;

    let mut merged_agents = base_agents;
    if let Some(overrides) = agents {
      for (name, spec) in overrides {
        merged_agents.insert(name, spec);
      }
    }

    Config {
      log_level: log_level.unwrap_or(base_log_level),
      poll_interval_ms: poll_interval_ms.unwrap_or(base_poll_interval_ms),
      mailboxes_root: mailboxes_root.or(base_mailboxes_root),
      state_root: state_root.or(base_state_root),
      provider: provider.unwrap_or_default().merge_over(base_provider),
      agents: merged_agents,
    }
  }
}
