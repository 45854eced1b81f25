use super::types::{Config, ConfigError, Result};

pub(super) fn validate_agents(cfg: &Config) -> Result<()> {
  for (name, spec) in &cfg.agents {
    if spec.role.trim().is_empty() {
      return Err(ConfigError::InvalidAgentDefinition {
        agent: name.to_string(),
      });
    }
  }
  Ok(())
}
