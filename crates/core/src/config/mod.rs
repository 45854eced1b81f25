mod defaults;
mod load;
mod paths;
mod types;
mod validate;
mod write;

pub use load::load;
pub use paths::{global_config_path, project_config_path};
pub use types::{AgentSpec, Config, ConfigError, LogLevel, ProviderConfig, Result};
pub use write::write_default_project_config;
