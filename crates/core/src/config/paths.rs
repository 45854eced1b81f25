use std::path::{Path, PathBuf};

/// Location of the global config file (~/.config/relay/config.toml)
pub fn global_config_path() -> Option<PathBuf> {
  dirs::config_dir().map(|p| p.join("relay").join("config.toml"))
}

/// Location of the project config file (./.relay/config.toml)
pub fn project_config_path(project_root: &Path) -> PathBuf {
  project_root.join(".relay").join("config.toml")
}
