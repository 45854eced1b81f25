use std::path::Path;

use super::paths::project_config_path;
use super::types::Config;

/// Write a default project config if it does not exist yet.
pub fn write_default_project_config(project_root: &Path) -> std::io::Result<()> {
  let path = project_config_path(project_root);
  if let Some(parent) = path.parent() {
    let _ = std::fs::create_dir_all(parent);
  }
  if !path.exists() {
    let cfg = Config::default();
    let mut s = toml::to_string_pretty(&cfg).unwrap_or_else(|_| String::from(""));
    // Document the registry with commented examples instead of seeding agents,
    // so a fresh project routes nothing until someone registers real agents.
    s.push_str(
      "\n# Register agents under [agents.<name>]; role is required, repos optional.\n# [agents.frontend]\n# role = \"developer\"\n# repos = [\"Yega-Ordena\", \"Yega-Entrega\"]\n\n# [agents.blackbox]\n# role = \"executor\"\n# repos = []\n\n# The mailboxes and state trees can be relocated:\n# mailboxes_root = \"/tmp/relay/mailboxes\"\n# state_root = \"/tmp/relay/state\"\n",
    );
    std::fs::write(&path, s)?;
  }
  Ok(())
}
