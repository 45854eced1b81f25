#![allow(dead_code)]
use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// Registry used by most tests: two developers split across repos plus an
/// executor that matches every repo filter.
pub const DEFAULT_REGISTRY: &str = concat!(
  "[agents.backend]\nrole = \"developer\"\nrepos = [\"Yega-API\"]\n\n",
  "[agents.frontend]\nrole = \"developer\"\nrepos = [\"Yega-Ordena\"]\n\n",
  "[agents.blackbox]\nrole = \"executor\"\nrepos = []\n",
);

/// Throwaway project directory plus an isolated user config home, so runs on
/// a developer machine never see the host's global relay config.
pub struct TestEnv {
  _temp: TempDir,
  project_dir: PathBuf,
  xdg_config_dir: PathBuf,
}

impl TestEnv {
  /// Project with the default registry already configured.
  pub fn new() -> Self {
    let env = Self::bare();
    env.write_project_config(DEFAULT_REGISTRY);
    env
  }

  /// Project with no config at all.
  pub fn bare() -> Self {
    let temp = tempfile::tempdir().expect("temp dir");
    let project_dir = temp.path().join("project");
    let xdg_config_dir = temp.path().join("xdg-config");
    fs::create_dir_all(&project_dir).expect("project dir");
    fs::create_dir_all(&xdg_config_dir).expect("xdg dir");
    Self {
      _temp: temp,
      project_dir,
      xdg_config_dir,
    }
  }

  pub fn root(&self) -> &Path {
    &self.project_dir
  }

  pub fn write_project_config(&self, body: &str) {
    let relay_dir = self.project_dir.join(".relay");
    fs::create_dir_all(&relay_dir).expect(".relay dir");
    fs::write(relay_dir.join("config.toml"), body).expect("write config");
  }

  /// A `relay` invocation rooted in the project directory.
  pub fn relay(&self) -> Command {
    let mut cmd = Command::cargo_bin("relay").expect("compile bin");
    cmd
      .current_dir(&self.project_dir)
      .env("XDG_CONFIG_HOME", &self.xdg_config_dir)
      .env_remove("RELAY_MAILBOX_ROOT")
      .env_remove("RELAY_STATE_ROOT");
    cmd
  }

  /// Create a task via the CLI and return the id it prints.
  pub fn create_task(&self, title: &str, repo: &str) -> String {
    let output = self
      .relay()
      .args(["task", title, "--repo", repo])
      .assert()
      .success()
      .get_output()
      .stdout
      .clone();
    String::from_utf8(output)
      .expect("utf8 stdout")
      .trim()
      .to_string()
  }

  pub fn mailboxes_dir(&self) -> PathBuf {
    self.project_dir.join(".relay").join("mailboxes")
  }

  pub fn state_dir(&self) -> PathBuf {
    self.project_dir.join(".relay").join("state")
  }

  pub fn inbox_files(&self, agent: &str) -> Vec<PathBuf> {
    list_json(&self.mailboxes_dir().join(format!("{agent}.in")))
  }

  pub fn outbox_files(&self, agent: &str) -> Vec<PathBuf> {
    list_json(&self.mailboxes_dir().join(format!("{agent}.out")))
  }

  /// Put an envelope file into an agent's outbox, as an adapter would.
  pub fn drop_outbox(&self, agent: &str, envelope: &Value, millis: i64) {
    let outbox = self.mailboxes_dir().join(format!("{agent}.out"));
    fs::create_dir_all(&outbox).expect("outbox dir");
    let id = envelope["id"].as_str().expect("envelope id");
    let body = serde_json::to_string_pretty(envelope).expect("encode envelope");
    fs::write(outbox.join(format!("{id}-{millis}.json")), body).expect("write envelope");
  }

  pub fn tasks(&self) -> Value {
    let raw = fs::read_to_string(self.state_dir().join("tasks.json")).expect("read tasks.json");
    serde_json::from_str(&raw).expect("parse tasks.json")
  }

  pub fn task(&self, id: &str) -> Value {
    let doc = self.tasks();
    doc["tasks"]
      .as_array()
      .expect("tasks array")
      .iter()
      .find(|t| t["id"] == id)
      .cloned()
      .unwrap_or_else(|| panic!("task {id} not in store"))
  }

  pub fn timeline_events(&self) -> Vec<String> {
    let raw = fs::read_to_string(self.state_dir().join("timeline.jsonl")).unwrap_or_default();
    raw
      .lines()
      .filter(|line| !line.trim().is_empty())
      .filter_map(|line| serde_json::from_str::<Value>(line).ok())
      .filter_map(|record| record["event"].as_str().map(str::to_string))
      .collect()
  }
}

fn list_json(dir: &Path) -> Vec<PathBuf> {
  let mut files: Vec<PathBuf> = fs::read_dir(dir)
    .map(|entries| {
      entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect()
    })
    .unwrap_or_default();
  files.sort();
  files
}
