mod common;

use common::TestEnv;
use predicates::prelude::*;
use serde_json::Value;

#[test]
fn list_reports_when_store_is_empty() {
  let env = TestEnv::new();
  env.relay().arg("init").assert().success();

  env
    .relay()
    .args(["tasks", "list"])
    .assert()
    .success()
    .stdout(predicate::str::contains("no tasks recorded"));
}

#[test]
fn list_prints_pipe_separated_rows() {
  let env = TestEnv::new();
  env.relay().arg("init").assert().success();
  let first = env.create_task("Add checkout flow", "Yega-API");
  let second = env.create_task("Polish order page", "Yega-Ordena");

  let output = env
    .relay()
    .args(["tasks", "list"])
    .assert()
    .success()
    .get_output()
    .stdout
    .clone();
  let stdout = String::from_utf8(output).expect("utf8");
  let lines: Vec<&str> = stdout.lines().collect();
  assert_eq!(lines.len(), 2);
  assert_eq!(
    lines[0],
    format!("{first} | Yega-API | pending | Add checkout flow")
  );
  assert_eq!(
    lines[1],
    format!("{second} | Yega-Ordena | pending | Polish order page")
  );
}

#[test]
fn list_json_prints_the_raw_task_array() {
  let env = TestEnv::new();
  env.relay().arg("init").assert().success();
  let task_id = env.create_task("Add checkout flow", "Yega-API");

  let output = env
    .relay()
    .args(["tasks", "list", "--json"])
    .assert()
    .success()
    .get_output()
    .stdout
    .clone();
  let tasks: Value = serde_json::from_slice(&output).expect("json array");
  assert_eq!(tasks.as_array().map(Vec::len), Some(1));
  assert_eq!(tasks[0]["id"], task_id.as_str());
}

#[test]
fn show_prints_the_full_task_record() {
  let env = TestEnv::new();
  env.relay().arg("init").assert().success();
  let task_id = env.create_task("Add checkout flow", "Yega-API");

  let output = env
    .relay()
    .args(["tasks", "show", &task_id])
    .assert()
    .success()
    .get_output()
    .stdout
    .clone();
  let task: Value = serde_json::from_slice(&output).expect("task json");
  assert_eq!(task["id"], task_id.as_str());
  assert_eq!(task["status"], "pending");
  assert!(task.get("createdAt").is_some());
  assert!(task.get("updates").is_some());
}

#[test]
fn show_unknown_task_exits_one() {
  let env = TestEnv::new();
  env.relay().arg("init").assert().success();

  env
    .relay()
    .args(["tasks", "show", "no-such-task"])
    .assert()
    .failure()
    .code(1);
}
