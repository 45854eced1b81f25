use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Repo assigned to tasks that arrive without one.
pub const DEFAULT_REPO: &str = "global";

/// Task lifecycle states. `Done` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
  Pending,
  InProgress,
  Done,
  Blocked,
  Cancelled,
}

impl TaskStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Pending => "pending",
      Self::InProgress => "in_progress",
      Self::Done => "done",
      Self::Blocked => "blocked",
      Self::Cancelled => "cancelled",
    }
  }

  pub fn is_terminal(&self) -> bool {
    matches!(self, Self::Done | Self::Cancelled)
  }

  /// Transition relation. Self-transitions are always permitted and are
  /// no-ops for the caller; terminal states have no other outgoing edges.
  pub fn can_transition(from: TaskStatus, to: TaskStatus) -> bool {
    use TaskStatus::*;
    if from == to {
      return true;
    }
    matches!(
      (from, to),
      // start
      (Pending, InProgress)
        // block
        | (Pending, Blocked)
        | (InProgress, Blocked)
        // resume
        | (Blocked, InProgress)
        // finish
        | (Pending, Done)
        | (InProgress, Done)
        | (Blocked, Done)
        // cancel
        | (Pending, Cancelled)
        | (InProgress, Cancelled)
        | (Blocked, Cancelled)
    )
  }

  pub fn start(self) -> Result<Self, TaskError> {
    self.apply(Self::InProgress)
  }

  pub fn block(self) -> Result<Self, TaskError> {
    self.apply(Self::Blocked)
  }

  pub fn resume(self) -> Result<Self, TaskError> {
    self.apply(Self::InProgress)
  }

  pub fn finish(self) -> Result<Self, TaskError> {
    self.apply(Self::Done)
  }

  pub fn cancel(self) -> Result<Self, TaskError> {
    self.apply(Self::Cancelled)
  }

  fn apply(self, to: Self) -> Result<Self, TaskError> {
    if Self::can_transition(self, to) {
      Ok(to)
    } else {
      Err(TaskError::InvalidTransition { from: self, to })
    }
  }
}

impl fmt::Display for TaskStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for TaskStatus {
  type Err = TaskError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "pending" => Ok(Self::Pending),
      "in_progress" => Ok(Self::InProgress),
      "done" => Ok(Self::Done),
      "blocked" => Ok(Self::Blocked),
      "cancelled" => Ok(Self::Cancelled),
      other => Err(TaskError::UnknownStatus(other.to_string())),
    }
  }
}

#[derive(Debug, Error)]
pub enum TaskError {
  #[error("invalid transition: {from} -> {to}")]
  InvalidTransition { from: TaskStatus, to: TaskStatus },
  #[error("unknown status: {0}")]
  UnknownStatus(String),
}

/// One entry of a task's append-only history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskUpdateRecord {
  pub at: DateTime<Utc>,
  pub from: String,
  #[serde(rename = "type")]
  pub event_type: String,
  #[serde(default)]
  pub payload: Value,
}

/// Normalized structured output attached to a task. `lastReview` records
/// carry the full field set; `lastSummary` records omit `from`/`kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub from: Option<String>,
  pub at: DateTime<Utc>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub kind: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub provider: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub model: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub status: Option<Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub structured: Option<Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub summary: Option<String>,
}

/// Latest structured outputs keyed by kind; each key is overwritten in place
/// by newer envelopes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifacts {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub last_review: Option<Artifact>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub last_changeset: Option<Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub last_summary: Option<Artifact>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub pull_plan: Option<Value>,
}

/// Durable task record. Created and mutated exclusively by the store fold;
/// never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
  pub id: String,
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub description: String,
  #[serde(default = "default_repo")]
  pub repo: String,
  pub status: TaskStatus,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  #[serde(default)]
  pub updates: Vec<TaskUpdateRecord>,
  #[serde(default)]
  pub artifacts: Artifacts,
}

fn default_repo() -> String {
  DEFAULT_REPO.to_string()
}

impl Task {
  pub fn transition_to(&mut self, new_status: TaskStatus) -> Result<(), TaskError> {
    if TaskStatus::can_transition(self.status, new_status) {
      self.status = new_status;
      Ok(())
    } else {
      Err(TaskError::InvalidTransition {
        from: self.status,
        to: new_status,
      })
    }
  }
}

/// Wire shape of `tasks.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TasksDocument {
  #[serde(default)]
  pub tasks: Vec<Task>,
}

impl TasksDocument {
  pub fn find(&self, id: &str) -> Option<&Task> {
    self.tasks.iter().find(|t| t.id == id)
  }

  pub fn find_mut(&mut self, id: &str) -> Option<&mut Task> {
    self.tasks.iter_mut().find(|t| t.id == id)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use proptest::prelude::*;

  fn sample_task(status: TaskStatus) -> Task {
    Task {
      id: "t1".into(),
      title: "Fix login".into(),
      description: String::new(),
      repo: "Yega-API".into(),
      status,
      created_at: Utc::now(),
      updated_at: Utc::now(),
      updates: Vec::new(),
      artifacts: Artifacts::default(),
    }
  }

  #[test]
  fn transitions_enforced() {
    let mut task = sample_task(TaskStatus::Pending);
    task.transition_to(TaskStatus::InProgress).expect("start");
    task.transition_to(TaskStatus::Blocked).expect("block");
    task.transition_to(TaskStatus::InProgress).expect("resume");
    task.transition_to(TaskStatus::Done).expect("finish");
    let err = task.transition_to(TaskStatus::InProgress).unwrap_err();
    match err {
      TaskError::InvalidTransition { .. } => {}
      other => panic!("wrong error: {other}"),
    }
    assert_eq!(task.status, TaskStatus::Done);
  }

  #[test]
  fn self_transitions_are_noops() {
    for status in [
      TaskStatus::Pending,
      TaskStatus::InProgress,
      TaskStatus::Done,
      TaskStatus::Blocked,
      TaskStatus::Cancelled,
    ] {
      let mut task = sample_task(status);
      task.transition_to(status).expect("self transition");
      assert_eq!(task.status, status);
    }
  }

  #[test]
  fn named_guards() {
    assert_eq!(TaskStatus::Pending.start().unwrap(), TaskStatus::InProgress);
    assert_eq!(TaskStatus::InProgress.block().unwrap(), TaskStatus::Blocked);
    assert_eq!(TaskStatus::Blocked.resume().unwrap(), TaskStatus::InProgress);
    assert_eq!(TaskStatus::Blocked.finish().unwrap(), TaskStatus::Done);
    assert_eq!(TaskStatus::Pending.cancel().unwrap(), TaskStatus::Cancelled);
    assert!(TaskStatus::Done.start().is_err());
    assert!(TaskStatus::Cancelled.resume().is_err());
  }

  #[test]
  fn status_strings_round_trip() {
    for (s, status) in [
      ("pending", TaskStatus::Pending),
      ("in_progress", TaskStatus::InProgress),
      ("done", TaskStatus::Done),
      ("blocked", TaskStatus::Blocked),
      ("cancelled", TaskStatus::Cancelled),
    ] {
      assert_eq!(s.parse::<TaskStatus>().unwrap(), status);
      assert_eq!(status.to_string(), s);
    }
    assert!("review".parse::<TaskStatus>().is_err());
    assert!("".parse::<TaskStatus>().is_err());
  }

  #[test]
  fn task_serializes_camel_case() {
    let task = sample_task(TaskStatus::InProgress);
    let v = serde_json::to_value(&task).expect("serialize");
    assert_eq!(v["status"], "in_progress");
    assert!(v.get("createdAt").is_some());
    assert!(v.get("updatedAt").is_some());
    assert_eq!(v["artifacts"], serde_json::json!({}));
  }

  proptest! {
    #[test]
    fn terminal_states_admit_only_self_transitions(
      to in prop_oneof![
        Just(TaskStatus::Pending),
        Just(TaskStatus::InProgress),
        Just(TaskStatus::Done),
        Just(TaskStatus::Blocked),
        Just(TaskStatus::Cancelled),
      ]
    ) {
      for from in [TaskStatus::Done, TaskStatus::Cancelled] {
        prop_assert_eq!(TaskStatus::can_transition(from, to), from == to);
      }
    }
  }
}
