use tracing::{debug, warn};

use super::{Result, TaskStore};
use crate::domain::envelope::{Envelope, EnvelopeKind, ResultPayload, TaskUpdatePayload};
use crate::domain::schema;
use crate::domain::task::{
  Artifact, Artifacts, DEFAULT_REPO, Task, TaskStatus, TaskUpdateRecord, TasksDocument,
};

/// Providers whose `result.*` payloads are normalized into artifacts. Output
/// from anything else is kept in the history but not promoted.
pub const RECOGNIZED_PROVIDERS: [&str; 2] = ["blackbox", "mistral"];

/// Load, fold, persist. The document is saved only when the envelope
/// actually touched it.
pub fn upsert(store: &dyn TaskStore, envelope: &Envelope, source: Option<&str>) -> Result<bool> {
  let mut doc = store.load();
  let changed = fold_envelope(&mut doc, envelope, source);
  if changed {
    store.save(&doc)?;
  }
  Ok(changed)
}

/// Fold one envelope into the task document. Returns false when the envelope
/// carries no task id (nothing to update).
///
/// Unknown task ids are adopted: an update arriving before its create (or
/// after a lost one) synthesizes a pending record instead of being dropped.
pub fn fold_envelope(
  doc: &mut TasksDocument,
  envelope: &Envelope,
  source: Option<&str>,
) -> bool {
  let Some(task_id) = envelope.task_id().map(str::to_string) else {
    return false;
  };
  let kind = envelope.kind();
  let ts = envelope.effective_timestamp();
  let from = source
    .map(str::to_string)
    .or_else(|| Some(envelope.agent.name.clone()).filter(|name| !name.is_empty()))
    .unwrap_or_else(|| "unknown".to_string());

  let idx = match doc.tasks.iter().position(|t| t.id == task_id) {
    Some(idx) => idx,
    None => {
      let summary = envelope.task.as_ref();
      let status = summary
        .and_then(|t| t.status.as_deref())
        .and_then(|s| s.parse::<TaskStatus>().ok())
        .unwrap_or(TaskStatus::Pending);
      let task = Task {
        id: task_id.clone(),
        title: summary.and_then(|t| t.title.clone()).unwrap_or_default(),
        description: summary
          .and_then(|t| t.description.clone())
          .unwrap_or_default(),
        repo: summary
          .and_then(|t| t.repo.clone())
          .filter(|r| !r.is_empty())
          .unwrap_or_else(|| DEFAULT_REPO.to_string()),
        status,
        created_at: ts,
        updated_at: ts,
        updates: Vec::new(),
        artifacts: Artifacts::default(),
      };
      if kind == EnvelopeKind::TaskCreate {
        debug!(event = "task_created", task = %task_id, repo = %task.repo);
      } else {
        warn!(
          event = "task_adopted",
          task = %task_id,
          event_type = %envelope.event_type,
          from = %from,
          "envelope references unknown task, synthesizing record"
        );
      }
      doc.tasks.push(task);
      doc.tasks.len() - 1
    }
  };
  let task = &mut doc.tasks[idx];

  if kind == EnvelopeKind::TaskUpdate {
    let payload = TaskUpdatePayload::from_value(&envelope.payload);
    let requested = payload
      .status
      .as_deref()
      .filter(|s| !s.is_empty())
      .and_then(|s| s.parse::<TaskStatus>().ok());
    match requested {
      Some(next) => {
        if let Err(err) = task.transition_to(next) {
          warn!(
            event = "transition_refused",
            task = %task_id,
            from = %from,
            error = %err,
            "keeping current status"
          );
        }
      }
      None => {
        // An update without a usable status still signals progress.
        if task.status == TaskStatus::Pending {
          task.status = TaskStatus::InProgress;
        }
      }
    }
  }

  if kind == EnvelopeKind::Result {
    let payload = ResultPayload::from_value(&envelope.payload);
    if let Some(provider) = payload
      .provider()
      .filter(|p| RECOGNIZED_PROVIDERS.contains(p))
      .map(str::to_string)
    {
      let structured = payload.structured().cloned();
      let artifact = Artifact {
        from: Some(from.clone()),
        at: ts,
        kind: Some(payload.kind().unwrap_or("review").to_string()),
        provider: Some(provider),
        model: payload.model().map(str::to_string),
        status: payload.status().cloned(),
        structured: structured.clone(),
        summary: payload
          .content()
          .map(|c| c.chars().take(400).collect::<String>()),
      };
      task.artifacts.last_review = Some(artifact);
      let is_changeset = structured
        .as_ref()
        .and_then(|s| s.get("version"))
        .and_then(|v| v.as_str())
        .is_some_and(|v| v.starts_with(schema::CHANGESET_PREFIX));
      if is_changeset {
        task.artifacts.last_changeset = structured;
      }
    }
  }

  task.updated_at = ts;
  task.updates.push(TaskUpdateRecord {
    at: ts,
    from,
    event_type: envelope.event_type.clone(),
    payload: envelope.payload.clone(),
  });
  true
}
