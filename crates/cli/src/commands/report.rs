use anyhow::{Context, Result, bail};
use chrono::Utc;
use relay_core::domain::envelope::{AgentRef, Envelope, TaskSummary};
use relay_core::domain::task::{Artifact, Task};
use relay_core::provider::{self, HttpProvider, Provider};
use relay_core::store::TaskStore;
use relay_core::timeline::{Timeline, TimelineRecord};
use serde_json::json;

use crate::context::CommandContext;

pub fn run(ctx: &CommandContext, id: &str) -> Result<()> {
  let provider = HttpProvider::new(ctx.config.provider.clone());
  run_with(ctx, id, &provider)
}

/// Ask the provider's summary model to assess the task, then persist the
/// reply as the `lastSummary` artifact and journal it. Replies that carry no
/// recognizable JSON block degrade to a raw-text summary object.
pub fn run_with(ctx: &CommandContext, id: &str, provider: &dyn Provider) -> Result<()> {
  let task_store = ctx.store();
  let mut doc = task_store.load();
  let Some(task) = doc.find(id) else {
    bail!("unknown task: {id}");
  };
  let prompt = summary_prompt(task)?;
  let task_status = task.status.as_str();

  let reply = provider
    .generate(&prompt, &ctx.config.provider.summary_model)
    .context("summary generation failed")?;
  let structured = provider::extract_json_block(&reply.content)
    .filter(provider::is_known_schema)
    .unwrap_or_else(|| provider::raw_summary_fallback(task_status, &reply.content));

  let artifact = Artifact {
    from: None,
    at: Utc::now(),
    kind: None,
    provider: Some(ctx.config.provider.name.clone()),
    model: Some(reply.model.clone()),
    status: Some(json!(reply.status)),
    structured: Some(structured.clone()),
    summary: None,
  };
  let Some(task) = doc.find_mut(id) else {
    bail!("unknown task: {id}");
  };
  task.artifacts.last_summary = Some(artifact.clone());
  task_store.save(&doc).context("failed to persist summary")?;

  let envelope = Envelope::new("result.summary", AgentRef::orchestrator())
    .with_task(TaskSummary {
      id: Some(id.to_string()),
      ..TaskSummary::default()
    })
    .with_payload(json!({
      "provider": ctx.config.provider.name,
      "model": reply.model,
      "structured": structured,
    }));
  ctx
    .timeline()
    .append(&TimelineRecord::now("task.summary", envelope))
    .context("failed to append timeline")?;

  println!("{}", serde_json::to_string_pretty(&artifact)?);
  Ok(())
}

/// Analyst prompt: the expected reply schema followed by the task, its last
/// 20 history entries, and the current artifacts.
fn summary_prompt(task: &Task) -> Result<String> {
  let recent = &task.updates[task.updates.len().saturating_sub(20)..];
  let context = json!({
    "task": {
      "id": task.id,
      "title": task.title,
      "description": task.description,
      "repo": task.repo,
      "status": task.status.as_str(),
    },
    "updates": recent,
    "artifacts": task.artifacts,
  });
  let context_json = serde_json::to_string_pretty(&context)?;
  Ok(
    [
      "You are a technical analyst. Summarize and assess the state of this task.",
      "Reply with valid JSON in a json block using this exact structure:",
      "```json",
      r#"{"version":"mcp/result-summary@1","status":"in_progress|done|blocked|cancelled","summary":"...","highlights":["..."],"risks":["..."],"next_steps":["..."],"evidence":{"updates":N,"artifacts":["lastReview","lastChangeset"]}}"#,
      "```",
      "Context:",
      context_json.as_str(),
    ]
    .join("\n"),
  )
}
