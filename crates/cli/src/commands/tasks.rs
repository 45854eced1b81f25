use anyhow::{Context, Result, bail};
use relay_core::domain::envelope::{AgentRef, Envelope, Target, TaskSummary};
use relay_core::domain::task::TaskStatus;
use relay_core::store::TaskStore;
use relay_core::timeline::{Timeline, TimelineRecord};
use relay_core::{router, store};
use serde_json::json;

use crate::args::CloseStatus;
use crate::context::CommandContext;

pub fn list(ctx: &CommandContext, json: bool) -> Result<()> {
  let doc = ctx.store().load();
  if json {
    println!("{}", serde_json::to_string_pretty(&doc.tasks)?);
    return Ok(());
  }
  if doc.tasks.is_empty() {
    println!("no tasks recorded");
    return Ok(());
  }
  for task in &doc.tasks {
    println!(
      "{} | {} | {} | {}",
      task.id,
      task.repo,
      task.status.as_str(),
      task.title
    );
  }
  Ok(())
}

pub fn show(ctx: &CommandContext, id: &str) -> Result<()> {
  let doc = ctx.store().load();
  let Some(task) = doc.find(id) else {
    bail!("unknown task: {id}");
  };
  println!("{}", serde_json::to_string_pretty(task)?);
  Ok(())
}

/// Close a task by dispatching a terminal `task.update` back onto the bus,
/// targeted at the task's repo. Store and timeline fold it like any other
/// update, so agents see the close the same way the relay does.
pub fn close(ctx: &CommandContext, id: &str, status: CloseStatus) -> Result<()> {
  let task_store = ctx.store();
  let doc = task_store.load();
  let Some(task) = doc.find(id) else {
    bail!("unknown task: {id}");
  };
  let next = close_status(status);

  let envelope = Envelope::new("task.update", AgentRef::orchestrator())
    .with_task(TaskSummary {
      id: Some(task.id.clone()),
      title: Some(task.title.clone()),
      description: Some(task.description.clone()),
      repo: Some(task.repo.clone()),
      status: Some(next.as_str().to_string()),
    })
    .with_target(Target {
      agents: None,
      roles: None,
      repos: Some(vec![task.repo.clone()]),
    })
    .with_payload(json!({ "status": next.as_str() }));

  let mailbox = ctx.mailbox();
  router::route(&ctx.config.agents, &mailbox, &envelope);
  store::upsert(&task_store, &envelope, Some("orchestrator"))
    .context("failed to record close")?;
  ctx
    .timeline()
    .append(&TimelineRecord::now("task.update", envelope))
    .context("failed to append timeline")?;

  println!("closed {id} as {}", next.as_str());
  Ok(())
}

fn close_status(status: CloseStatus) -> TaskStatus {
  match status {
    CloseStatus::Done => TaskStatus::Done,
    CloseStatus::Cancelled => TaskStatus::Cancelled,
  }
}
