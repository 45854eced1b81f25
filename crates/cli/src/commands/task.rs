use anyhow::{Context, Result};
use relay_core::domain::envelope::{AgentRef, Envelope, Target, TaskSummary};
use relay_core::timeline::{Timeline, TimelineRecord};
use relay_core::{router, store};
use uuid::Uuid;

use crate::args::TaskArgs;
use crate::context::CommandContext;

/// Create a task and announce it on the bus. Delivery defaults to every
/// agent registered for the repo; `--roles`/`--agents` narrow it further.
pub fn run(ctx: &CommandContext, args: TaskArgs) -> Result<()> {
  let task_id = Uuid::new_v4().to_string();
  let envelope = Envelope::new("task.create", AgentRef::orchestrator())
    .with_task(TaskSummary {
      id: Some(task_id.clone()),
      title: Some(args.title),
      description: Some(String::new()),
      repo: Some(args.repo.clone()),
      status: Some("pending".to_string()),
    })
    .with_target(Target {
      agents: split_list(args.agents.as_deref()),
      roles: split_list(args.roles.as_deref()),
      repos: Some(vec![args.repo]),
    });

  let mailbox = ctx.mailbox();
  let delivered = router::route(&ctx.config.agents, &mailbox, &envelope);
  let task_store = ctx.store();
  store::upsert(&task_store, &envelope, Some("orchestrator"))
    .context("failed to record task")?;
  ctx
    .timeline()
    .append(&TimelineRecord::now("task.create", envelope))
    .context("failed to append timeline")?;

  tracing::info!(task = %task_id, delivered = delivered.len(), "created task");
  println!("{task_id}");
  Ok(())
}

/// Split a comma-separated flag value, dropping empty segments. `None` when
/// nothing usable remains, so the target constraint stays absent.
pub(crate) fn split_list(raw: Option<&str>) -> Option<Vec<String>> {
  let items: Vec<String> = raw?
    .split(',')
    .map(str::trim)
    .filter(|part| !part.is_empty())
    .map(String::from)
    .collect();
  if items.is_empty() { None } else { Some(items) }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  #[test]
  fn split_list_trims_and_drops_empty_segments() {
    assert_eq!(
      split_list(Some("frontend, backend ,,")),
      Some(vec!["frontend".to_string(), "backend".to_string()])
    );
    assert_eq!(split_list(Some("  ")), None);
    assert_eq!(split_list(None), None);
  }
}
