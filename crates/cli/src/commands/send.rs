use anyhow::{Context, Result, bail};
use relay_core::domain::envelope::{AgentRef, Envelope, Target, TaskSummary};
use relay_core::store::TaskStore;
use relay_core::timeline::{Timeline, TimelineRecord};
use relay_core::{router, store};
use serde_json::json;
use uuid::Uuid;

use crate::args::ChangeArgs;
use crate::commands::task::split_list;
use crate::context::CommandContext;

/// Dispatch a `change.request` envelope. With `--task` the change attaches
/// to an existing task; otherwise a fresh pending task is synthesized so the
/// request always folds into the store under some id.
pub fn change(ctx: &CommandContext, args: ChangeArgs) -> Result<()> {
  let title = args.title.as_deref().map(str::trim).unwrap_or_default();
  if title.is_empty() && args.payload.is_none() {
    bail!("a title or --payload is required");
  }

  let task = match &args.task {
    Some(task_id) => {
      let doc = ctx.store().load();
      let Some(existing) = doc.find(task_id) else {
        bail!("unknown task: {task_id}");
      };
      TaskSummary {
        id: Some(existing.id.clone()),
        title: Some(existing.title.clone()),
        description: Some(existing.description.clone()),
        repo: Some(existing.repo.clone()),
        status: Some(existing.status.as_str().to_string()),
      }
    }
    None => TaskSummary {
      id: Some(Uuid::new_v4().to_string()),
      title: Some(if title.is_empty() {
        "Change Request".to_string()
      } else {
        title.to_string()
      }),
      description: Some(String::new()),
      repo: Some(args.repo.clone()),
      status: Some("pending".to_string()),
    },
  };

  // --payload is taken verbatim when it parses as JSON; anything else is
  // preserved as a note instead of being rejected.
  let payload = match &args.payload {
    Some(raw) => serde_json::from_str(raw).unwrap_or_else(|_| json!({ "note": raw })),
    None => json!({}),
  };

  let envelope = Envelope::new("change.request", AgentRef::orchestrator())
    .with_task(task)
    .with_target(Target {
      agents: split_list(args.agents.as_deref()),
      roles: split_list(args.roles.as_deref()),
      repos: Some(vec![args.repo]),
    })
    .with_payload(payload);
  let task_id = envelope.task_id().unwrap_or_default().to_string();

  let mailbox = ctx.mailbox();
  let delivered = router::route(&ctx.config.agents, &mailbox, &envelope);
  let task_store = ctx.store();
  store::upsert(&task_store, &envelope, Some("orchestrator"))
    .context("failed to record change request")?;
  ctx
    .timeline()
    .append(&TimelineRecord::now("change.request", envelope))
    .context("failed to append timeline")?;

  tracing::info!(task = %task_id, delivered = delivered.len(), "dispatched change request");
  println!("{task_id}");
  Ok(())
}
