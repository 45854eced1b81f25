use anyhow::Result;
use relay_core::reconcile::Reconciler;

use crate::context::CommandContext;

/// Run a single reconciliation pass over every agent outbox.
pub fn run(ctx: &CommandContext) -> Result<()> {
  let mailbox = ctx.mailbox();
  let task_store = ctx.store();
  let timeline = ctx.timeline();
  let reconciler = Reconciler::new(&ctx.config.agents, &mailbox, &task_store, &timeline);
  let report = reconciler.drain_once();
  if report.collected == 0 {
    println!("no outgoing events");
  } else {
    println!(
      "drained {} events ({} routed, {} dropped)",
      report.collected, report.routed, report.dropped
    );
  }
  Ok(())
}
