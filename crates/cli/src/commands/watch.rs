use std::time::Duration;

use anyhow::{Context, Result};
use relay_core::reconcile::Reconciler;

use crate::context::CommandContext;

/// Drain outboxes on the configured poll interval until interrupted.
pub fn run(ctx: &CommandContext) -> Result<()> {
  let interval = Duration::from_millis(ctx.config.poll_interval_ms);
  println!(
    "watching outboxes every {}ms (ctrl-c to stop)",
    ctx.config.poll_interval_ms
  );

  let mailbox = ctx.mailbox();
  let task_store = ctx.store();
  let timeline = ctx.timeline();
  let reconciler = Reconciler::new(&ctx.config.agents, &mailbox, &task_store, &timeline);

  let runtime = tokio::runtime::Builder::new_current_thread()
    .enable_time()
    .build()
    .context("failed to start watch runtime")?;
  runtime.block_on(reconciler.watch(interval));
  Ok(())
}
