use anyhow::{Context, Result};
use relay_core::adapters::fs;
use relay_core::config;

use crate::context::CommandContext;

/// Create the `.relay` bus layout and seed a project config if none exists.
/// Safe to run repeatedly; existing files are left alone.
pub fn run(ctx: &CommandContext) -> Result<()> {
  let agents = ctx.config.agents.keys().map(String::as_str);
  fs::ensure_layout(&ctx.paths, agents).context("failed to create bus layout")?;
  config::write_default_project_config(&ctx.root)
    .context("failed to write project config")?;
  tracing::info!(root = %ctx.paths.relay_dir().display(), "initialized bus layout");
  println!("initialized .relay at {}", ctx.paths.relay_dir().display());
  Ok(())
}
