use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use relay_core::timeline::Timeline;

use crate::args::TimelineArgs;
use crate::context::CommandContext;

/// Print the tail of the event journal, one line per record:
/// `<ts> <event> <from> <type> <taskId>` with `-` for absent fields.
pub fn run(ctx: &CommandContext, args: TimelineArgs) -> Result<()> {
  let since: Option<DateTime<Utc>> = match &args.since {
    Some(raw) => Some(
      DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .with_context(|| format!("invalid --since timestamp: {raw}"))?,
    ),
    None => None,
  };

  let records = ctx
    .timeline()
    .tail(since, args.limit)
    .context("failed to read timeline")?;
  if args.json {
    println!("{}", serde_json::to_string_pretty(&records)?);
    return Ok(());
  }
  for record in &records {
    let from = record.from.as_deref().unwrap_or("-");
    let event_type = record
      .envelope
      .as_ref()
      .map(|e| e.event_type.as_str())
      .unwrap_or("-");
    let task_id = record
      .envelope
      .as_ref()
      .and_then(|e| e.task_id())
      .unwrap_or("-");
    println!(
      "{} {} {} {} {}",
      record.ts.to_rfc3339(),
      record.event,
      from,
      event_type,
      task_id
    );
  }
  Ok(())
}
