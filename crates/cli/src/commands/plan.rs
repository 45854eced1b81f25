use anyhow::{Context, Result, bail};
use relay_core::domain::envelope::{AgentRef, Envelope, TaskSummary};
use relay_core::domain::schema;
use relay_core::store::TaskStore;
use relay_core::timeline::{Timeline, TimelineRecord};
use serde_json::{Value, json};

use crate::context::CommandContext;

/// Turn the task's last structured changeset into an ordered apply plan,
/// persisted as the `pullPlan` artifact and journaled as `task.plan`.
pub fn run(ctx: &CommandContext, id: &str) -> Result<()> {
  let task_store = ctx.store();
  let mut doc = task_store.load();
  let Some(task) = doc.find(id) else {
    bail!("unknown task: {id}");
  };
  let Some(changeset) = task.artifacts.last_changeset.as_ref() else {
    bail!("no structured changeset recorded for task: {id}");
  };
  let Some(patches) = changeset.get("patches").and_then(Value::as_array) else {
    bail!("no structured changeset recorded for task: {id}");
  };

  let steps: Vec<Value> = patches
    .iter()
    .enumerate()
    .map(|(idx, patch)| {
      json!({
        "id": (idx + 1).to_string(),
        "action": "apply-patch",
        "path": patch.get("path").cloned().unwrap_or(Value::Null),
        "note": patch.get("note").and_then(Value::as_str).unwrap_or(""),
      })
    })
    .collect();
  let repo = changeset
    .get("repo")
    .and_then(Value::as_str)
    .filter(|r| !r.is_empty())
    .unwrap_or(&task.repo);
  let notes = changeset
    .get("notes")
    .filter(|v| !is_blank(v))
    .or_else(|| changeset.get("plan").filter(|v| !is_blank(v)))
    .cloned()
    .unwrap_or_else(|| json!(""));
  let plan = json!({
    "version": schema::PULL_PLAN,
    "repo": repo,
    "steps": steps,
    "tests": changeset.get("tests").cloned().unwrap_or_else(|| json!([])),
    "notes": notes,
  });

  let Some(task) = doc.find_mut(id) else {
    bail!("unknown task: {id}");
  };
  task.artifacts.pull_plan = Some(plan.clone());
  task_store.save(&doc).context("failed to persist plan")?;

  let envelope = Envelope::new("result.plan", AgentRef::orchestrator())
    .with_task(TaskSummary {
      id: Some(id.to_string()),
      ..TaskSummary::default()
    })
    .with_payload(json!({ "plan": plan }));
  ctx
    .timeline()
    .append(&TimelineRecord::now("task.plan", envelope))
    .context("failed to append timeline")?;

  println!("{}", serde_json::to_string_pretty(&plan)?);
  Ok(())
}

fn is_blank(value: &Value) -> bool {
  value.is_null() || value.as_str().is_some_and(str::is_empty)
}

#[cfg(test)]
mod tests {
  use std::fs;
  use std::path::Path;

  use relay_core::store;

  use super::*;

  fn ctx_with_task(root: &Path) -> CommandContext {
    let relay_dir = root.join(".relay");
    fs::create_dir_all(&relay_dir).unwrap();
    fs::write(
      relay_dir.join("config.toml"),
      "[agents.backend]\nrole = \"developer\"\nrepos = [\"Yega-API\"]\n",
    )
    .unwrap();
    let ctx = CommandContext::at(root.to_path_buf()).unwrap();
    relay_core::adapters::fs::ensure_layout(
      &ctx.paths,
      ctx.config.agents.keys().map(String::as_str),
    )
    .unwrap();
    let envelope = Envelope::new("task.create", AgentRef::orchestrator()).with_task(TaskSummary {
      id: Some("task-1".to_string()),
      title: Some("Ship checkout".to_string()),
      description: None,
      repo: Some("Yega-API".to_string()),
      status: Some("pending".to_string()),
    });
    store::upsert(&ctx.store(), &envelope, Some("orchestrator")).unwrap();
    ctx
  }

  fn record_changeset(ctx: &CommandContext, changeset: Value) {
    let task_store = ctx.store();
    let mut doc = task_store.load();
    doc.find_mut("task-1").unwrap().artifacts.last_changeset = Some(changeset);
    task_store.save(&doc).unwrap();
  }

  #[test]
  fn builds_numbered_steps_from_patches() {
    let td = tempfile::tempdir().unwrap();
    let ctx = ctx_with_task(td.path());
    record_changeset(
      &ctx,
      json!({
        "version": "mcp/changeset@1",
        "patches": [
          { "path": "src/a.ts", "note": "fix import" },
          { "path": "src/b.ts" },
        ],
        "tests": ["pnpm test"],
        "plan": "apply in order",
      }),
    );

    run(&ctx, "task-1").unwrap();

    let doc = ctx.store().load();
    let plan = doc.find("task-1").unwrap().artifacts.pull_plan.clone().unwrap();
    assert_eq!(plan["version"], "mcp/pull-plan@1");
    assert_eq!(plan["repo"], "Yega-API");
    assert_eq!(plan["steps"][0]["id"], "1");
    assert_eq!(plan["steps"][0]["action"], "apply-patch");
    assert_eq!(plan["steps"][0]["path"], "src/a.ts");
    assert_eq!(plan["steps"][0]["note"], "fix import");
    assert_eq!(plan["steps"][1]["id"], "2");
    assert_eq!(plan["steps"][1]["note"], "");
    assert_eq!(plan["tests"][0], "pnpm test");
    assert_eq!(plan["notes"], "apply in order");

    let events: Vec<String> = ctx
      .timeline()
      .tail(None, 10)
      .unwrap()
      .into_iter()
      .map(|r| r.event)
      .collect();
    assert!(events.contains(&"task.plan".to_string()));
  }

  #[test]
  fn changeset_repo_overrides_task_repo() {
    let td = tempfile::tempdir().unwrap();
    let ctx = ctx_with_task(td.path());
    record_changeset(
      &ctx,
      json!({ "repo": "Yega-Ordena", "patches": [{ "path": "x" }] }),
    );

    run(&ctx, "task-1").unwrap();

    let doc = ctx.store().load();
    let plan = doc.find("task-1").unwrap().artifacts.pull_plan.clone().unwrap();
    assert_eq!(plan["repo"], "Yega-Ordena");
    assert_eq!(plan["tests"], json!([]));
    assert_eq!(plan["notes"], "");
  }

  #[test]
  fn missing_changeset_is_an_error() {
    let td = tempfile::tempdir().unwrap();
    let ctx = ctx_with_task(td.path());
    assert!(run(&ctx, "task-1").is_err());
  }

  #[test]
  fn changeset_without_patch_array_is_an_error() {
    let td = tempfile::tempdir().unwrap();
    let ctx = ctx_with_task(td.path());
    record_changeset(&ctx, json!({ "summary": "no patches here" }));
    assert!(run(&ctx, "task-1").is_err());
  }
}
