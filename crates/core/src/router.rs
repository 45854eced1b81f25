use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::config::AgentSpec;
use crate::domain::envelope::{Envelope, Target};
use crate::mailbox::Mailbox;

/// Does `target` select this agent? An absent target matches everyone;
/// otherwise every present constraint must hold. The repo constraint is only
/// enforced when both sides declare repos, so an agent with an empty repo
/// list receives repo-filtered envelopes too.
pub fn matches(name: &str, spec: &AgentSpec, target: Option<&Target>) -> bool {
  let Some(target) = target else {
    return true;
  };
  if let Some(agents) = &target.agents
    && !agents.iter().any(|a| a == name)
  {
    return false;
  }
  if let Some(roles) = &target.roles
    && !roles.iter().any(|r| *r == spec.role)
  {
    return false;
  }
  if let Some(repos) = &target.repos
    && !repos.is_empty()
    && !spec.repos.is_empty()
    && !repos.iter().any(|r| spec.repos.contains(r))
  {
    return false;
  }
  true
}

/// Deliver a copy of the envelope into every matching agent's inbox. Returns
/// the delivered agent names in registry order. Inbox writes are independent:
/// a failed write is logged and skipped, the rest still deliver.
pub fn route(
  registry: &BTreeMap<String, AgentSpec>,
  mailbox: &dyn Mailbox,
  envelope: &Envelope,
) -> Vec<String> {
  route_excluding(registry, mailbox, envelope, None)
}

/// Like [`route`], but never delivers to `exclude`. The reconciler passes the
/// originating agent here so drained events do not echo back to their sender.
pub fn route_excluding(
  registry: &BTreeMap<String, AgentSpec>,
  mailbox: &dyn Mailbox,
  envelope: &Envelope,
  exclude: Option<&str>,
) -> Vec<String> {
  let mut delivered = Vec::new();
  for (name, spec) in registry {
    if exclude.is_some_and(|excluded| excluded == name) {
      continue;
    }
    if !matches(name, spec, envelope.target.as_ref()) {
      continue;
    }
    match mailbox.deliver(name, envelope) {
      Ok(()) => delivered.push(name.clone()),
      Err(err) => {
        warn!(
          event = "delivery_failed",
          agent = %name,
          envelope = %envelope.id,
          error = %err,
          "skipping inbox write"
        );
      }
    }
  }
  info!(
    event = "envelope_routed",
    envelope = %envelope.id,
    event_type = %envelope.event_type,
    delivered = delivered.len()
  );
  delivered
}
