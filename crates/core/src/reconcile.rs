use std::collections::BTreeMap;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::AgentSpec;
use crate::mailbox::{Mailbox, OutboxEntry};
use crate::router;
use crate::store::{self, TaskStore};
use crate::timeline::{Timeline, TimelineRecord};

/// Outcome of one drain pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
  /// Outbox entries collected this pass.
  pub collected: usize,
  /// Non-terminal events re-routed to matching inboxes.
  pub routed: usize,
  /// Terminal events (acks, logs) consumed without re-routing.
  pub dropped: usize,
}

/// Drains agent outboxes into the task store and timeline, then re-routes
/// non-terminal events. One instance wires the registry to the storage ports;
/// it holds no state of its own, so running it from several processes is safe
/// under the bus's at-least-once semantics.
pub struct Reconciler<'a> {
  registry: &'a BTreeMap<String, AgentSpec>,
  mailbox: &'a dyn Mailbox,
  store: &'a dyn TaskStore,
  timeline: &'a dyn Timeline,
}

impl<'a> Reconciler<'a> {
  pub fn new(
    registry: &'a BTreeMap<String, AgentSpec>,
    mailbox: &'a dyn Mailbox,
    store: &'a dyn TaskStore,
    timeline: &'a dyn Timeline,
  ) -> Self {
    Self {
      registry,
      mailbox,
      store,
      timeline,
    }
  }

  /// Process every file currently in every registered agent's outbox exactly
  /// once. A pass with no outbox files is a no-op, and a repeated pass with
  /// no new files changes nothing.
  pub fn drain_once(&self) -> DrainReport {
    let mut entries = Vec::new();
    for agent in self.registry.keys() {
      match self.mailbox.collect(agent) {
        Ok(mut collected) => entries.append(&mut collected),
        Err(err) => {
          warn!(
            event = "drain_collect_failed",
            agent = %agent,
            error = %err,
            "skipping outbox this pass"
          );
        }
      }
    }

    let mut report = DrainReport {
      collected: entries.len(),
      ..DrainReport::default()
    };
    if entries.is_empty() {
      debug!(event = "drain_empty", "no outgoing events");
      return report;
    }
    for entry in entries {
      self.process(entry, &mut report);
    }
    report
  }

  /// Timeline first, then the fold, then the routing decision. State is
  /// recorded even for events that end up dropped, and a failure in any one
  /// step never halts the pass.
  fn process(&self, entry: OutboxEntry, report: &mut DrainReport) {
    let record = TimelineRecord::agent_out(entry.from.clone(), entry.envelope.clone());
    if let Err(err) = self.timeline.append(&record) {
      warn!(
        event = "timeline_append_failed",
        from = %entry.from,
        error = %err,
        "continuing without audit record"
      );
    }
    if let Err(err) = store::upsert(self.store, &entry.envelope, Some(&entry.from)) {
      warn!(
        event = "upsert_failed",
        from = %entry.from,
        envelope = %entry.envelope.id,
        error = %err,
        "continuing with unfolded event"
      );
    }

    if entry.envelope.kind().is_terminal() {
      info!(
        event = "event_dropped",
        event_type = %entry.envelope.event_type,
        from = %entry.from
      );
      report.dropped += 1;
    } else {
      let delivered = router::route_excluding(
        self.registry,
        self.mailbox,
        &entry.envelope,
        Some(&entry.from),
      );
      info!(
        event = "event_rerouted",
        event_type = %entry.envelope.event_type,
        from = %entry.from,
        delivered = delivered.len()
      );
      report.routed += 1;
    }

    if let Err(err) = self.mailbox.remove(&entry) {
      warn!(
        event = "drain_remove_failed",
        file = %entry.path.display(),
        error = %err,
        "treating entry as already processed"
      );
    }
  }

  /// Repeat the drain pass on a fixed interval until the process is killed.
  pub async fn watch(&self, interval: Duration) {
    info!(
      event = "watch_started",
      interval_ms = interval.as_millis() as u64
    );
    loop {
      let report = self.drain_once();
      if report.collected > 0 {
        debug!(
          event = "watch_pass",
          collected = report.collected,
          routed = report.routed,
          dropped = report.dropped
        );
      }
      tokio::time::sleep(interval).await;
    }
  }
}
