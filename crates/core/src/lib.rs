//! Core library for the Relay orchestrator.
//!
//! Provides the envelope and task domain models, the filesystem layout
//! adapter, configuration loading and defaults, structured logging, and the
//! message-bus machinery: per-agent mailboxes, the envelope router, the
//! durable task store with its upsert fold, the append-only timeline, the
//! outbox reconciler, and the text-generation provider client.
//!
//! Quick start:
//! - Load config via `relay_core::config::load(Some(project_root))`.
//! - Build a `RelayPaths` from `relay_core::adapters::fs` and open the
//!   filesystem-backed mailbox/store/timeline on top of it.
//! - Route envelopes with `relay_core::router::route` and drain agent
//!   outboxes with `relay_core::reconcile::Reconciler`.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod logging;
pub mod mailbox;
pub mod provider;
pub mod reconcile;
pub mod router;
pub mod store;
pub mod timeline;
