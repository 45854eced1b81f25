//! Version tags for the structured blocks agents and the provider exchange
//! inside envelope payloads.

pub const ANALYSIS: &str = "mcp/analysis@1";
pub const CHANGESET: &str = "mcp/changeset@1";
pub const RESULT_SUMMARY: &str = "mcp/result-summary@1";
pub const PULL_PLAN: &str = "mcp/pull-plan@1";

/// Family prefix matching changeset blocks of any version.
pub const CHANGESET_PREFIX: &str = "mcp/changeset@";
