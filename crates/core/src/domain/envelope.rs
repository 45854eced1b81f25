use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

/// Envelope schema version stamped into `meta.version`.
pub const ENVELOPE_VERSION: &str = "2.0";

/// Originator of an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRef {
  pub name: String,
  #[serde(default)]
  pub role: String,
}

impl AgentRef {
  pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      role: role.into(),
    }
  }

  /// Identity used for envelopes built by the relay process itself.
  pub fn orchestrator() -> Self {
    Self::new("orchestrator", "system")
  }
}

/// Delivery filter. An absent filter means broadcast; every present
/// constraint must hold for an agent to receive a copy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub agents: Option<Vec<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub roles: Option<Vec<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub repos: Option<Vec<String>>,
}

/// Task fields embedded in an envelope. Everything is optional on the wire;
/// the store ignores envelopes that carry no task id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSummary {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub title: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub repo: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub timestamp: Option<DateTime<Utc>>,
  #[serde(default)]
  pub version: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub correlation_id: Option<String>,
}

/// The unit of communication on the bus.
///
/// `id` is the stable correlation key: acknowledgements of the same exchange
/// reuse it, and inbox copies of one logical envelope share it. The file name
/// carries an additional delivery timestamp so copies never collide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
  pub id: String,
  #[serde(rename = "type")]
  pub event_type: String,
  pub agent: AgentRef,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub target: Option<Target>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub task: Option<TaskSummary>,
  #[serde(default)]
  pub payload: Value,
  pub meta: Meta,
}

impl Envelope {
  /// Build a fresh envelope originating from `agent`. The correlation id
  /// starts out equal to the envelope id.
  pub fn new(event_type: impl Into<String>, agent: AgentRef) -> Self {
    let id = Uuid::new_v4().to_string();
    Self {
      meta: Meta {
        timestamp: Some(Utc::now()),
        version: ENVELOPE_VERSION.to_string(),
        correlation_id: Some(id.clone()),
      },
      id,
      event_type: event_type.into(),
      agent,
      target: None,
      task: None,
      payload: Value::Object(serde_json::Map::new()),
    }
  }

  #[must_use]
  pub fn with_task(mut self, task: TaskSummary) -> Self {
    self.task = Some(task);
    self
  }

  #[must_use]
  pub fn with_target(mut self, target: Target) -> Self {
    self.target = Some(target);
    self
  }

  #[must_use]
  pub fn with_payload(mut self, payload: Value) -> Self {
    self.payload = payload;
    self
  }

  pub fn kind(&self) -> EnvelopeKind {
    EnvelopeKind::classify(&self.event_type)
  }

  /// Task id carried by this envelope, if any.
  pub fn task_id(&self) -> Option<&str> {
    self.task.as_ref().and_then(|t| t.id.as_deref())
  }

  /// Timestamp for folding this envelope into state: `meta.timestamp` when
  /// present, otherwise now.
  pub fn effective_timestamp(&self) -> DateTime<Utc> {
    self.meta.timestamp.unwrap_or_else(Utc::now)
  }

  pub fn format_filename(id: &str, millis: i64) -> String {
    format!("{}-{}.json", id, millis)
  }

  /// File name for materializing this envelope into a mailbox right now.
  pub fn filename(&self) -> String {
    Self::format_filename(&self.id, Utc::now().timestamp_millis())
  }

  pub fn parse_filename(filename: &str) -> Result<(String, i64), EnvelopeError> {
    let name = filename.rsplit('/').next().unwrap_or(filename);
    let re: &Regex = get_file_regex();
    if let Some(caps) = re.captures(name) {
      let millis: i64 = caps[2]
        .parse()
        .map_err(|_| EnvelopeError::InvalidFilename(filename.to_string()))?;
      Ok((caps[1].to_string(), millis))
    } else {
      Err(EnvelopeError::InvalidFilename(filename.to_string()))
    }
  }
}

fn get_file_regex() -> &'static Regex {
  // ^(.+)-(\d+)\.json$ with a greedy id part, so ids may themselves contain dashes
  static ONCE_CELL: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
  ONCE_CELL.get_or_init(|| Regex::new(r"^(.+)-(\d+)\.json$").expect("valid regex"))
}

#[derive(Debug, Error)]
pub enum EnvelopeError {
  #[error("invalid envelope filename: {0}")]
  InvalidFilename(String),
}

/// Classification of the dot-namespaced `type` string. Acknowledgements and
/// log events take precedence so they always classify as terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeKind {
  TaskCreate,
  TaskUpdate,
  ChangeRequest,
  Result,
  Log,
  Ack,
  Other,
}

impl EnvelopeKind {
  pub fn classify(event_type: &str) -> Self {
    if event_type.ends_with(".ack") {
      return Self::Ack;
    }
    if event_type.starts_with("log.") {
      return Self::Log;
    }
    match event_type {
      "task.create" => Self::TaskCreate,
      "task.update" => Self::TaskUpdate,
      "change.request" => Self::ChangeRequest,
      _ if event_type.starts_with("result.") => Self::Result,
      _ => Self::Other,
    }
  }

  /// Terminal events are consumed by the reconciler and never re-routed.
  pub fn is_terminal(&self) -> bool {
    matches!(self, Self::Ack | Self::Log)
  }
}

/// Lenient view of a `task.update` payload. Anything that does not parse
/// degrades to the default instead of erroring.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskUpdatePayload {
  #[serde(default)]
  pub status: Option<String>,
}

impl TaskUpdatePayload {
  pub fn from_value(value: &Value) -> Self {
    serde_json::from_value(value.clone()).unwrap_or_default()
  }
}

/// Lenient view of a `result.*` payload. Adapters emit the provider fields
/// either at the top level or nested under `result`; accessors resolve the
/// fallback chain.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResultPayload {
  #[serde(default)]
  pub provider: Option<String>,
  #[serde(default)]
  pub model: Option<String>,
  #[serde(default)]
  pub status: Option<Value>,
  #[serde(default)]
  pub structured: Option<Value>,
  #[serde(default)]
  pub content: Option<String>,
  #[serde(default)]
  pub text: Option<String>,
  #[serde(default)]
  pub kind: Option<String>,
  #[serde(default)]
  pub result: Option<Box<ResultPayload>>,
}

impl ResultPayload {
  pub fn from_value(value: &Value) -> Self {
    serde_json::from_value(value.clone()).unwrap_or_default()
  }

  pub fn provider(&self) -> Option<&str> {
    self
      .provider
      .as_deref()
      .or_else(|| self.result.as_ref().and_then(|r| r.provider.as_deref()))
  }

  pub fn model(&self) -> Option<&str> {
    self
      .model
      .as_deref()
      .or_else(|| self.result.as_ref().and_then(|r| r.model.as_deref()))
  }

  pub fn status(&self) -> Option<&Value> {
    self
      .status
      .as_ref()
      .or_else(|| self.result.as_ref().and_then(|r| r.status.as_ref()))
  }

  pub fn structured(&self) -> Option<&Value> {
    self
      .structured
      .as_ref()
      .or_else(|| self.result.as_ref().and_then(|r| r.structured.as_ref()))
  }

  pub fn kind(&self) -> Option<&str> {
    self
      .kind
      .as_deref()
      .or_else(|| self.result.as_ref().and_then(|r| r.kind.as_deref()))
  }

  /// Free-text content; empty strings fall through the chain so a blank
  /// `content` does not mask a populated `text`.
  pub fn content(&self) -> Option<&str> {
    self
      .content
      .as_deref()
      .filter(|s| !s.is_empty())
      .or_else(|| self.text.as_deref().filter(|s| !s.is_empty()))
      .or_else(|| {
        self
          .result
          .as_ref()
          .and_then(|r| r.content.as_deref().filter(|s| !s.is_empty()))
      })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use proptest::prelude::*;
  use serde_json::json;

  #[test]
  fn classification_table() {
    use EnvelopeKind::*;
    let cases = [
      ("task.create", TaskCreate),
      ("task.update", TaskUpdate),
      ("change.request", ChangeRequest),
      ("result.review", Result),
      ("result.summary", Result),
      ("log.error", Log),
      ("log.info", Log),
      ("task.create.ack", Ack),
      ("change.request.ack", Ack),
      ("something.else", Other),
      ("", Other),
    ];
    for (ty, expected) in cases {
      assert_eq!(EnvelopeKind::classify(ty), expected, "type {ty:?}");
    }
  }

  #[test]
  fn acks_and_logs_are_terminal() {
    assert!(EnvelopeKind::classify("task.update.ack").is_terminal());
    assert!(EnvelopeKind::classify("log.error").is_terminal());
    assert!(!EnvelopeKind::classify("result.review").is_terminal());
    assert!(!EnvelopeKind::classify("change.request").is_terminal());
  }

  #[test]
  fn new_envelope_correlates_to_itself() {
    let env = Envelope::new("task.create", AgentRef::orchestrator());
    assert_eq!(env.meta.correlation_id.as_deref(), Some(env.id.as_str()));
    assert_eq!(env.meta.version, ENVELOPE_VERSION);
    assert!(env.meta.timestamp.is_some());
  }

  #[test]
  fn wire_shape_uses_camel_case() {
    let env = Envelope::new("task.create", AgentRef::orchestrator())
      .with_task(TaskSummary {
        id: Some("t1".into()),
        title: Some("Fix login".into()),
        ..Default::default()
      })
      .with_target(Target {
        repos: Some(vec!["Yega-API".into()]),
        ..Default::default()
      });
    let v = serde_json::to_value(&env).expect("serialize");
    assert_eq!(v["type"], "task.create");
    assert_eq!(v["agent"]["name"], "orchestrator");
    assert_eq!(v["task"]["id"], "t1");
    assert_eq!(v["target"]["repos"][0], "Yega-API");
    assert!(v["meta"].get("correlationId").is_some());
    // absent optional fields are omitted, not null
    assert!(v["task"].get("repo").is_none());
  }

  #[test]
  fn parses_wire_envelope_without_optionals() {
    let raw = json!({
      "id": "abc",
      "type": "result.review",
      "agent": {"name": "blackbox", "role": "executor"},
      "payload": {"provider": "blackbox"},
      "meta": {"timestamp": "2025-01-05T10:00:00.000Z", "version": "2.0"}
    });
    let env: Envelope = serde_json::from_value(raw).expect("parse");
    assert_eq!(env.kind(), EnvelopeKind::Result);
    assert!(env.target.is_none());
    assert!(env.task_id().is_none());
  }

  #[test]
  fn filename_format_and_parse() {
    let name = Envelope::format_filename("550e8400-e29b-41d4-a716-446655440000", 1724212345678);
    assert_eq!(name, "550e8400-e29b-41d4-a716-446655440000-1724212345678.json");
    let (id, ts) = Envelope::parse_filename(&name).expect("parse");
    assert_eq!(id, "550e8400-e29b-41d4-a716-446655440000");
    assert_eq!(ts, 1724212345678);
  }

  #[test]
  fn filename_rejects_non_envelope_files() {
    assert!(Envelope::parse_filename("notes.txt").is_err());
    assert!(Envelope::parse_filename("abc.json").is_err());
  }

  #[test]
  fn result_payload_shapes_normalize() {
    let top = ResultPayload::from_value(&json!({
      "provider": "blackbox", "model": "m1", "status": 200, "content": "hello"
    }));
    assert_eq!(top.provider(), Some("blackbox"));
    assert_eq!(top.content(), Some("hello"));

    let nested = ResultPayload::from_value(&json!({
      "result": {"provider": "mistral", "model": "m2", "content": "nested"}
    }));
    assert_eq!(nested.provider(), Some("mistral"));
    assert_eq!(nested.model(), Some("m2"));
    assert_eq!(nested.content(), Some("nested"));

    let text_only = ResultPayload::from_value(&json!({
      "provider": "blackbox", "content": "", "text": "from text"
    }));
    assert_eq!(text_only.content(), Some("from text"));
  }

  #[test]
  fn malformed_payload_views_degrade_to_default() {
    let p = TaskUpdatePayload::from_value(&json!({"status": 42}));
    assert!(p.status.is_none());
    let r = ResultPayload::from_value(&json!("just a string"));
    assert!(r.provider().is_none());
  }

  proptest! {
    #[test]
    fn filename_parsing_is_inverse(id in "[a-z0-9][a-z0-9-]{0,40}", millis in 0i64..=4_102_444_800_000) {
      let name = Envelope::format_filename(&id, millis);
      let (pid, pmillis) = Envelope::parse_filename(&name).unwrap();
      prop_assert_eq!(pid, id);
      prop_assert_eq!(pmillis, millis);
    }
  }
}
