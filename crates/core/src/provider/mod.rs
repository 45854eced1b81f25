//! Boundary to the external text-generation collaborator.
//!
//! Commands talk to the [`Provider`] trait; the HTTP implementation posts an
//! OpenAI-style chat-completions request to the configured endpoint. Replies
//! are free text that may carry one fenced JSON block conforming to a known
//! schema tag (see [`crate::domain::schema`]); extraction failures degrade to
//! a raw-text summary object instead of erroring.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Value, json};
use thiserror::Error;

use crate::config::ProviderConfig;
use crate::domain::schema;

#[derive(Debug, Error)]
pub enum ProviderError {
  #[error("api key environment variable `{0}` is not set")]
  MissingApiKey(String),
  #[error("request: {0}")]
  Request(#[from] reqwest::Error),
  #[error("runtime: {0}")]
  Runtime(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ProviderError>;

/// Raw outcome of one generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderReply {
  /// HTTP status of the upstream call.
  pub status: u16,
  /// Assistant text with transport framing stripped.
  pub content: String,
  /// Model that produced the reply.
  pub model: String,
}

/// A blocking text-generation call. The network call is the only thing that
/// blocks; callers invoke it from commands, never from drain passes.
pub trait Provider {
  fn generate(&self, prompt: &str, model: &str) -> Result<ProviderReply>;
}

/// Chat-completions client for the configured endpoint. The API key comes
/// from the environment variable named in config, never from the file.
#[derive(Debug, Clone)]
pub struct HttpProvider {
  config: ProviderConfig,
  client: reqwest::Client,
}

impl HttpProvider {
  pub fn new(config: ProviderConfig) -> Self {
    Self {
      config,
      client: reqwest::Client::new(),
    }
  }

  fn api_key(&self) -> Result<String> {
    std::env::var(&self.config.api_key_env)
      .ok()
      .filter(|key| !key.is_empty())
      .ok_or_else(|| ProviderError::MissingApiKey(self.config.api_key_env.clone()))
  }
}

impl Provider for HttpProvider {
  fn generate(&self, prompt: &str, model: &str) -> Result<ProviderReply> {
    let api_key = self.api_key()?;
    let body = chat_request(model, prompt);
    let runtime = tokio::runtime::Builder::new_current_thread()
      .enable_all()
      .build()?;
    runtime.block_on(async {
      let response = self
        .client
        .post(&self.config.api_url)
        .bearer_auth(&api_key)
        .json(&body)
        .send()
        .await?;
      let status = response.status().as_u16();
      let text = response.text().await?;
      Ok(ProviderReply {
        status,
        content: extract_content(&text),
        model: model.to_string(),
      })
    })
  }
}

fn chat_request(model: &str, prompt: &str) -> Value {
  json!({
    "model": model,
    "messages": [{"role": "user", "content": prompt}],
  })
}

/// `choices[0].message.content`, the provider's bare `output` field, or the
/// raw body when the reply is not the expected JSON.
fn extract_content(text: &str) -> String {
  let Ok(data) = serde_json::from_str::<Value>(text) else {
    return text.to_string();
  };
  data
    .pointer("/choices/0/message/content")
    .and_then(Value::as_str)
    .or_else(|| data.get("output").and_then(Value::as_str))
    .map(str::to_string)
    .unwrap_or_else(|| text.to_string())
}

/// The first fenced ```json block, or the whole text parsed as JSON.
pub fn extract_json_block(text: &str) -> Option<Value> {
  static BLOCK: OnceLock<Regex> = OnceLock::new();
  let re = BLOCK.get_or_init(|| Regex::new(r"(?is)```json\s*(.*?)```").expect("valid regex"));
  if let Some(caps) = re.captures(text)
    && let Ok(value) = serde_json::from_str::<Value>(&caps[1])
  {
    return Some(value);
  }
  serde_json::from_str(text).ok()
}

/// Shallow validation: the block must carry a `version` tag naming one of the
/// known schemas.
pub fn is_known_schema(value: &Value) -> bool {
  value
    .get("version")
    .and_then(Value::as_str)
    .is_some_and(|version| {
      version == schema::ANALYSIS
        || version == schema::RESULT_SUMMARY
        || version == schema::PULL_PLAN
        || version.starts_with(schema::CHANGESET_PREFIX)
    })
}

/// Summary object standing in for a reply that carried no usable block.
pub fn raw_summary_fallback(status: &str, content: &str) -> Value {
  json!({
    "version": schema::RESULT_SUMMARY,
    "status": status,
    "summary": content.chars().take(2000).collect::<String>(),
  })
}
