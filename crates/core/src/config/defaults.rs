use super::types::ProviderConfig;

pub(crate) fn default_provider() -> ProviderConfig {
  ProviderConfig {
    name: "blackbox".to_string(),
    api_url: "https://api.blackbox.ai/v1/chat/completions".to_string(),
    model: "blackboxai/anthropic/claude-3.7-sonnet".to_string(),
    summary_model: "blackboxai/anthropic/claude-3.5-haiku-20241022".to_string(),
    api_key_env: "RELAY_PROVIDER_API_KEY".to_string(),
  }
}
