//! OpenAI-compatible client configuration.

use crate::config::CompletionSettings;
use crate::error::{Result, VoxError};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Create a client for the configured endpoint.
///
/// Falls back to `OPENAI_API_KEY` when no key is configured.
pub fn create_client(settings: &CompletionSettings) -> Result<Client<OpenAIConfig>> {
    let mut config = OpenAIConfig::default().with_api_base(settings.api_base());
    if let Some(key) = &settings.api_key {
        config = config.with_api_key(key);
    }

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.timeout_secs))
        .build()
        .map_err(|e| VoxError::Config(format!("Failed to create HTTP client: {}", e)))?;

    Ok(Client::with_config(config).with_http_client(http_client))
}
