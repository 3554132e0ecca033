//! Configuration Types
//!
//! Explicit configuration objects passed into the orchestrator at call
//! time. Credentials live here and nowhere else; providers never consult
//! process-global state at validation time.

use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub gemini: GeminiConfig,
    pub deepseek: DeepSeekConfig,
    pub search: SearchConfig,
    pub webhook: WebhookConfig,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("gemini", &self.gemini)
            .field("deepseek", &self.deepseek)
            .field("search", &self.search)
            .field("webhook", &self.webhook)
            .finish()
    }
}

impl Config {
    /// Validate configuration values. Returns `MarkError::Config` on
    /// failure.
    pub fn validate(&self) -> crate::types::Result<()> {
        if let Some(url) = &self.webhook.url {
            let parsed = url::Url::parse(url).map_err(|e| {
                crate::types::MarkError::Config(format!("Invalid webhook URL '{}': {}", url, e))
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(crate::types::MarkError::Config(format!(
                    "Webhook URL must use http or https scheme, got: {}",
                    parsed.scheme()
                )));
            }
        }
        Ok(())
    }
}

fn redact(key: &Option<String>) -> &'static str {
    if key.is_some() { "[REDACTED]" } else { "None" }
}

// =============================================================================
// Provider Configurations
// =============================================================================

/// Gemini credentials and model override.
///
/// API keys are never serialized back out; each provider converts the key
/// to a `SecretString` internally for runtime protection.
#[derive(Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GeminiConfig {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Model override; a leading `models/` prefix is tolerated and
    /// stripped before use
    pub model: Option<String>,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .finish()
    }
}

/// DeepSeek credentials and model override
#[derive(Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DeepSeekConfig {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: Option<String>,
}

impl std::fmt::Debug for DeepSeekConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeepSeekConfig")
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .finish()
    }
}

/// SerpAPI credentials
#[derive(Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SearchConfig {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl std::fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchConfig")
            .field("api_key", &redact(&self.api_key))
            .finish()
    }
}

/// Webhook workflow endpoint (e.g. an n8n workflow)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WebhookConfig {
    pub url: Option<String>,
}
