//! LLM Types
//!
//! Provider identity, per-provider configuration, and the provider-level
//! error taxonomy with its retryability classification.

use std::time::Duration;

use excellentcase_core::config::ProviderSettings;
use excellentcase_core::{PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Supported AI provider types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Qwen,
    DeepSeek,
    Custom,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::OpenAi => write!(f, "openai"),
            ProviderKind::Qwen => write!(f, "qwen"),
            ProviderKind::DeepSeek => write!(f, "deepseek"),
            ProviderKind::Custom => write!(f, "custom"),
        }
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "qwen" => Ok(ProviderKind::Qwen),
            "deepseek" => Ok(ProviderKind::DeepSeek),
            "custom" => Ok(ProviderKind::Custom),
            other => Err(format!("unsupported provider: {}", other)),
        }
    }
}

/// Configuration for one provider instance.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub api_key: String,
    /// Base URL override (optional except for `Custom`).
    pub base_url: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

impl ProviderConfig {
    /// Build from the application's provider settings.
    pub fn from_settings(settings: &ProviderSettings) -> PipelineResult<Self> {
        let kind: ProviderKind = settings
            .provider
            .parse()
            .map_err(PipelineError::config)?;
        if kind == ProviderKind::Custom && settings.base_url.is_none() {
            return Err(PipelineError::config("custom provider requires base_url"));
        }
        Ok(Self {
            kind,
            api_key: settings.api_key.clone(),
            base_url: settings.base_url.clone(),
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            timeout: Duration::from_secs(settings.timeout_secs),
        })
    }
}

/// Errors from provider calls.
#[derive(Error, Debug)]
pub enum LlmError {
    /// Invalid or missing API key.
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// Provider-side rate limiting (HTTP 429).
    #[error("Rate limited: {message}")]
    RateLimited { message: String },

    /// Provider-side server error (HTTP 5xx).
    #[error("Server error{}: {message}", status.map(|s| format!(" ({})", s)).unwrap_or_default())]
    ServerError { message: String, status: Option<u16> },

    /// Request rejected by the provider (HTTP 400).
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Connection-level failure.
    #[error("Network error: {message}")]
    Network { message: String },

    /// The request exceeded its deadline.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Response did not match the expected wire shape.
    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

    /// The provider returned no content.
    #[error("Empty response from provider")]
    EmptyResponse,
}

/// Result type alias for provider calls
pub type LlmResult<T> = Result<T, LlmError>;

impl LlmError {
    /// Whether a fresh attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LlmError::RateLimited { .. }
                | LlmError::ServerError { .. }
                | LlmError::Network { .. }
                | LlmError::Timeout(_)
        )
    }
}
