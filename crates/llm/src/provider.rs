//! Chat Provider Trait
//!
//! Defines the common interface for all AI providers and the shared
//! OpenAI-compatible chat-completions wire helper. All four supported
//! providers speak this wire format; they differ only in endpoint, defaults,
//! and identity.

use std::sync::Arc;

use async_trait::async_trait;
use excellentcase_core::{PipelineError, PipelineResult};
use serde::Deserialize;

use crate::types::{LlmError, LlmResult, ProviderConfig, ProviderKind};

/// System prompt sent with every analysis request.
pub(crate) const SYSTEM_PROMPT: &str =
    "You are a senior test architect who extracts comprehensive, actionable \
     test points from requirement documents.";

/// Trait that all AI providers must implement.
///
/// Provides a single-turn completion: one system prompt, one user prompt,
/// one text response. Retry policy lives in the pipeline orchestrator, not
/// here.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Returns the provider name for identification.
    fn name(&self) -> &'static str;

    /// Returns the current model being used.
    fn model(&self) -> &str;

    /// Send a prompt and get the complete response text.
    async fn chat(&self, prompt: &str) -> LlmResult<String>;
}

impl std::fmt::Debug for dyn ChatProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatProvider")
            .field("name", &self.name())
            .field("model", &self.model())
            .finish()
    }
}

/// Create the configuration-selected provider implementation.
///
/// The caller gets a `ChatProvider` and never needs to know which variant is
/// behind it.
pub fn build_provider(config: ProviderConfig) -> PipelineResult<Arc<dyn ChatProvider>> {
    if config.api_key.is_empty() && config.kind != ProviderKind::Custom {
        return Err(PipelineError::config(format!(
            "API key not configured for {}",
            config.kind
        )));
    }
    let provider: Arc<dyn ChatProvider> = match config.kind {
        ProviderKind::OpenAi => Arc::new(crate::openai::OpenAiProvider::new(config)),
        ProviderKind::Qwen => Arc::new(crate::qwen::QwenProvider::new(config)),
        ProviderKind::DeepSeek => Arc::new(crate::deepseek::DeepSeekProvider::new(config)),
        ProviderKind::Custom => Arc::new(crate::custom::CustomProvider::new(config)?),
    };
    Ok(provider)
}

/// Build the reqwest client for a provider, applying its request timeout.
pub(crate) fn build_http_client(config: &ProviderConfig) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(config.timeout)
        .build()
        .unwrap_or_default()
}

/// Map an HTTP error status to a provider error.
pub(crate) fn parse_http_error(status: u16, body: &str, provider: &str) -> LlmError {
    match status {
        401 | 403 => LlmError::AuthenticationFailed {
            message: format!("{}: invalid or unauthorized API key", provider),
        },
        429 => LlmError::RateLimited {
            message: truncate(body, 200),
        },
        400 | 404 => LlmError::InvalidRequest {
            message: truncate(body, 200),
        },
        500..=599 => LlmError::ServerError {
            message: truncate(body, 200),
            status: Some(status),
        },
        _ => LlmError::ServerError {
            message: format!("HTTP {}: {}", status, truncate(body, 200)),
            status: Some(status),
        },
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// POST a chat-completions request and return the first choice's content.
///
/// Shared by every provider implementation; the caller supplies its resolved
/// endpoint and identity.
pub(crate) async fn chat_completions(
    client: &reqwest::Client,
    base_url: &str,
    config: &ProviderConfig,
    provider_name: &str,
    prompt: &str,
) -> LlmResult<String> {
    let url = format!("{}/chat/completions", base_url.trim_end_matches('/'));
    let body = serde_json::json!({
        "model": config.model,
        "messages": [
            { "role": "system", "content": SYSTEM_PROMPT },
            { "role": "user", "content": prompt },
        ],
        "temperature": config.temperature,
        "max_tokens": config.max_tokens,
    });

    tracing::debug!(provider = provider_name, model = %config.model, "sending chat request");

    let response = client
        .post(&url)
        .bearer_auth(&config.api_key)
        .json(&body)
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout(config.timeout)
            } else {
                LlmError::Network {
                    message: e.to_string(),
                }
            }
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(parse_http_error(status.as_u16(), &body, provider_name));
    }

    let parsed: ChatResponse = response.json().await.map_err(|e| LlmError::MalformedResponse {
        message: e.to_string(),
    })?;

    let content = parsed
        .choices
        .first()
        .and_then(|c| c.message.as_ref())
        .and_then(|m| m.content.clone())
        .unwrap_or_default();

    if content.trim().is_empty() {
        return Err(LlmError::EmptyResponse);
    }
    Ok(content)
}
