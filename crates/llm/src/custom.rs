//! Custom Provider
//!
//! Implementation of the ChatProvider trait for any OpenAI-compatible
//! endpoint the user supplies. Unlike the named providers there is no
//! default base URL, so construction fails without one.

use async_trait::async_trait;
use excellentcase_core::{PipelineError, PipelineResult};

use crate::provider::{build_http_client, chat_completions, ChatProvider};
use crate::types::{LlmResult, ProviderConfig};

/// Custom OpenAI-compatible provider
pub struct CustomProvider {
    config: ProviderConfig,
    client: reqwest::Client,
    base_url: String,
}

impl CustomProvider {
    /// Create a new custom provider. The configuration must carry a base URL.
    pub fn new(config: ProviderConfig) -> PipelineResult<Self> {
        let base_url = config
            .base_url
            .clone()
            .ok_or_else(|| PipelineError::config("custom provider requires base_url"))?;
        let client = build_http_client(&config);
        Ok(Self {
            config,
            client,
            base_url,
        })
    }
}

#[async_trait]
impl ChatProvider for CustomProvider {
    fn name(&self) -> &'static str {
        "custom"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn chat(&self, prompt: &str) -> LlmResult<String> {
        chat_completions(&self.client, &self.base_url, &self.config, self.name(), prompt).await
    }
}
