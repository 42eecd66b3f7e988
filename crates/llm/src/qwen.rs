//! Qwen Provider
//!
//! Implementation of the ChatProvider trait for Alibaba's Qwen models via
//! the DashScope OpenAI-compatible endpoint.

use async_trait::async_trait;

use crate::provider::{build_http_client, chat_completions, ChatProvider};
use crate::types::{LlmResult, ProviderConfig};

/// DashScope OpenAI-compatible base URL
const QWEN_API_URL: &str = "https://dashscope.aliyuncs.com/compatible-mode/v1";

/// Qwen provider
pub struct QwenProvider {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl QwenProvider {
    /// Create a new Qwen provider with the given configuration
    pub fn new(config: ProviderConfig) -> Self {
        let client = build_http_client(&config);
        Self { config, client }
    }

    fn base_url(&self) -> &str {
        self.config.base_url.as_deref().unwrap_or(QWEN_API_URL)
    }
}

#[async_trait]
impl ChatProvider for QwenProvider {
    fn name(&self) -> &'static str {
        "qwen"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn chat(&self, prompt: &str) -> LlmResult<String> {
        chat_completions(&self.client, self.base_url(), &self.config, self.name(), prompt).await
    }
}
