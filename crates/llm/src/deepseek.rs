//! DeepSeek Provider
//!
//! Implementation of the ChatProvider trait for DeepSeek's API.

use async_trait::async_trait;

use crate::provider::{build_http_client, chat_completions, ChatProvider};
use crate::types::{LlmResult, ProviderConfig};

/// Default DeepSeek API base URL
const DEEPSEEK_API_URL: &str = "https://api.deepseek.com/v1";

/// DeepSeek provider
pub struct DeepSeekProvider {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl DeepSeekProvider {
    /// Create a new DeepSeek provider with the given configuration
    pub fn new(config: ProviderConfig) -> Self {
        let client = build_http_client(&config);
        Self { config, client }
    }

    fn base_url(&self) -> &str {
        self.config.base_url.as_deref().unwrap_or(DEEPSEEK_API_URL)
    }
}

#[async_trait]
impl ChatProvider for DeepSeekProvider {
    fn name(&self) -> &'static str {
        "deepseek"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn chat(&self, prompt: &str) -> LlmResult<String> {
        chat_completions(&self.client, self.base_url(), &self.config, self.name(), prompt).await
    }
}
