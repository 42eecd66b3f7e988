//! OpenAI Provider
//!
//! Implementation of the ChatProvider trait for OpenAI's API.

use async_trait::async_trait;

use crate::provider::{build_http_client, chat_completions, ChatProvider};
use crate::types::{LlmResult, ProviderConfig};

/// Default OpenAI API base URL
const OPENAI_API_URL: &str = "https://api.openai.com/v1";

/// OpenAI provider
pub struct OpenAiProvider {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl OpenAiProvider {
    /// Create a new OpenAI provider with the given configuration
    pub fn new(config: ProviderConfig) -> Self {
        let client = build_http_client(&config);
        Self { config, client }
    }

    fn base_url(&self) -> &str {
        self.config.base_url.as_deref().unwrap_or(OPENAI_API_URL)
    }
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn chat(&self, prompt: &str) -> LlmResult<String> {
        chat_completions(&self.client, self.base_url(), &self.config, self.name(), prompt).await
    }
}
