//! ExcellentCase LLM
//!
//! Provides a unified interface for deriving test points from requirement
//! text via multiple AI providers:
//! - OpenAI
//! - Qwen (DashScope compatible mode)
//! - DeepSeek
//! - Custom (any OpenAI-compatible endpoint)
//!
//! All providers share one request/response contract; the pipeline never
//! branches on provider identity.

pub mod analyzer;
pub mod custom;
pub mod deepseek;
pub mod openai;
pub mod parser;
pub mod provider;
pub mod qwen;
pub mod types;

// Re-export main types
pub use analyzer::TestPointAnalyzer;
pub use custom::CustomProvider;
pub use deepseek::DeepSeekProvider;
pub use openai::OpenAiProvider;
pub use provider::{build_provider, ChatProvider};
pub use qwen::QwenProvider;
pub use types::{LlmError, LlmResult, ProviderConfig, ProviderKind};
