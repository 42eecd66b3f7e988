//! Extraction Engine Contract
//!
//! Defines the uniform interface all external text recognition engines
//! implement: `recognize(bytes, media) -> (text, confidence) | failure`.
//! Whether an engine is enabled is configuration owned by the host, not
//! logic in this crate.

use async_trait::async_trait;
use excellentcase_core::MediaType;
use thiserror::Error;

/// Errors an engine call can produce.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The engine backend is not installed or not reachable.
    #[error("engine unavailable: {0}")]
    Unavailable(String),

    /// The engine ran but produced no text.
    #[error("engine returned empty output")]
    Empty,

    /// The engine call exceeded its deadline.
    #[error("engine timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Any other backend failure.
    #[error("engine error: {0}")]
    Backend(String),
}

/// Result type alias for engine calls
pub type EngineResult<T> = Result<T, EngineError>;

/// One engine's recognition output.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOutput {
    /// Recognized text, newline-joined lines.
    pub text: String,
    /// Engine-reported mean confidence in `0.0..=1.0`.
    pub confidence: f32,
}

impl EngineOutput {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }

    /// Whether the output carries any non-whitespace text.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Trait that all external text recognition engines implement.
///
/// Implementations must not mutate or retain the document bytes; a call is a
/// pure request to an external service or library.
#[async_trait]
pub trait TextEngine: Send + Sync {
    /// Returns the engine name for identification and confidence reporting.
    fn name(&self) -> &'static str;

    /// Recognize text from raw document bytes.
    async fn recognize(&self, bytes: &[u8], media: MediaType) -> EngineResult<EngineOutput>;
}
