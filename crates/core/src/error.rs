//! Pipeline Error Types
//!
//! Defines the error taxonomy for the document-to-test-case pipeline.
//! Submission errors (`DocumentTooLarge`, `UnsupportedMediaType`) are surfaced
//! before a job is created; stage errors carry through the job state machine
//! and are reported with the stage that produced them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One pipeline phase with its own cache and external adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Extraction,
    Analysis,
    Generation,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Extraction => write!(f, "extraction"),
            Stage::Analysis => write!(f, "analysis"),
            Stage::Generation => write!(f, "generation"),
        }
    }
}

/// Error type for the ExcellentCase pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Document exceeds the configured maximum size; rejected at submission.
    #[error("Document too large: {size} bytes (maximum {max} bytes)")]
    DocumentTooLarge { size: u64, max: u64 },

    /// Document bytes are not a recognized raster image or PDF.
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// Every enabled extraction engine failed or returned empty output.
    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    /// Provider error, timeout, or zero valid test points after validation.
    #[error("Analysis failed: {0}")]
    AnalysisFailed(String),

    /// A generation invariant was violated. Indicates a logic defect, never
    /// user-recoverable.
    #[error("Generation invariant violation: {0}")]
    GenerationInvariant(String),

    /// A cache entry was unreadable. Self-healing: treated as a miss and the
    /// entry is discarded; never surfaced to callers.
    #[error("Cache entry corrupted: {0}")]
    CacheCorrupted(String),

    /// Admission rejected because the memory ceiling is exceeded and sweeping
    /// did not free enough headroom.
    #[error("Memory pressure: {0}")]
    MemoryPressure(String),

    /// Job cancelled by its owner before reaching a terminal state.
    #[error("Job cancelled")]
    Cancelled,

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for pipeline errors
pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    /// Create an extraction error
    pub fn extraction(msg: impl Into<String>) -> Self {
        Self::ExtractionFailed(msg.into())
    }

    /// Create an analysis error
    pub fn analysis(msg: impl Into<String>) -> Self {
        Self::AnalysisFailed(msg.into())
    }

    /// Create a generation invariant error
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::GenerationInvariant(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the orchestrator may retry the failed stage.
    ///
    /// Only transient adapter failures qualify; submission errors, invariant
    /// violations, and cancellation are final.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PipelineError::ExtractionFailed(_) | PipelineError::AnalysisFailed(_)
        )
    }

    /// The stage this error originates from, if it is a stage error.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::ExtractionFailed(_) => Some(Stage::Extraction),
            PipelineError::AnalysisFailed(_) => Some(Stage::Analysis),
            PipelineError::GenerationInvariant(_) => Some(Stage::Generation),
            _ => None,
        }
    }
}

/// Convert PipelineError to a string
impl From<PipelineError> for String {
    fn from(err: PipelineError) -> String {
        err.to_string()
    }
}

/// Structured error reported to a job's caller: kind + stage + message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobError {
    /// Stage that produced the error, if any.
    pub stage: Option<Stage>,
    /// Error kind identifier (variant name).
    pub kind: String,
    /// Human-readable message.
    pub message: String,
}

impl JobError {
    pub fn new(err: &PipelineError) -> Self {
        let kind = match err {
            PipelineError::DocumentTooLarge { .. } => "document_too_large",
            PipelineError::UnsupportedMediaType(_) => "unsupported_media_type",
            PipelineError::ExtractionFailed(_) => "extraction_failed",
            PipelineError::AnalysisFailed(_) => "analysis_failed",
            PipelineError::GenerationInvariant(_) => "generation_invariant_violation",
            PipelineError::CacheCorrupted(_) => "cache_corrupted",
            PipelineError::MemoryPressure(_) => "memory_pressure",
            PipelineError::Cancelled => "cancelled",
            PipelineError::Config(_) => "config",
            PipelineError::Io(_) => "io",
            PipelineError::Serialization(_) => "serialization",
        };
        Self {
            stage: err.stage(),
            kind: kind.to_string(),
            message: err.to_string(),
        }
    }
}

impl std::fmt::Display for JobError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.stage {
            Some(stage) => write!(f, "[{}] {}", stage, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}
