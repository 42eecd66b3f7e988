//! Data Models
//!
//! Documents, extraction results, test points, and test cases flowing through
//! the pipeline. All types serialize with camelCase field names so exported
//! artifacts match the documented output record.

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};
use crate::fingerprint::Fingerprint;

// ============================================================================
// Documents
// ============================================================================

/// Media types accepted at submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Png,
    Jpeg,
    Pdf,
}

impl MediaType {
    /// Sniff the media type from leading magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
            Some(MediaType::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(MediaType::Jpeg)
        } else if bytes.starts_with(b"%PDF-") {
            Some(MediaType::Pdf)
        } else {
            None
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaType::Png => write!(f, "image/png"),
            MediaType::Jpeg => write!(f, "image/jpeg"),
            MediaType::Pdf => write!(f, "application/pdf"),
        }
    }
}

/// An ingested requirements document. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct Document {
    bytes: Vec<u8>,
    media_type: MediaType,
}

impl Document {
    /// Ingest raw bytes with a declared media type, validating the declared
    /// type against the leading magic bytes and the size ceiling.
    pub fn new(bytes: Vec<u8>, media_type: MediaType, max_bytes: u64) -> PipelineResult<Self> {
        if bytes.len() as u64 > max_bytes {
            return Err(PipelineError::DocumentTooLarge {
                size: bytes.len() as u64,
                max: max_bytes,
            });
        }
        match MediaType::sniff(&bytes) {
            Some(sniffed) if sniffed == media_type => Ok(Self { bytes, media_type }),
            Some(sniffed) => Err(PipelineError::UnsupportedMediaType(format!(
                "declared {} but content looks like {}",
                media_type, sniffed
            ))),
            None => Err(PipelineError::UnsupportedMediaType(
                "content is not a recognized image or PDF".to_string(),
            )),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Normalized text produced by the extraction stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    /// Fingerprint of the source document.
    pub source_fingerprint: Fingerprint,
    /// Reconciled text from the enabled engines.
    pub normalized_text: String,
    /// Per-engine confidence for the outputs that contributed.
    pub engine_confidence: Vec<(String, f32)>,
}

// ============================================================================
// Test points
// ============================================================================

/// Test category of a test point or test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestCategory {
    Functional,
    Performance,
    Security,
    Compatibility,
    Usability,
}

impl TestCategory {
    /// Short uppercase tag used in category-scoped case identifiers.
    pub fn tag(&self) -> &'static str {
        match self {
            TestCategory::Functional => "FUNC",
            TestCategory::Performance => "PERF",
            TestCategory::Security => "SEC",
            TestCategory::Compatibility => "COMP",
            TestCategory::Usability => "USAB",
        }
    }
}

impl std::fmt::Display for TestCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestCategory::Functional => write!(f, "functional"),
            TestCategory::Performance => write!(f, "performance"),
            TestCategory::Security => write!(f, "security"),
            TestCategory::Compatibility => write!(f, "compatibility"),
            TestCategory::Usability => write!(f, "usability"),
        }
    }
}

/// Test point / test case priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    P0,
    P1,
    P2,
    P3,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::P0 => write!(f, "P0"),
            Priority::P1 => write!(f, "P1"),
            Priority::P2 => write!(f, "P2"),
            Priority::P3 => write!(f, "P3"),
        }
    }
}

/// A categorized testing concern derived from requirement text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestPoint {
    /// Identifier in `TP_###` form.
    pub id: String,
    pub category: TestCategory,
    pub priority: Priority,
    /// What this point verifies.
    pub description: String,
    /// Concrete user scenario the point covers.
    pub scenario: String,
}

/// A validated analysis result: feature name plus a non-empty, priority-
/// ordered sequence of test points.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub feature_name: String,
    pub points: Vec<TestPoint>,
}

// ============================================================================
// Test cases
// ============================================================================

/// Kind of verification a generated test case performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseType {
    Positive,
    Negative,
    Boundary,
    Exceptional,
}

impl std::fmt::Display for CaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaseType::Positive => write!(f, "positive"),
            CaseType::Negative => write!(f, "negative"),
            CaseType::Boundary => write!(f, "boundary"),
            CaseType::Exceptional => write!(f, "exceptional"),
        }
    }
}

/// One numbered step of a test case.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestStep {
    pub step_no: u32,
    pub action: String,
    pub expected: String,
}

/// A concrete, steppable verification procedure derived from one test point.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    /// Category-scoped identifier, e.g. `TC_FUNC_001`.
    pub id: String,
    pub title: String,
    pub category: TestCategory,
    pub priority: Priority,
    pub case_type: CaseType,
    pub steps: Vec<TestStep>,
    /// Summary of the final expected outcome.
    pub expected_result: String,
    pub description: String,
    /// Id of the test point this case was derived from.
    pub source_point: String,
}

/// The output artifact of a completed job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSuite {
    pub feature_name: String,
    pub test_cases: Vec<TestCase>,
}
