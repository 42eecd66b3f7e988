//! ExcellentCase Core
//!
//! Foundational types shared across the ExcellentCase workspace:
//! - Data models (documents, extraction results, test points, test cases)
//! - The pipeline error taxonomy
//! - Content fingerprinting (SHA-256)
//! - Typed configuration with validation and TOML loading
//!
//! This crate is dependency-light (serde + thiserror + sha2 + toml) so the
//! adapter crates and the engine can share it freely.

pub mod config;
pub mod error;
pub mod fingerprint;
pub mod models;

// Re-export main types
pub use config::{AppConfig, CacheSettings, ExtractionSettings, ProviderSettings, RuntimeSettings};
pub use error::{JobError, PipelineError, PipelineResult, Stage};
pub use fingerprint::Fingerprint;
pub use models::{
    Analysis, CaseType, Document, ExtractionResult, MediaType, Priority, TestCase, TestCategory,
    TestPoint, TestStep, TestSuite,
};
