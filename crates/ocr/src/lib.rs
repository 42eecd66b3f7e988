//! ExcellentCase OCR
//!
//! The extraction side of the pipeline: a uniform contract for external text
//! recognition engines, a pure reconciliation function for dual-engine
//! output, and the adapter that drives the enabled engines for one document.
//!
//! The engines themselves (PaddleOCR, Tesseract, hosted OCR APIs, ...) are
//! black boxes injected by the host application; this crate never decodes
//! document bytes itself.

pub mod adapter;
pub mod engine;
pub mod reconcile;

// Re-export main types
pub use adapter::ExtractionAdapter;
pub use engine::{EngineError, EngineOutput, EngineResult, TextEngine};
pub use reconcile::reconcile;
