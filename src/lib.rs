//! ExcellentCase
//!
//! Pipeline orchestration engine that turns scanned requirement documents
//! into structured test cases: fingerprint the document, extract text via
//! the configured recognition engines, derive test points through an AI
//! provider, and deterministically expand them into a test suite. Both
//! external stages are cached by content fingerprint with TTL and LRU
//! eviction, bounded concurrency, and single-flight deduplication.
//!
//! The library installs no tracing subscriber and owns no global state; the
//! host constructs an [`Engine`](runtime::Engine) and tears it down with
//! `shutdown()`.

pub mod cache;
pub mod generator;
pub mod memory;
pub mod pipeline;
pub mod runtime;
pub mod scheduler;

// Re-export main types
pub use cache::CacheStore;
pub use generator::TestCaseGenerator;
pub use memory::MemoryMonitor;
pub use pipeline::Pipeline;
pub use runtime::Engine;
pub use scheduler::{JobHandle, JobState, WorkerPool};

// Workspace crates, re-exported so hosts depend on one crate.
pub use excellentcase_core as core;
pub use excellentcase_llm as llm;
pub use excellentcase_ocr as ocr;
