//! Integration Tests Module
//!
//! End-to-end tests for the document-to-test-case pipeline. All external
//! dependencies (recognition engines, AI providers) are scripted in-process;
//! no network calls are made.

// Shared fixtures: scripted engines, scripted providers, pipeline harness
mod common;

// Cache store TTL, LRU, persistence, and corruption recovery
mod cache_test;

// Job lifecycle, single-flight, concurrency ceiling, retries, cancellation
mod pipeline_test;

// Full document-to-suite flow through the runtime engine
mod end_to_end_test;
