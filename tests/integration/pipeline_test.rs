//! Pipeline Orchestrator Integration Tests
//!
//! Job lifecycle properties with scripted collaborators: single-flight per
//! fingerprint, the concurrency ceiling, cache idempotence, retry
//! exhaustion, resumption from cached partial progress, and cancellation.

use std::sync::atomic::Ordering;
use std::time::Duration;

use excellentcase::core::{MediaType, PipelineError};
use excellentcase::scheduler::JobState;

use crate::common::{pdf, HarnessBuilder};

#[tokio::test]
async fn test_single_flight_one_call_per_stage() {
    let h = HarnessBuilder::new()
        .engine_delay(Duration::from_millis(50))
        .max_jobs(5)
        .build();

    let mut handles: Vec<_> = (0..5)
        .map(|_| h.pipeline.submit(pdf(b"shared doc"), MediaType::Pdf).unwrap())
        .collect();
    for handle in &mut handles {
        assert!(matches!(handle.wait().await, JobState::Completed(_)));
    }

    assert_eq!(h.engine.calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.provider.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_concurrency_ceiling_respected() {
    let h = HarnessBuilder::new()
        .engine_delay(Duration::from_millis(60))
        .max_jobs(2)
        .build();

    let mut handles: Vec<_> = (0..5)
        .map(|i| {
            h.pipeline
                .submit(pdf(format!("doc {}", i).as_bytes()), MediaType::Pdf)
                .unwrap()
        })
        .collect();
    for handle in &mut handles {
        assert!(matches!(handle.wait().await, JobState::Completed(_)));
    }

    assert!(
        h.engine.max_concurrent.load(Ordering::SeqCst) <= 2,
        "no more than two jobs may extract at once"
    );
    assert_eq!(h.engine.calls.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn test_repeat_submission_is_idempotent() {
    let h = HarnessBuilder::new().build();

    let mut first = h.pipeline.submit(pdf(b"doc"), MediaType::Pdf).unwrap();
    let JobState::Completed(suite_a) = first.wait().await else {
        panic!("expected completion");
    };

    let mut second = h.pipeline.submit(pdf(b"doc"), MediaType::Pdf).unwrap();
    let JobState::Completed(suite_b) = second.wait().await else {
        panic!("expected completion");
    };

    assert_eq!(h.engine.calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.provider.calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        serde_json::to_string(&*suite_a).unwrap(),
        serde_json::to_string(&*suite_b).unwrap(),
        "cached replay must match the original result"
    );
}

#[tokio::test]
async fn test_retry_exhaustion_reports_analysis_failure() {
    let h = HarnessBuilder::new().retry_budget(1).fail_first(100).build();

    let mut handle = h.pipeline.submit(pdf(b"doc"), MediaType::Pdf).unwrap();
    let JobState::Failed(err) = handle.wait().await else {
        panic!("expected failure");
    };
    assert_eq!(err.kind, "analysis_failed");
    assert_eq!(err.stage.map(|s| s.to_string()).as_deref(), Some("analysis"));
    // Initial attempt plus one retry.
    assert_eq!(h.provider.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_resubmission_resumes_after_partial_failure() {
    // The first analysis attempt fails with the retry budget spent; the
    // extraction result is already cached by then.
    let h = HarnessBuilder::new().retry_budget(0).fail_first(1).build();

    let mut first = h.pipeline.submit(pdf(b"doc"), MediaType::Pdf).unwrap();
    assert!(matches!(first.wait().await, JobState::Failed(_)));
    assert_eq!(h.engine.calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.extraction_store.len(), 1, "partial progress is cached");

    let mut second = h.pipeline.submit(pdf(b"doc"), MediaType::Pdf).unwrap();
    assert!(matches!(second.wait().await, JobState::Completed(_)));

    assert_eq!(
        h.engine.calls.load(Ordering::SeqCst),
        1,
        "resubmission must reuse the cached extraction"
    );
    assert_eq!(h.provider.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_cancellation_between_stages() {
    let h = HarnessBuilder::new()
        .engine_delay(Duration::from_millis(200))
        .build();

    let mut handle = h.pipeline.submit(pdf(b"doc"), MediaType::Pdf).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    handle.cancel();

    assert!(matches!(handle.wait().await, JobState::Cancelled));
    assert_eq!(
        h.provider.calls.load(Ordering::SeqCst),
        0,
        "analysis must not start after cancellation"
    );
    // The in-flight extraction ran to completion and its result was kept.
    assert_eq!(h.extraction_store.len(), 1);
}

#[tokio::test]
async fn test_memory_pressure_refuses_submission() {
    let h = HarnessBuilder::new().memory_limit_mb(0).build();

    let err = h.pipeline.submit(pdf(b"doc"), MediaType::Pdf).unwrap_err();
    assert!(matches!(err, PipelineError::MemoryPressure(_)));
}

#[tokio::test]
async fn test_mismatched_media_type_rejected() {
    let h = HarnessBuilder::new().build();
    let err = h.pipeline.submit(pdf(b"doc"), MediaType::Png).unwrap_err();
    assert!(matches!(err, PipelineError::UnsupportedMediaType(_)));
}
