//! End-to-End Engine Tests
//!
//! The full flow through the runtime engine: submit a scanned requirement
//! document, let the scripted engine and provider stand in for OCR and the
//! AI service, and check the generated suite. Also covers cache persistence
//! across an engine restart.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use excellentcase::core::config::AppConfig;
use excellentcase::core::{CaseType, MediaType, TestCategory};
use excellentcase::llm::ChatProvider;
use excellentcase::ocr::TextEngine;
use excellentcase::runtime::Engine;
use excellentcase::scheduler::JobState;

use crate::common::{pdf, ScriptedEngine, ScriptedProvider, LOGIN_ANALYSIS_JSON};

fn config(dir: &TempDir) -> AppConfig {
    let mut config = AppConfig::default();
    config.cache.dir = Some(dir.path().to_path_buf());
    config.runtime.retry_base_ms = 10;
    config
}

fn build_engine(dir: &TempDir) -> (Engine, Arc<ScriptedEngine>, Arc<ScriptedProvider>) {
    let ocr = ScriptedEngine::new(
        "login page: username 3 to 20 characters, lockout after 5 failures",
        Duration::ZERO,
    );
    let provider = ScriptedProvider::new(LOGIN_ANALYSIS_JSON, 0);
    let engine = Engine::with_provider(
        config(dir),
        vec![ocr.clone() as Arc<dyn TextEngine>],
        provider.clone() as Arc<dyn ChatProvider>,
    )
    .unwrap();
    (engine, ocr, provider)
}

#[tokio::test]
async fn test_document_to_suite() {
    let dir = TempDir::new().unwrap();
    let (engine, _ocr, _provider) = build_engine(&dir);

    let mut handle = engine
        .submit(pdf(b"login requirements scan"), MediaType::Pdf)
        .unwrap();
    let JobState::Completed(suite) = handle.wait().await else {
        panic!("expected completion");
    };

    assert_eq!(suite.feature_name, "User Login");

    // Every test point contributes a positive case.
    for tp in ["TP_001", "TP_002", "TP_003"] {
        assert!(
            suite
                .test_cases
                .iter()
                .any(|c| c.source_point == tp && c.case_type == CaseType::Positive),
            "missing positive case for {}",
            tp
        );
    }

    // The length constraint point yields a boundary case.
    assert!(suite
        .test_cases
        .iter()
        .any(|c| c.source_point == "TP_002" && c.case_type == CaseType::Boundary));

    // The invalid-password lockout point yields a negative case.
    assert!(suite
        .test_cases
        .iter()
        .any(|c| c.source_point == "TP_003" && c.case_type == CaseType::Negative));

    // The P0 point yields an exceptional case.
    assert!(suite
        .test_cases
        .iter()
        .any(|c| c.source_point == "TP_001" && c.case_type == CaseType::Exceptional));

    // Ids are category-scoped and sequential.
    let func_ids: Vec<&str> = suite
        .test_cases
        .iter()
        .filter(|c| c.category == TestCategory::Functional)
        .map(|c| c.id.as_str())
        .collect();
    assert_eq!(func_ids[0], "TC_FUNC_001");
    assert!(func_ids.iter().all(|id| id.starts_with("TC_FUNC_")));
    assert!(suite
        .test_cases
        .iter()
        .filter(|c| c.category == TestCategory::Security)
        .all(|c| c.id.starts_with("TC_SEC_")));

    // Exported record shape.
    let json = serde_json::to_value(&*suite).unwrap();
    assert_eq!(json["featureName"], "User Login");
    let first = &json["testCases"][0];
    assert!(first["caseType"].is_string());
    assert_eq!(first["steps"][0]["stepNo"], 1);
    assert!(first["expectedResult"].is_string());

    engine.shutdown().await;
}

#[tokio::test]
async fn test_caches_survive_engine_restart() {
    let dir = TempDir::new().unwrap();
    let document = pdf(b"persistent requirements scan");

    let (engine, ocr, provider) = build_engine(&dir);
    let mut handle = engine.submit(document.clone(), MediaType::Pdf).unwrap();
    assert!(matches!(handle.wait().await, JobState::Completed(_)));
    assert_eq!(ocr.calls.load(Ordering::SeqCst), 1);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    engine.shutdown().await;

    // Fresh engine, fresh collaborators, same cache directory.
    let (engine, ocr, provider) = build_engine(&dir);
    assert_eq!(engine.cache_sizes(), (1, 1), "entries reloaded from disk");

    let mut handle = engine.submit(document, MediaType::Pdf).unwrap();
    assert!(matches!(handle.wait().await, JobState::Completed(_)));
    assert_eq!(ocr.calls.load(Ordering::SeqCst), 0, "extraction served from disk");
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0, "analysis served from disk");
    engine.shutdown().await;
}

#[tokio::test]
async fn test_distinct_documents_do_not_share_entries() {
    let dir = TempDir::new().unwrap();
    let (engine, ocr, _provider) = build_engine(&dir);

    let mut a = engine.submit(pdf(b"feature A"), MediaType::Pdf).unwrap();
    let mut b = engine.submit(pdf(b"feature B"), MediaType::Pdf).unwrap();
    assert!(matches!(a.wait().await, JobState::Completed(_)));
    assert!(matches!(b.wait().await, JobState::Completed(_)));

    // Two distinct fingerprints, two extraction entries. The scripted engine
    // emits identical text for both, so analysis deduplicates to one entry.
    assert_eq!(ocr.calls.load(Ordering::SeqCst), 2);
    assert_eq!(engine.cache_sizes().0, 2);
    assert_eq!(engine.cache_sizes().1, 1);

    engine.shutdown().await;
}
