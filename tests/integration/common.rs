//! Shared Test Fixtures
//!
//! Scripted recognition engines and AI providers plus a pipeline harness
//! wired to a temporary cache directory.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use excellentcase::cache::CacheStore;
use excellentcase::core::config::AppConfig;
use excellentcase::core::{Analysis, ExtractionResult, MediaType};
use excellentcase::llm::{ChatProvider, LlmError, TestPointAnalyzer};
use excellentcase::memory::MemoryMonitor;
use excellentcase::ocr::{EngineOutput, EngineResult, ExtractionAdapter, TextEngine};
use excellentcase::pipeline::Pipeline;

/// Canned analysis for a login feature: functional P0, security P1, and a
/// boundary-carrying length constraint.
pub const LOGIN_ANALYSIS_JSON: &str = r#"{
    "featureName": "User Login",
    "testPoints": [
        {"id": "TP_001", "category": "functional", "priority": "P0",
         "description": "Valid credentials log the user in",
         "scenario": "Enter a registered username and password and submit"},
        {"id": "TP_002", "category": "functional", "priority": "P2",
         "description": "Username length is enforced",
         "scenario": "Usernames must be between 3 and 20 characters"},
        {"id": "TP_003", "category": "security", "priority": "P1",
         "description": "Account locks after repeated failures",
         "scenario": "Submit an invalid password 5 times in a row"}
    ]
}"#;

/// Scripted recognition engine that records call and concurrency counts.
pub struct ScriptedEngine {
    pub text: String,
    pub delay: Duration,
    pub calls: Arc<AtomicUsize>,
    pub current: Arc<AtomicUsize>,
    pub max_concurrent: Arc<AtomicUsize>,
}

impl ScriptedEngine {
    pub fn new(text: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            text: text.to_string(),
            delay,
            calls: Arc::new(AtomicUsize::new(0)),
            current: Arc::new(AtomicUsize::new(0)),
            max_concurrent: Arc::new(AtomicUsize::new(0)),
        })
    }
}

#[async_trait]
impl TextEngine for ScriptedEngine {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn recognize(&self, _bytes: &[u8], _media: MediaType) -> EngineResult<EngineOutput> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_concurrent.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.current.fetch_sub(1, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(EngineOutput::new(&self.text, 0.9))
    }
}

/// Scripted provider that fails its first `fail_first` calls with a
/// retryable server error, then returns the canned response.
pub struct ScriptedProvider {
    pub response: String,
    pub fail_first: usize,
    pub calls: Arc<AtomicUsize>,
}

impl ScriptedProvider {
    pub fn new(response: &str, fail_first: usize) -> Arc<Self> {
        Arc::new(Self {
            response: response.to_string(),
            fail_first,
            calls: Arc::new(AtomicUsize::new(0)),
        })
    }
}

#[async_trait]
impl ChatProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn chat(&self, _prompt: &str) -> Result<String, LlmError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n < self.fail_first {
            return Err(LlmError::ServerError {
                message: "scripted transient failure".to_string(),
                status: Some(503),
            });
        }
        Ok(self.response.clone())
    }
}

/// A pipeline wired to scripted collaborators and a temporary cache dir.
pub struct Harness {
    pub pipeline: Arc<Pipeline>,
    pub engine: Arc<ScriptedEngine>,
    pub provider: Arc<ScriptedProvider>,
    pub extraction_store: Arc<CacheStore<ExtractionResult>>,
    pub analysis_store: Arc<CacheStore<Analysis>>,
    _dir: TempDir,
}

pub struct HarnessBuilder {
    config: AppConfig,
    engine_delay: Duration,
    fail_first: usize,
    response: String,
}

impl HarnessBuilder {
    pub fn new() -> Self {
        let mut config = AppConfig::default();
        config.runtime.retry_base_ms = 10;
        Self {
            config,
            engine_delay: Duration::ZERO,
            fail_first: 0,
            response: LOGIN_ANALYSIS_JSON.to_string(),
        }
    }

    pub fn engine_delay(mut self, delay: Duration) -> Self {
        self.engine_delay = delay;
        self
    }

    pub fn fail_first(mut self, n: usize) -> Self {
        self.fail_first = n;
        self
    }

    pub fn retry_budget(mut self, budget: u32) -> Self {
        self.config.runtime.retry_budget = budget;
        self
    }

    pub fn max_jobs(mut self, k: usize) -> Self {
        self.config.runtime.max_concurrent_jobs = k;
        self
    }

    pub fn memory_limit_mb(mut self, mb: u64) -> Self {
        self.config.runtime.memory_limit_mb = mb;
        self
    }

    pub fn build(self) -> Harness {
        let dir = TempDir::new().expect("temp cache dir");
        let engine = ScriptedEngine::new(
            "users log in with a username and password",
            self.engine_delay,
        );
        let provider = ScriptedProvider::new(&self.response, self.fail_first);

        let adapter = ExtractionAdapter::new(
            vec![engine.clone() as Arc<dyn TextEngine>],
            self.config.extraction.divergence_threshold,
            Duration::from_secs(5),
        );
        let analyzer = TestPointAnalyzer::new(
            provider.clone() as Arc<dyn ChatProvider>,
            Duration::from_secs(5),
        );
        let extraction_store = Arc::new(
            CacheStore::open(dir.path(), "extraction", Duration::from_secs(3600), 64)
                .expect("extraction store"),
        );
        let analysis_store = Arc::new(
            CacheStore::open(dir.path(), "analysis", Duration::from_secs(3600), 64)
                .expect("analysis store"),
        );
        let monitor = Arc::new(MemoryMonitor::new(self.config.runtime.memory_limit_mb));

        let pipeline = Arc::new(Pipeline::new(
            &self.config,
            adapter,
            analyzer,
            extraction_store.clone(),
            analysis_store.clone(),
            monitor,
        ));

        Harness {
            pipeline,
            engine,
            provider,
            extraction_store,
            analysis_store,
            _dir: dir,
        }
    }
}

/// Wrap arbitrary bytes in a minimal PDF header so media sniffing accepts
/// them while keeping every document's fingerprint distinct.
pub fn pdf(body: &[u8]) -> Vec<u8> {
    let mut bytes = b"%PDF-1.7 ".to_vec();
    bytes.extend_from_slice(body);
    bytes
}
