//! Runtime Engine
//!
//! Explicitly owned runtime context: the two cache stores, the memory
//! monitor, the pipeline, and the background maintenance task. Constructed
//! once at startup and torn down with `shutdown()`; no ambient globals.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use excellentcase_core::config::AppConfig;
use excellentcase_core::{
    Analysis, ExtractionResult, MediaType, PipelineError, PipelineResult,
};
use excellentcase_llm::{build_provider, ChatProvider, ProviderConfig, TestPointAnalyzer};
use excellentcase_ocr::{ExtractionAdapter, TextEngine};
use tokio_util::sync::CancellationToken;

use crate::cache::CacheStore;
use crate::memory::MemoryMonitor;
use crate::pipeline::Pipeline;
use crate::scheduler::JobHandle;

/// The process-wide pipeline runtime.
pub struct Engine {
    pipeline: Arc<Pipeline>,
    extraction_store: Arc<CacheStore<ExtractionResult>>,
    analysis_store: Arc<CacheStore<Analysis>>,
    shutdown: CancellationToken,
    maintenance: tokio::task::JoinHandle<()>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine").finish_non_exhaustive()
    }
}

impl Engine {
    /// Build the runtime from configuration, constructing the AI provider
    /// the configuration selects.
    pub fn new(config: AppConfig, engines: Vec<Arc<dyn TextEngine>>) -> PipelineResult<Self> {
        config.validate()?;
        let provider = build_provider(ProviderConfig::from_settings(&config.provider)?)?;
        Self::with_provider(config, engines, provider)
    }

    /// Build the runtime around an externally constructed provider.
    pub fn with_provider(
        config: AppConfig,
        engines: Vec<Arc<dyn TextEngine>>,
        provider: Arc<dyn ChatProvider>,
    ) -> PipelineResult<Self> {
        config.validate()?;
        let cache_root = cache_root(&config)?;

        let extraction_store = Arc::new(CacheStore::open(
            &cache_root,
            "extraction",
            Duration::from_secs(config.cache.extraction_ttl_secs),
            config.cache.max_entries as usize,
        )?);
        let analysis_store = Arc::new(CacheStore::open(
            &cache_root,
            "analysis",
            Duration::from_secs(config.cache.analysis_ttl_secs),
            config.cache.max_entries as usize,
        )?);
        let monitor = Arc::new(MemoryMonitor::new(config.runtime.memory_limit_mb));

        let adapter = ExtractionAdapter::new(
            enabled_engines(&config, engines),
            config.extraction.divergence_threshold,
            Duration::from_secs(config.extraction.timeout_secs),
        );
        // Margin over the provider's own HTTP timeout so the transport
        // deadline fires first.
        let analyzer = TestPointAnalyzer::new(
            provider,
            Duration::from_secs(config.provider.timeout_secs + 5),
        );

        let pipeline = Arc::new(Pipeline::new(
            &config,
            adapter,
            analyzer,
            extraction_store.clone(),
            analysis_store.clone(),
            monitor.clone(),
        ));

        let shutdown = CancellationToken::new();
        let maintenance = spawn_maintenance(
            extraction_store.clone(),
            analysis_store.clone(),
            monitor,
            Duration::from_secs(config.runtime.sweep_interval_secs),
            shutdown.clone(),
        );

        tracing::info!(cache_root = %cache_root.display(), "engine started");
        Ok(Self {
            pipeline,
            extraction_store,
            analysis_store,
            shutdown,
            maintenance,
        })
    }

    /// Submit a document for processing.
    pub fn submit(&self, bytes: Vec<u8>, media_type: MediaType) -> PipelineResult<JobHandle> {
        self.pipeline.submit(bytes, media_type)
    }

    /// Entry counts of the extraction and analysis stores.
    pub fn cache_sizes(&self) -> (usize, usize) {
        (self.extraction_store.len(), self.analysis_store.len())
    }

    /// Sweep both stores immediately.
    pub fn sweep_caches(&self) -> usize {
        self.extraction_store.sweep() + self.analysis_store.sweep()
    }

    /// Stop the maintenance task and release the runtime. Running jobs are
    /// not interrupted; their handles stay valid until they finish.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        let _ = self.maintenance.await;
        tracing::info!("engine stopped");
    }
}

fn cache_root(config: &AppConfig) -> PipelineResult<PathBuf> {
    match &config.cache.dir {
        Some(dir) => Ok(dir.clone()),
        None => dirs::cache_dir()
            .map(|d| d.join("excellentcase"))
            .ok_or_else(|| {
                PipelineError::config("no cache directory configured and no user cache dir found")
            }),
    }
}

/// Apply the engine enablement flags to the injected engine list. The first
/// engine is the primary, the second the secondary.
fn enabled_engines(
    config: &AppConfig,
    engines: Vec<Arc<dyn TextEngine>>,
) -> Vec<Arc<dyn TextEngine>> {
    engines
        .into_iter()
        .enumerate()
        .filter(|(i, _)| match i {
            0 => config.extraction.primary_enabled,
            1 => config.extraction.secondary_enabled,
            _ => true,
        })
        .map(|(_, e)| e)
        .collect()
}

fn spawn_maintenance(
    extraction_store: Arc<CacheStore<ExtractionResult>>,
    analysis_store: Arc<CacheStore<Analysis>>,
    monitor: Arc<MemoryMonitor>,
    interval: Duration,
    shutdown: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick fires immediately; skip it so startup is quiet.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.cancelled() => break,
            }
            let removed = extraction_store.sweep() + analysis_store.sweep();
            if monitor.over_ceiling() {
                tracing::warn!(removed, "maintenance sweep ran under memory pressure");
            }
        }
    })
}
