//! Pipeline Orchestrator
//!
//! Composes fingerprinting, the cache stores, the extraction and analysis
//! adapters, and the generator into one job lifecycle. Stages within a job
//! run sequentially; concurrency across jobs is bounded by the worker pool.
//! Per-fingerprint single-flight guards keep N concurrent submissions of the
//! same document down to one external call per stage.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use excellentcase_core::config::AppConfig;
use excellentcase_core::{
    Analysis, Document, ExtractionResult, Fingerprint, JobError, MediaType, PipelineError,
    PipelineResult, TestSuite,
};
use excellentcase_llm::TestPointAnalyzer;
use excellentcase_ocr::ExtractionAdapter;
use tokio::sync::Mutex;

use crate::cache::CacheStore;
use crate::generator::TestCaseGenerator;
use crate::memory::MemoryMonitor;
use crate::scheduler::{job_channel, JobContext, JobHandle, JobState, WorkerPool};

type FlightMap = DashMap<Fingerprint, Arc<Mutex<()>>>;

/// The job-running engine core. Shared by all jobs; owned by the runtime.
pub struct Pipeline {
    adapter: ExtractionAdapter,
    analyzer: TestPointAnalyzer,
    extraction_store: Arc<CacheStore<ExtractionResult>>,
    analysis_store: Arc<CacheStore<Analysis>>,
    monitor: Arc<MemoryMonitor>,
    pool: WorkerPool,
    extraction_flights: FlightMap,
    analysis_flights: FlightMap,
    max_document_bytes: u64,
    retry_budget: u32,
    retry_base: Duration,
}

impl Pipeline {
    pub fn new(
        config: &AppConfig,
        adapter: ExtractionAdapter,
        analyzer: TestPointAnalyzer,
        extraction_store: Arc<CacheStore<ExtractionResult>>,
        analysis_store: Arc<CacheStore<Analysis>>,
        monitor: Arc<MemoryMonitor>,
    ) -> Self {
        Self {
            adapter,
            analyzer,
            extraction_store,
            analysis_store,
            monitor,
            pool: WorkerPool::new(config.runtime.max_concurrent_jobs),
            extraction_flights: DashMap::new(),
            analysis_flights: DashMap::new(),
            max_document_bytes: config.extraction.max_document_bytes(),
            retry_budget: config.runtime.retry_budget,
            retry_base: Duration::from_millis(config.runtime.retry_base_ms),
        }
    }

    /// Validate and admit a document, returning a handle to the spawned job.
    ///
    /// Size and media-type violations are rejected here, before any job
    /// exists. Under memory pressure both stores are swept first; if the
    /// process is still over its ceiling the submission is refused.
    pub fn submit(
        self: &Arc<Self>,
        bytes: Vec<u8>,
        media_type: MediaType,
    ) -> PipelineResult<JobHandle> {
        let document = Document::new(bytes, media_type, self.max_document_bytes)?;
        let fingerprint = Fingerprint::of_bytes(document.bytes())?;

        if self.monitor.over_ceiling() {
            self.extraction_store.sweep();
            self.analysis_store.sweep();
            if self.monitor.over_ceiling() {
                return Err(PipelineError::MemoryPressure(
                    "memory ceiling exceeded and sweeping freed insufficient headroom"
                        .to_string(),
                ));
            }
        }

        let (handle, ctx) = job_channel();
        tracing::info!(job = %ctx.id, key = %fingerprint, size = document.size(), "job submitted");
        let pipeline = Arc::clone(self);
        tokio::spawn(async move {
            pipeline.run(document, fingerprint, ctx).await;
        });
        Ok(handle)
    }

    async fn run(&self, document: Document, fingerprint: Fingerprint, ctx: JobContext) {
        match self.execute(&document, fingerprint, &ctx).await {
            Ok(suite) => {
                tracing::info!(job = %ctx.id, cases = suite.test_cases.len(), "job completed");
                ctx.transition(JobState::Completed(Arc::new(suite)));
            }
            Err(PipelineError::Cancelled) => {
                tracing::info!(job = %ctx.id, "job cancelled");
                ctx.transition(JobState::Cancelled);
            }
            Err(e) => {
                tracing::warn!(job = %ctx.id, error = %e, "job failed");
                ctx.transition(JobState::Failed(JobError::new(&e)));
            }
        }
    }

    async fn execute(
        &self,
        document: &Document,
        fingerprint: Fingerprint,
        ctx: &JobContext,
    ) -> PipelineResult<TestSuite> {
        let _slot = tokio::select! {
            permit = self.pool.acquire() => permit,
            _ = ctx.cancel.cancelled() => return Err(PipelineError::Cancelled),
        };

        // A valid cached extraction lets the job skip straight to analysis.
        let extraction = match self.extraction_store.get(&fingerprint).await {
            Some(hit) => {
                tracing::debug!(job = %ctx.id, key = %fingerprint, "extraction cache hit");
                hit
            }
            None => {
                ctx.transition(JobState::Extracting);
                self.extract_stage(document, fingerprint, ctx).await?
            }
        };
        if ctx.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        ctx.transition(JobState::Analyzing);
        let analysis = self.analyze_stage(&extraction, ctx).await?;
        if ctx.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        ctx.transition(JobState::Generating);
        TestCaseGenerator::generate(&analysis)
    }

    async fn extract_stage(
        &self,
        document: &Document,
        fingerprint: Fingerprint,
        ctx: &JobContext,
    ) -> PipelineResult<ExtractionResult> {
        let flight = flight_lock(&self.extraction_flights, fingerprint);
        let result = {
            let _leader = flight.lock().await;
            self.extract_locked(document, fingerprint, ctx).await
        };
        // The entry must go away on every exit path, failures included,
        // or the registry grows without bound under flaky engines.
        self.extraction_flights.remove(&fingerprint);
        result
    }

    async fn extract_locked(
        &self,
        document: &Document,
        fingerprint: Fingerprint,
        ctx: &JobContext,
    ) -> PipelineResult<ExtractionResult> {
        // A concurrent duplicate may have landed the entry while this job
        // waited for the flight lock.
        if let Some(hit) = self.extraction_store.get(&fingerprint).await {
            return Ok(hit);
        }
        let result = self
            .retry_stage(ctx, || self.adapter.extract(document, fingerprint))
            .await?;
        self.extraction_store.put(&fingerprint, &result).await?;
        Ok(result)
    }

    async fn analyze_stage(
        &self,
        extraction: &ExtractionResult,
        ctx: &JobContext,
    ) -> PipelineResult<Analysis> {
        let text_fingerprint = Fingerprint::of_text(&extraction.normalized_text)
            .map_err(|_| PipelineError::analysis("extraction produced empty text"))?;

        let flight = flight_lock(&self.analysis_flights, text_fingerprint);
        let analysis = {
            let _leader = flight.lock().await;
            self.analyze_locked(extraction, text_fingerprint, ctx).await
        };
        self.analysis_flights.remove(&text_fingerprint);
        analysis
    }

    async fn analyze_locked(
        &self,
        extraction: &ExtractionResult,
        text_fingerprint: Fingerprint,
        ctx: &JobContext,
    ) -> PipelineResult<Analysis> {
        if let Some(hit) = self.analysis_store.get(&text_fingerprint).await {
            tracing::debug!(job = %ctx.id, key = %text_fingerprint, "analysis cache hit");
            return Ok(hit);
        }
        let analysis = self
            .retry_stage(ctx, || self.analyzer.analyze(&extraction.normalized_text))
            .await?;
        self.analysis_store.put(&text_fingerprint, &analysis).await?;
        Ok(analysis)
    }

    /// Run one stage operation with exponential backoff on retryable errors.
    ///
    /// An in-flight call is never aborted; cancellation is honored between
    /// attempts.
    async fn retry_stage<T, Fut>(
        &self,
        ctx: &JobContext,
        mut op: impl FnMut() -> Fut,
    ) -> PipelineResult<T>
    where
        Fut: Future<Output = PipelineResult<T>>,
    {
        let mut retries = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && retries < self.retry_budget => {
                    retries += 1;
                    let delay = self.retry_base * 2u32.pow(retries - 1);
                    tracing::warn!(
                        job = %ctx.id,
                        error = %e,
                        retry = retries,
                        delay_ms = delay.as_millis() as u64,
                        "stage failed, backing off"
                    );
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = ctx.cancel.cancelled() => return Err(PipelineError::Cancelled),
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn flight_lock(flights: &FlightMap, key: Fingerprint) -> Arc<Mutex<()>> {
    flights
        .entry(key)
        .or_insert_with(|| Arc::new(Mutex::new(())))
        .clone()
}
