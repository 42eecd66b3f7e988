//! Extraction Adapter
//!
//! Drives the enabled engines for one document and reconciles their outputs
//! into a single `ExtractionResult`. Engines run sequentially: a job holds at
//! most one in-flight external call at a time. Fails with `ExtractionFailed`
//! only when every enabled engine failed or produced empty output.

use std::sync::Arc;
use std::time::Duration;

use excellentcase_core::{Document, ExtractionResult, Fingerprint, PipelineError, PipelineResult};

use crate::engine::{EngineOutput, TextEngine};
use crate::reconcile::reconcile;

/// Extraction adapter over zero, one, or two configured engines.
///
/// The first engine is the primary; reconciliation tie-breaks in its favor
/// when outputs materially differ.
pub struct ExtractionAdapter {
    engines: Vec<Arc<dyn TextEngine>>,
    divergence_threshold: f64,
    call_timeout: Duration,
}

impl ExtractionAdapter {
    /// Create an adapter. `engines[0]` is treated as primary.
    pub fn new(
        engines: Vec<Arc<dyn TextEngine>>,
        divergence_threshold: f64,
        call_timeout: Duration,
    ) -> Self {
        Self {
            engines,
            divergence_threshold,
            call_timeout,
        }
    }

    /// Number of configured engines.
    pub fn engine_count(&self) -> usize {
        self.engines.len()
    }

    /// Extract normalized text from a document.
    pub async fn extract(
        &self,
        document: &Document,
        source_fingerprint: Fingerprint,
    ) -> PipelineResult<ExtractionResult> {
        if self.engines.is_empty() {
            return Err(PipelineError::extraction("no extraction engine enabled"));
        }

        let mut outputs: Vec<Option<EngineOutput>> = Vec::with_capacity(self.engines.len());
        let mut confidences: Vec<(String, f32)> = Vec::new();

        for engine in &self.engines {
            let call = engine.recognize(document.bytes(), document.media_type());
            match tokio::time::timeout(self.call_timeout, call).await {
                Ok(Ok(output)) => {
                    tracing::debug!(
                        engine = engine.name(),
                        text_len = output.text.len(),
                        confidence = output.confidence,
                        "engine recognition complete"
                    );
                    if !output.is_empty() {
                        confidences.push((engine.name().to_string(), output.confidence));
                    }
                    outputs.push(Some(output));
                }
                Ok(Err(e)) => {
                    tracing::warn!(engine = engine.name(), error = %e, "engine recognition failed");
                    outputs.push(None);
                }
                Err(_) => {
                    tracing::warn!(
                        engine = engine.name(),
                        timeout = ?self.call_timeout,
                        "engine recognition timed out"
                    );
                    outputs.push(None);
                }
            }
        }

        let primary = outputs.first().and_then(|o| o.as_ref());
        let secondary = outputs.get(1).and_then(|o| o.as_ref());

        let normalized_text = reconcile(primary, secondary, self.divergence_threshold)
            .ok_or_else(|| {
                PipelineError::extraction("all enabled engines failed or returned empty output")
            })?;

        Ok(ExtractionResult {
            source_fingerprint,
            normalized_text,
            engine_confidence: confidences,
        })
    }
}
