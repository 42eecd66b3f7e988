//! Test Point Analyzer
//!
//! Derives structured test points from normalized requirement text. One
//! provider call per invocation; retry policy belongs to the pipeline
//! orchestrator, which already classifies `AnalysisFailed` as retryable.

use std::sync::Arc;
use std::time::Duration;

use excellentcase_core::{Analysis, PipelineError, PipelineResult};

use crate::parser::parse_analysis;
use crate::provider::ChatProvider;

/// Analyzes requirement text into categorized, prioritized test points.
pub struct TestPointAnalyzer {
    provider: Arc<dyn ChatProvider>,
    timeout: Duration,
}

impl TestPointAnalyzer {
    pub fn new(provider: Arc<dyn ChatProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    /// Run one analysis round trip: prompt, chat, parse, validate.
    pub async fn analyze(&self, text: &str) -> PipelineResult<Analysis> {
        let text = text.trim();
        if text.is_empty() {
            return Err(PipelineError::analysis("requirement text is empty"));
        }

        let prompt = build_prompt(text);
        tracing::debug!(
            provider = self.provider.name(),
            model = self.provider.model(),
            text_len = text.len(),
            "requesting analysis"
        );

        let response = tokio::time::timeout(self.timeout, self.provider.chat(&prompt))
            .await
            .map_err(|_| {
                PipelineError::analysis(format!(
                    "provider call exceeded {:?}",
                    self.timeout
                ))
            })?
            .map_err(|e| PipelineError::analysis(e.to_string()))?;

        let analysis = parse_analysis(&response)?;
        tracing::info!(
            feature = %analysis.feature_name,
            points = analysis.points.len(),
            "analysis complete"
        );
        Ok(analysis)
    }
}

fn build_prompt(text: &str) -> String {
    format!(
        "Analyze the following requirement document and extract test points.\n\
         \n\
         Respond with a single JSON object, no prose, in this shape:\n\
         {{\n\
           \"featureName\": \"<short feature name>\",\n\
           \"testPoints\": [\n\
             {{\n\
               \"id\": \"TP_001\",\n\
               \"category\": \"functional|performance|security|compatibility|usability\",\n\
               \"priority\": \"P0|P1|P2|P3\",\n\
               \"description\": \"<what to verify>\",\n\
               \"scenario\": \"<concrete user scenario>\"\n\
             }}\n\
           ]\n\
         }}\n\
         \n\
         Cover normal flows, invalid inputs, boundary conditions, and error \
         paths. Assign P0 to anything whose failure blocks the core flow.\n\
         \n\
         Requirement document:\n\
         {}",
        text
    )
}
