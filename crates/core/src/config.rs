//! Configuration
//!
//! Typed configuration for the pipeline engine: AI provider settings,
//! extraction engine enablement, cache TTLs, and runtime limits. Values are
//! validated against the documented ranges; a TOML file can populate the
//! whole structure.

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_temperature() -> f32 {
    0.7
}

fn default_timeout_secs() -> u64 {
    30
}

/// AI provider settings. Pass-through configuration for the analysis stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProviderSettings {
    /// Provider identity: openai, qwen, deepseek, or custom.
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub api_key: String,
    /// Base URL override. Required for the custom provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_key: String::new(),
            base_url: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_languages() -> Vec<String> {
    vec!["ch_sim".to_string(), "en".to_string()]
}

fn default_max_document_mb() -> u64 {
    50
}

fn default_divergence_threshold() -> f64 {
    0.5
}

/// Extraction stage settings. Which engines run is configuration, not
/// adapter logic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ExtractionSettings {
    #[serde(default = "default_true")]
    pub primary_enabled: bool,
    #[serde(default = "default_true")]
    pub secondary_enabled: bool,
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    #[serde(default = "default_max_document_mb")]
    pub max_document_mb: u64,
    /// Bag-of-tokens similarity below which two engine outputs are
    /// considered materially different and the primary engine wins.
    #[serde(default = "default_divergence_threshold")]
    pub divergence_threshold: f64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            primary_enabled: true,
            secondary_enabled: true,
            languages: default_languages(),
            max_document_mb: default_max_document_mb(),
            divergence_threshold: default_divergence_threshold(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ExtractionSettings {
    pub fn max_document_bytes(&self) -> u64 {
        self.max_document_mb * 1024 * 1024
    }
}

fn default_extraction_ttl_secs() -> u64 {
    7 * 24 * 60 * 60
}

fn default_analysis_ttl_secs() -> u64 {
    24 * 60 * 60
}

fn default_max_entries() -> u64 {
    1024
}

/// Cache store settings. The extraction and analysis stores are
/// parameterized independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CacheSettings {
    /// Cache directory root. Defaults to a per-user data directory when
    /// unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<std::path::PathBuf>,
    #[serde(default = "default_extraction_ttl_secs")]
    pub extraction_ttl_secs: u64,
    #[serde(default = "default_analysis_ttl_secs")]
    pub analysis_ttl_secs: u64,
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            dir: None,
            extraction_ttl_secs: default_extraction_ttl_secs(),
            analysis_ttl_secs: default_analysis_ttl_secs(),
            max_entries: default_max_entries(),
        }
    }
}

fn default_max_concurrent_jobs() -> usize {
    3
}

fn default_memory_limit_mb() -> u64 {
    1024
}

fn default_sweep_interval_secs() -> u64 {
    30
}

fn default_retry_budget() -> u32 {
    3
}

fn default_retry_base_ms() -> u64 {
    500
}

/// Runtime limits for the worker pool and memory monitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RuntimeSettings {
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,
    #[serde(default = "default_memory_limit_mb")]
    pub memory_limit_mb: u64,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// Retries per retryable stage failure before the job fails.
    #[serde(default = "default_retry_budget")]
    pub retry_budget: u32,
    /// Base backoff delay; doubles per attempt.
    #[serde(default = "default_retry_base_ms")]
    pub retry_base_ms: u64,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: default_max_concurrent_jobs(),
            memory_limit_mb: default_memory_limit_mb(),
            sweep_interval_secs: default_sweep_interval_secs(),
            retry_budget: default_retry_budget(),
            retry_base_ms: default_retry_base_ms(),
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub provider: ProviderSettings,
    #[serde(default)]
    pub extraction: ExtractionSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub runtime: RuntimeSettings,
}

impl AppConfig {
    /// Parse and validate a TOML configuration string.
    pub fn from_toml_str(s: &str) -> PipelineResult<Self> {
        let config: AppConfig = toml::from_str(s)
            .map_err(|e| PipelineError::config(format!("invalid TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all fields against their documented ranges.
    pub fn validate(&self) -> PipelineResult<()> {
        const PROVIDERS: [&str; 4] = ["openai", "qwen", "deepseek", "custom"];
        if !PROVIDERS.contains(&self.provider.provider.as_str()) {
            return Err(PipelineError::config(format!(
                "unsupported provider: {} (supported: {})",
                self.provider.provider,
                PROVIDERS.join(", ")
            )));
        }
        if self.provider.provider == "custom" && self.provider.base_url.is_none() {
            return Err(PipelineError::config(
                "custom provider requires base_url",
            ));
        }
        if !(100..=10_000).contains(&self.provider.max_tokens) {
            return Err(PipelineError::config("max_tokens must be 100-10000"));
        }
        if !(0.0..=2.0).contains(&self.provider.temperature) {
            return Err(PipelineError::config("temperature must be 0.0-2.0"));
        }
        if !self.extraction.primary_enabled && !self.extraction.secondary_enabled {
            return Err(PipelineError::config(
                "at least one extraction engine must be enabled",
            ));
        }
        if !(1..=500).contains(&self.extraction.max_document_mb) {
            return Err(PipelineError::config("max_document_mb must be 1-500"));
        }
        if !(0.0..=1.0).contains(&self.extraction.divergence_threshold) {
            return Err(PipelineError::config(
                "divergence_threshold must be 0.0-1.0",
            ));
        }
        if !(1..=10).contains(&self.runtime.max_concurrent_jobs) {
            return Err(PipelineError::config("max_concurrent_jobs must be 1-10"));
        }
        if !(256..=8192).contains(&self.runtime.memory_limit_mb) {
            return Err(PipelineError::config("memory_limit_mb must be 256-8192"));
        }
        if !(10..=300).contains(&self.runtime.sweep_interval_secs) {
            return Err(PipelineError::config(
                "sweep_interval_secs must be 10-300",
            ));
        }
        if self.runtime.retry_budget > 10 {
            return Err(PipelineError::config("retry_budget must be 0-10"));
        }
        if !(10..=60_000).contains(&self.runtime.retry_base_ms) {
            return Err(PipelineError::config("retry_base_ms must be 10-60000"));
        }
        if self.cache.max_entries == 0 {
            return Err(PipelineError::config("max_entries must be positive"));
        }
        Ok(())
    }
}
