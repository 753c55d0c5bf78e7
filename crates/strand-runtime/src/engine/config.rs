//! Engine configuration.

use derive_builder::Builder;
use strand_services::RetryPolicy;

/// Configuration for the workflow execution engine.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct EngineConfig {
    /// Maximum number of concurrently executing runs.
    ///
    /// Bounds runs, never intra-run fan-out: all ready nodes within one
    /// scheduler batch always execute in parallel.
    #[builder(default = "10")]
    pub max_concurrent_runs: usize,

    /// Retry policy applied around LLM completion calls.
    #[builder(default = "RetryPolicy::completion()")]
    pub completion_retry: RetryPolicy,

    /// Retry policy applied around media transform calls.
    #[builder(default = "RetryPolicy::transform()")]
    pub transform_retry: RetryPolicy,
}

impl EngineConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(max) = self.max_concurrent_runs {
            if max == 0 {
                return Err("max_concurrent_runs must be at least 1".into());
            }
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_runs: 10,
            completion_retry: RetryPolicy::completion(),
            transform_retry: RetryPolicy::transform(),
        }
    }
}

impl EngineConfig {
    /// Returns a builder for the configuration.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }
}
