//! Engine configuration.

use std::time::Duration;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Default weight budget (tokens per model call).
pub const DEFAULT_BUDGET: u64 = 100_000;

/// What to do when some leaf extractions fail permanently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MapFailurePolicy {
    /// Fail the whole run, citing the chunk index.
    #[default]
    Strict,
    /// Continue with the successful subset; skipped chunks are logged and
    /// reported in the run statistics.
    Skip,
}

/// What to do with an item that stays over budget after its own collapse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OversizedPolicy {
    /// Fail the run with the round and item index.
    #[default]
    Fail,
    /// Warn and finalize immediately with the current working set.
    Accept,
}

/// Configuration for the distillation engine.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct EngineConfig {
    /// Maximum total weight sent to the model in one call.
    #[builder(default = "DEFAULT_BUDGET")]
    pub budget: u64,

    /// Maximum number of simultaneous outstanding model calls per run.
    #[builder(default = "8")]
    pub max_concurrency: usize,

    /// Timeout applied to each model call attempt.
    #[builder(default = "Duration::from_secs(120)")]
    pub call_timeout: Duration,

    /// Deadline for the whole run.
    #[builder(default = "Duration::from_secs(3600)")]
    pub run_timeout: Duration,

    /// Maximum number of collapse rounds before the run is declared
    /// non-convergent.
    #[builder(default = "16")]
    pub max_rounds: u32,

    /// Total attempts per model call for transient errors.
    #[builder(default = "3")]
    pub retry_attempts: u32,

    /// Base delay between attempts, doubled after each retry.
    #[builder(default = "Duration::from_secs(1)")]
    pub retry_delay: Duration,

    /// Policy for failed leaf extractions.
    #[builder(default)]
    pub map_failure_policy: MapFailurePolicy,

    /// Policy for items that cannot be collapsed under budget.
    #[builder(default)]
    pub oversized_policy: OversizedPolicy,
}

impl EngineConfig {
    /// Returns a builder for the engine configuration.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }
}

impl EngineConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.budget == Some(0) {
            return Err("budget must be at least 1".into());
        }
        if self.max_concurrency == Some(0) {
            return Err("max_concurrency must be at least 1".into());
        }
        if self.max_rounds == Some(0) {
            return Err("max_rounds must be at least 1".into());
        }
        if self.retry_attempts == Some(0) {
            return Err("retry_attempts must be at least 1".into());
        }
        if self.call_timeout == Some(Duration::ZERO) || self.run_timeout == Some(Duration::ZERO) {
            return Err("timeouts must be non-zero".into());
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            budget: DEFAULT_BUDGET,
            max_concurrency: 8,
            call_timeout: Duration::from_secs(120),
            run_timeout: Duration::from_secs(3600),
            max_rounds: 16,
            retry_attempts: 3,
            retry_delay: Duration::from_secs(1),
            map_failure_policy: MapFailurePolicy::Strict,
            oversized_policy: OversizedPolicy::Fail,
        }
    }
}
