//! Orchestration engine configuration.

use std::time::Duration;

use anyhow::{Result as AnyhowResult, anyhow};
use clap::Args;
use distill_core::engine::{DEFAULT_BUDGET, EngineConfig, MapFailurePolicy, OversizedPolicy};
use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET_CONFIG;

/// Engine configuration.
///
/// # Environment Variables
///
/// - `DISTILL_BUDGET` - Token budget per model call (default: 100000)
/// - `DISTILL_CONCURRENCY` - Maximum concurrent model calls (default: 8)
/// - `DISTILL_MAP_FAILURE_POLICY` - `strict` or `skip` (default: strict)
/// - `DISTILL_OVERSIZED_POLICY` - `fail` or `accept` (default: fail)
#[derive(Debug, Clone, Args, Serialize, Deserialize)]
#[must_use = "config does nothing unless you use it"]
pub struct EngineArgs {
    /// Maximum estimated tokens sent to the model in one call.
    #[arg(short = 'b', long, env = "DISTILL_BUDGET", default_value_t = DEFAULT_BUDGET)]
    pub budget: u64,

    /// Maximum number of simultaneous model calls.
    #[arg(long, env = "DISTILL_CONCURRENCY", default_value_t = 8)]
    pub concurrency: usize,

    /// Timeout in seconds for a single model call attempt.
    #[arg(long, env = "DISTILL_CALL_TIMEOUT", default_value_t = 120)]
    pub call_timeout: u64,

    /// Deadline in seconds for the whole run.
    #[arg(long, env = "DISTILL_RUN_TIMEOUT", default_value_t = 3600)]
    pub run_timeout: u64,

    /// Maximum number of collapse rounds.
    #[arg(long, env = "DISTILL_MAX_ROUNDS", default_value_t = 16)]
    pub max_rounds: u32,

    /// Total attempts per model call for transient failures.
    #[arg(long, env = "DISTILL_RETRY_ATTEMPTS", default_value_t = 3)]
    pub retry_attempts: u32,

    /// Base delay in milliseconds between attempts, doubled after each retry.
    #[arg(long, env = "DISTILL_RETRY_DELAY_MS", default_value_t = 1000)]
    pub retry_delay_ms: u64,

    /// What to do when a chunk cannot be extracted: `strict` or `skip`.
    #[arg(long, env = "DISTILL_MAP_FAILURE_POLICY", default_value = "strict")]
    pub map_failure_policy: MapFailurePolicy,

    /// What to do with an item that stays over budget: `fail` or `accept`.
    #[arg(long, env = "DISTILL_OVERSIZED_POLICY", default_value = "fail")]
    pub oversized_policy: OversizedPolicy,
}

impl EngineArgs {
    /// Builds the engine configuration, rejecting out-of-range values.
    pub fn to_config(&self) -> AnyhowResult<EngineConfig> {
        EngineConfig::builder()
            .budget(self.budget)
            .max_concurrency(self.concurrency)
            .call_timeout(Duration::from_secs(self.call_timeout))
            .run_timeout(Duration::from_secs(self.run_timeout))
            .max_rounds(self.max_rounds)
            .retry_attempts(self.retry_attempts)
            .retry_delay(Duration::from_millis(self.retry_delay_ms))
            .map_failure_policy(self.map_failure_policy)
            .oversized_policy(self.oversized_policy)
            .build()
            .map_err(|e| anyhow!("Invalid engine configuration: {e}"))
    }

    /// Logs engine configuration.
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            budget = self.budget,
            concurrency = self.concurrency,
            call_timeout_secs = self.call_timeout,
            run_timeout_secs = self.run_timeout,
            max_rounds = self.max_rounds,
            retry_attempts = self.retry_attempts,
            map_failure_policy = %self.map_failure_policy,
            oversized_policy = %self.oversized_policy,
            "Engine configuration"
        );
    }
}
