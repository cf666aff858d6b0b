//! Orchestration engine: map, bounded collapse rounds, final reduce.

mod config;
mod convergence;
mod executor;
mod report;
mod splitter;

pub use config::{
    DEFAULT_BUDGET, EngineConfig, EngineConfigBuilder, MapFailurePolicy, OversizedPolicy,
};
pub use convergence::{ConvergenceController, Decision, Measure};
pub use executor::Engine;
pub use report::{Distillation, RunStats};
pub use splitter::{Batch, split_batches};
