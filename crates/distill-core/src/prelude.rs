//! Prelude module for convenient imports.
//!
//! This module re-exports commonly used types for ergonomic imports:
//!
//! ```rust
//! use distill_core::prelude::*;
//! ```

pub use crate::engine::{
    Distillation, Engine, EngineConfig, EngineConfigBuilder, MapFailurePolicy, OversizedPolicy,
    RunStats,
};
pub use crate::error::{Error, ErrorKind, Result, RunError, RunErrorKind, RunResult};
pub use crate::length::{LengthOracle, TokenEstimate, WordCount};
pub use crate::model::{LanguageModel, ModelService};
pub use crate::types::{Chunk, FlashcardSet, Phase, SummaryItem, WorkingSet};
