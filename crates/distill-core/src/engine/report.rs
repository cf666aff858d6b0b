//! Result of a successful run.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::FlashcardSet;

/// Statistics collected over one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    /// Unique identifier of the run, also recorded on its tracing span.
    pub run_id: Uuid,
    /// Number of input chunks.
    pub chunks: usize,
    /// Indices of chunks dropped under the skip policy.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_chunks: Vec<usize>,
    /// Collapse rounds executed.
    pub rounds: u32,
    /// Model calls that completed successfully, retries not counted.
    pub model_calls: usize,
    /// Size of the working set handed to the final reduce.
    pub final_items: usize,
    /// Total weight of the working set handed to the final reduce.
    pub final_weight: u64,
    /// True if an oversized item was accepted instead of failing the run.
    pub oversized_accepted: bool,
    /// When the run started.
    pub started_at: Timestamp,
    /// When the run finished.
    pub finished_at: Timestamp,
}

/// Flashcards produced by a run together with its statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Distillation {
    /// The terminal artifact.
    pub flashcards: FlashcardSet,
    /// Run statistics.
    pub stats: RunStats,
}

impl Distillation {
    /// Returns the flashcards.
    pub fn flashcards(&self) -> &FlashcardSet {
        &self.flashcards
    }

    /// Returns the run statistics.
    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Consumes the result and returns the flashcards.
    pub fn into_flashcards(self) -> FlashcardSet {
        self.flashcards
    }
}
