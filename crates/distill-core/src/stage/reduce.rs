//! Final reduce stage.

use tokio::sync::Semaphore;

use crate::Result;
use crate::model::{LanguageModel, ModelService};
use crate::types::{FlashcardSet, WorkingSet};

/// Reduces the converged working set into flashcards.
#[derive(Debug, Clone)]
pub struct FinalReducer {
    model: ModelService,
}

impl FinalReducer {
    /// Creates a new reducer.
    pub fn new(model: ModelService) -> Self {
        Self { model }
    }

    /// Produces the flashcard set for the working set.
    #[tracing::instrument(skip_all, fields(items = working_set.len()))]
    pub async fn reduce(
        &self,
        working_set: &WorkingSet,
        permits: &Semaphore,
    ) -> Result<FlashcardSet> {
        let flashcards = self
            .model
            .bounded(permits)
            .reduce_to_flashcards(working_set.items())
            .await?;
        tracing::debug!(cards = flashcards.len(), "reduce completed");
        Ok(flashcards)
    }
}
