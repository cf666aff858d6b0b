//! Collapse stage: one replacement item per batch.

use tokio::sync::Semaphore;

use crate::Result;
use crate::engine::Batch;
use crate::model::{LanguageModel, ModelService};
use crate::types::SummaryItem;

/// Collapses a batch of summary items into exactly one item.
#[derive(Debug, Clone)]
pub struct CollapseReducer {
    model: ModelService,
    budget: u64,
}

impl CollapseReducer {
    /// Creates a new reducer for the given weight budget.
    pub fn new(model: ModelService, budget: u64) -> Self {
        Self { model, budget }
    }

    /// Returns true if the batch has to go through the model.
    ///
    /// A singleton already within budget is passed through unchanged, unless
    /// `compress_singletons` is set: when a round holds only singletons,
    /// batching cannot merge anything and each item must shrink on its own.
    pub fn requires_call(&self, batch: &Batch, compress_singletons: bool) -> bool {
        !batch.is_singleton() || batch.is_oversized(self.budget) || compress_singletons
    }

    /// Sends the batch to the model and builds the replacement item.
    #[tracing::instrument(skip_all, fields(round = round, items = batch.len(), weight = batch.weight()))]
    pub async fn collapse(
        &self,
        batch: &Batch,
        round: u32,
        permits: &Semaphore,
    ) -> Result<SummaryItem> {
        let text = self.model.bounded(permits).collapse(batch.items()).await?;
        tracing::debug!(summary_len = text.len(), "collapse completed");
        Ok(SummaryItem::collapsed(batch.items(), text, round))
    }
}
