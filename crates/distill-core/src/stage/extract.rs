//! Leaf extraction stage.

use tokio::sync::Semaphore;

use crate::Result;
use crate::model::{LanguageModel, ModelService};
use crate::types::{Chunk, SummaryItem};

/// Turns one chunk into its leaf summary.
#[derive(Debug, Clone)]
pub struct LeafExtractor {
    model: ModelService,
}

impl LeafExtractor {
    /// Creates a new extractor.
    pub fn new(model: ModelService) -> Self {
        Self { model }
    }

    /// Extracts the key concepts of a chunk, holding a permit per attempt.
    #[tracing::instrument(skip_all, fields(chunk = chunk.index(), chunk_len = chunk.text().len()))]
    pub async fn extract(&self, chunk: &Chunk, permits: &Semaphore) -> Result<SummaryItem> {
        let text = self.model.bounded(permits).extract(chunk.text()).await?;
        tracing::debug!(summary_len = text.len(), "extract completed");
        Ok(SummaryItem::leaf(chunk, text))
    }
}
