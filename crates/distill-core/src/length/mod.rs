//! Length oracles: the model-specific size measure checked against the budget.
//!
//! The weight of a batch is always the sum of the weights of its members, so
//! implementations only measure single texts.

mod estimate;

use async_trait::async_trait;
pub use estimate::{TokenEstimate, WordCount};

use crate::Result;
use crate::types::SummaryItem;

/// Measures the weight of text items.
///
/// Implementations must be deterministic for a given configuration. A failed
/// measurement is an error; it is never treated as zero weight.
#[async_trait]
pub trait LengthOracle: Send + Sync {
    /// Returns the weight of a single text.
    async fn weigh(&self, text: &str) -> Result<u64>;

    /// Returns the weight of every item, in order.
    async fn weigh_items(&self, items: &[SummaryItem]) -> Result<Vec<u64>> {
        let mut weights = Vec::with_capacity(items.len());
        for item in items {
            weights.push(self.weigh(&item.text).await?);
        }
        Ok(weights)
    }

    /// Returns the total weight of a batch of items.
    async fn weigh_total(&self, items: &[SummaryItem]) -> Result<u64> {
        Ok(self.weigh_items(items).await?.into_iter().sum())
    }
}
