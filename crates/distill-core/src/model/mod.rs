//! The model boundary: the three remote operations the orchestrator relies on.

mod service;

use std::sync::Arc;

use async_trait::async_trait;
pub use service::{BoundedService, ModelService};

use crate::Result;
use crate::types::{FlashcardSet, SummaryItem};

/// A generative text model reachable through three request/response calls.
///
/// Implementations classify their failures with [`ErrorKind`] so callers can
/// tell transient conditions from content errors.
///
/// [`ErrorKind`]: crate::ErrorKind
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Extracts the key concepts of one chunk of source text.
    async fn extract(&self, text: &str) -> Result<String>;

    /// Summarizes an ordered batch of items into one replacement text.
    async fn collapse(&self, items: &[SummaryItem]) -> Result<String>;

    /// Turns the converged working set into question/answer pairs.
    async fn reduce_to_flashcards(&self, items: &[SummaryItem]) -> Result<FlashcardSet>;
}

#[async_trait]
impl<T: LanguageModel + ?Sized> LanguageModel for Arc<T> {
    async fn extract(&self, text: &str) -> Result<String> {
        self.as_ref().extract(text).await
    }

    async fn collapse(&self, items: &[SummaryItem]) -> Result<String> {
        self.as_ref().collapse(items).await
    }

    async fn reduce_to_flashcards(&self, items: &[SummaryItem]) -> Result<FlashcardSet> {
        self.as_ref().reduce_to_flashcards(items).await
    }
}
