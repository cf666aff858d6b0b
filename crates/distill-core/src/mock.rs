//! Scripted mock model for testing.
//!
//! [`MockModel`] is deterministic: extraction echoes its input, collapse keeps
//! the leading half of the joined batch words, and the final reduce turns each
//! item into one card. Failures, latency and non-shrinking collapses can be
//! injected to exercise the orchestrator's error paths.
//!
//! # Feature Flag
//!
//! This module is only available when the `test-utils` feature is enabled:
//!
//! ```toml
//! [dev-dependencies]
//! distill-core = { version = "...", features = ["test-utils"] }
//! ```

use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::model::LanguageModel;
use crate::types::{FlashcardSet, SummaryItem};
use crate::{Error, ErrorKind, Result};

/// How the mock collapses a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CollapseMode {
    /// Keeps the leading half of the joined words (at least one word).
    #[default]
    Halve,
    /// Returns the joined batch unchanged, so an item never shrinks.
    Echo,
}

/// Deterministic, scripted [`LanguageModel`].
#[derive(Debug, Default)]
pub struct MockModel {
    collapse_mode: CollapseMode,
    failing_marker: Option<(String, ErrorKind)>,
    transient_failures: AtomicU32,
    latency: Option<Duration>,
    flashcard_output: Option<String>,

    extract_calls: AtomicUsize,
    collapse_calls: AtomicUsize,
    reduce_calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    collapsed_batches: Mutex<Vec<Vec<String>>>,
}

impl MockModel {
    /// Creates a mock with default behavior.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the collapse behavior.
    pub fn with_collapse_mode(mut self, mode: CollapseMode) -> Self {
        self.collapse_mode = mode;
        self
    }

    /// Makes every extraction of a text containing `marker` fail with `kind`.
    pub fn with_extract_failure(mut self, marker: impl Into<String>, kind: ErrorKind) -> Self {
        self.failing_marker = Some((marker.into(), kind));
        self
    }

    /// Makes the first `count` calls (of any operation) fail transiently.
    pub fn with_transient_failures(self, count: u32) -> Self {
        self.transient_failures.store(count, Ordering::SeqCst);
        self
    }

    /// Delays every call by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Makes the final reduce parse `raw` as if the model had returned it.
    pub fn with_flashcard_output(mut self, raw: impl Into<String>) -> Self {
        self.flashcard_output = Some(raw.into());
        self
    }

    /// Returns the number of extract calls received.
    pub fn extract_calls(&self) -> usize {
        self.extract_calls.load(Ordering::SeqCst)
    }

    /// Returns the number of collapse calls received.
    pub fn collapse_calls(&self) -> usize {
        self.collapse_calls.load(Ordering::SeqCst)
    }

    /// Returns the number of final reduce calls received.
    pub fn reduce_calls(&self) -> usize {
        self.reduce_calls.load(Ordering::SeqCst)
    }

    /// Returns the highest number of calls observed in flight at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Returns the number of calls currently in flight.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Returns the texts of every batch passed to `collapse`, in call order.
    pub fn collapsed_batches(&self) -> Vec<Vec<String>> {
        self.collapsed_batches
            .lock()
            .map(|batches| batches.clone())
            .unwrap_or_default()
    }

    async fn enter(&self, counter: &AtomicUsize) -> Result<InFlight<'_>> {
        counter.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);
        let guard = InFlight(&self.in_flight);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let failed = self
            .transient_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(Error::service_unavailable().with_message("scripted transient failure"));
        }

        Ok(guard)
    }
}

/// Decrements the in-flight counter when a call finishes or is cancelled.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl LanguageModel for MockModel {
    async fn extract(&self, text: &str) -> Result<String> {
        let _guard = self.enter(&self.extract_calls).await?;

        if let Some((marker, kind)) = &self.failing_marker
            && text.contains(marker.as_str())
        {
            return Err(Error::new(*kind).with_message("scripted extraction failure"));
        }

        Ok(text.to_string())
    }

    async fn collapse(&self, items: &[SummaryItem]) -> Result<String> {
        let _guard = self.enter(&self.collapse_calls).await?;

        if let Ok(mut batches) = self.collapsed_batches.lock() {
            batches.push(items.iter().map(|item| item.text.clone()).collect());
        }

        let joined = SummaryItem::join_texts(items);
        match self.collapse_mode {
            CollapseMode::Echo => Ok(joined),
            CollapseMode::Halve => {
                let words: Vec<_> = joined.split_whitespace().collect();
                let keep = words.len().div_ceil(2).max(1).min(words.len());
                Ok(words[..keep].join(" "))
            }
        }
    }

    async fn reduce_to_flashcards(&self, items: &[SummaryItem]) -> Result<FlashcardSet> {
        let _guard = self.enter(&self.reduce_calls).await?;

        if let Some(raw) = &self.flashcard_output {
            return FlashcardSet::from_model_output(raw);
        }

        Ok(items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let answer: Vec<_> = item.text.split_whitespace().take(12).collect();
                (
                    format!("What does part {} cover?", index + 1),
                    answer.join(" "),
                )
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_halving_collapse() {
        let model = MockModel::new();
        let items = vec![SummaryItem::new("a b c"), SummaryItem::new("d e f")];
        assert_eq!(model.collapse(&items).await.unwrap(), "a b c");
        assert_eq!(model.collapsed_batches(), vec![vec!["a b c", "d e f"]]);
    }

    #[tokio::test]
    async fn test_scripted_extract_failure() {
        let model = MockModel::new().with_extract_failure("poison", ErrorKind::NetworkError);
        assert!(model.extract("fine").await.is_ok());
        let error = model.extract("poison pill").await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NetworkError);
        assert_eq!(model.extract_calls(), 2);
    }
}
