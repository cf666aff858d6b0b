//! Model wrapper with retry logic, per-call timeouts, and observability.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use distill_core::model::ModelService;
//!
//! let service = ModelService::new(my_model)
//!     .with_retry_policy(3)
//!     .with_retry_delay(Duration::from_secs(1))
//!     .with_timeout(Duration::from_secs(120));
//!
//! let summary = service.extract("chunk text").await?;
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use super::LanguageModel;
use crate::types::{FlashcardSet, SummaryItem};
use crate::{Error, Result};

/// Tracing target for model calls.
const TRACING_TARGET: &str = "distill_core::model";

/// Upper bound for a single backoff sleep.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Model wrapper adding bounded retries with exponential backoff and a
/// per-call timeout to any [`LanguageModel`].
///
/// Only retryable errors (network issues, timeouts, rate limits, unavailable
/// service) are retried. Content errors fail immediately.
///
/// The inner model is wrapped in an `Arc`, making this wrapper cheap to clone.
#[derive(Clone)]
pub struct ModelService {
    inner: Arc<dyn LanguageModel>,
    retry_attempts: u32,
    retry_delay: Duration,
    timeout: Duration,
}

impl ModelService {
    /// Creates a wrapper with default configuration.
    ///
    /// Default configuration:
    /// - 3 attempts
    /// - 1 second base retry delay
    /// - 120 second timeout per call
    pub fn new(inner: impl LanguageModel + 'static) -> Self {
        Self::from_arc(Arc::new(inner))
    }

    /// Creates a wrapper around a shared model.
    pub fn from_arc(inner: Arc<dyn LanguageModel>) -> Self {
        Self {
            inner,
            retry_attempts: 3,
            retry_delay: Duration::from_secs(1),
            timeout: Duration::from_secs(120),
        }
    }

    /// Sets the total number of attempts per call (at least one).
    pub fn with_retry_policy(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts.max(1);
        self
    }

    /// Sets the base delay; attempt `n` waits `delay * 2^(n-1)`.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Sets the timeout applied to each individual attempt.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the number of attempts per call.
    pub fn retry_attempts(&self) -> u32 {
        self.retry_attempts
    }

    /// Returns the per-attempt timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns a view of this service whose attempts each hold a permit
    /// from `permits`.
    ///
    /// The permit is released while the call backs off between attempts.
    pub fn bounded<'a>(&'a self, permits: &'a Semaphore) -> BoundedService<'a> {
        BoundedService {
            service: self,
            permits,
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.retry_delay
            .checked_mul(factor)
            .unwrap_or(MAX_RETRY_DELAY)
            .min(MAX_RETRY_DELAY)
    }

    async fn call<T, F, Fut>(
        &self,
        operation: &'static str,
        permits: Option<&Semaphore>,
        mut request: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            let permit = match permits {
                Some(permits) => Some(permits.acquire().await.map_err(|e| {
                    Error::internal_error().with_message(format!("semaphore closed: {e}"))
                })?),
                None => None,
            };

            let start = Instant::now();
            let outcome = tokio::time::timeout(self.timeout, request()).await;
            drop(permit);

            let error = match outcome {
                Ok(Ok(response)) => {
                    tracing::trace!(
                        target: TRACING_TARGET,
                        operation,
                        attempt,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "model call succeeded"
                    );
                    return Ok(response);
                }
                Ok(Err(error)) => error,
                Err(_) => Error::timeout()
                    .with_message(format!("{operation} exceeded {:?}", self.timeout)),
            };

            if !error.is_retryable() || attempt >= self.retry_attempts {
                tracing::debug!(
                    target: TRACING_TARGET,
                    operation,
                    attempt,
                    error = %error,
                    "model call failed"
                );
                return Err(error);
            }

            let delay = self.backoff(attempt);
            tracing::warn!(
                target: TRACING_TARGET,
                operation,
                attempt,
                max_attempts = self.retry_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "retrying model call"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

#[async_trait]
impl LanguageModel for ModelService {
    async fn extract(&self, text: &str) -> Result<String> {
        self.call("extract", None, || self.inner.extract(text)).await
    }

    async fn collapse(&self, items: &[SummaryItem]) -> Result<String> {
        self.call("collapse", None, || self.inner.collapse(items)).await
    }

    async fn reduce_to_flashcards(&self, items: &[SummaryItem]) -> Result<FlashcardSet> {
        self.call("reduce_to_flashcards", None, || {
            self.inner.reduce_to_flashcards(items)
        })
        .await
    }
}

/// A [`ModelService`] sharing a concurrency limit with other calls.
///
/// Created with [`ModelService::bounded`].
#[derive(Debug, Clone, Copy)]
pub struct BoundedService<'a> {
    service: &'a ModelService,
    permits: &'a Semaphore,
}

#[async_trait]
impl<'a> LanguageModel for BoundedService<'a> {
    async fn extract(&self, text: &str) -> Result<String> {
        let inner = &self.service.inner;
        self.service
            .call("extract", Some(self.permits), || inner.extract(text))
            .await
    }

    async fn collapse(&self, items: &[SummaryItem]) -> Result<String> {
        let inner = &self.service.inner;
        self.service
            .call("collapse", Some(self.permits), || inner.collapse(items))
            .await
    }

    async fn reduce_to_flashcards(&self, items: &[SummaryItem]) -> Result<FlashcardSet> {
        let inner = &self.service.inner;
        self.service
            .call("reduce_to_flashcards", Some(self.permits), || {
                inner.reduce_to_flashcards(items)
            })
            .await
    }
}

impl std::fmt::Debug for ModelService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelService")
            .field("retry_attempts", &self.retry_attempts)
            .field("retry_delay", &self.retry_delay)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::mock::MockModel;

    #[tokio::test]
    async fn test_retries_transient_errors() {
        let model = Arc::new(MockModel::new().with_transient_failures(2));
        let service = ModelService::from_arc(model.clone())
            .with_retry_policy(3)
            .with_retry_delay(Duration::ZERO);

        let summary = service.extract("one two three").await.unwrap();
        assert_eq!(summary, "one two three");
        assert_eq!(model.extract_calls(), 3);
    }

    #[tokio::test]
    async fn test_exhausted_retries_surface_last_error() {
        let model = Arc::new(MockModel::new().with_transient_failures(5));
        let service = ModelService::from_arc(model.clone())
            .with_retry_policy(2)
            .with_retry_delay(Duration::ZERO);

        let error = service.extract("text").await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::ServiceUnavailable);
        assert_eq!(model.extract_calls(), 2);
    }

    #[tokio::test]
    async fn test_content_errors_are_not_retried() {
        let model = Arc::new(MockModel::new().with_flashcard_output("not json"));
        let service = ModelService::from_arc(model.clone()).with_retry_delay(Duration::ZERO);

        let error = service
            .reduce_to_flashcards(&[SummaryItem::new("text")])
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::MalformedResponse);
        assert_eq!(model.reduce_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_per_attempt() {
        let model = Arc::new(MockModel::new().with_latency(Duration::from_secs(10)));
        let service = ModelService::from_arc(model.clone())
            .with_retry_policy(2)
            .with_retry_delay(Duration::ZERO)
            .with_timeout(Duration::from_secs(1));

        let error = service.extract("text").await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Timeout);
        assert_eq!(model.extract_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permit_is_released_while_backing_off() {
        let model = Arc::new(MockModel::new().with_transient_failures(1));
        let service = ModelService::from_arc(model.clone())
            .with_retry_policy(2)
            .with_retry_delay(Duration::from_secs(10));
        let permits = Semaphore::new(1);

        let bounded = service.bounded(&permits);
        let call = bounded.extract("text");
        tokio::pin!(call);

        // The first attempt fails at once; the call is now sleeping.
        let pending = tokio::time::timeout(Duration::from_secs(1), &mut call).await;
        assert!(pending.is_err());
        assert_eq!(permits.available_permits(), 1);
        assert_eq!(model.extract_calls(), 1);

        assert_eq!(call.await.unwrap(), "text");
        assert_eq!(model.extract_calls(), 2);
        assert_eq!(permits.available_permits(), 1);
    }

    #[test]
    fn test_backoff_is_exponential_and_capped() {
        let service = ModelService::new(MockModel::new()).with_retry_delay(Duration::from_secs(1));
        assert_eq!(service.backoff(1), Duration::from_secs(1));
        assert_eq!(service.backoff(3), Duration::from_secs(4));
        assert_eq!(service.backoff(20), MAX_RETRY_DELAY);
    }
}
