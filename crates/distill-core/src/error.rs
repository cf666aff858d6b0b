//! Error types for model calls and orchestration runs.
//!
//! Two layers are distinguished:
//!
//! - [`Error`] describes a single failed operation (a model call, a length
//!   measurement, a parse). Its [`ErrorKind`] decides whether the call site
//!   may retry it.
//! - [`RunError`] describes why a whole run ended in the `Failed` state. It
//!   carries the structured cause: what failed, in which round, and for which
//!   item or chunk.

use std::time::Duration;

use strum::{AsRefStr, Display, IntoStaticStr};
use thiserror::Error as ThisError;

/// Type alias for boxed dynamic errors that can be sent across threads.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for single operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Result type for whole orchestration runs.
pub type RunResult<T> = std::result::Result<T, RunError>;

/// Categories of errors a single operation can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Input validation failed.
    InvalidInput,
    /// Transport-level failure talking to the model endpoint.
    NetworkError,
    /// The endpoint rejected the call because of rate limiting.
    RateLimited,
    /// The endpoint is temporarily unavailable.
    ServiceUnavailable,
    /// The call did not complete within its timeout.
    Timeout,
    /// Credentials were rejected.
    Authentication,
    /// The response could not be parsed into the expected shape.
    MalformedResponse,
    /// Configuration is invalid.
    Configuration,
    /// Non-transient failure reported by the external service.
    ExternalError,
    /// Internal error.
    InternalError,
}

/// A structured error for a single operation.
#[derive(Debug, ThisError)]
#[error("{kind}{}", message.as_ref().map(|m| format!(": {m}")).unwrap_or_default())]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional error message.
    pub message: Option<String>,
    /// Optional source error.
    #[source]
    pub source: Option<BoxedError>,
}

impl Error {
    /// Creates a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            source: None,
        }
    }

    /// Adds a message to this error.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Adds a source error to this error.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Creates a new invalid input error.
    pub fn invalid_input() -> Self {
        Self::new(ErrorKind::InvalidInput)
    }

    /// Creates a new network error.
    pub fn network_error() -> Self {
        Self::new(ErrorKind::NetworkError)
    }

    /// Creates a new rate limited error.
    pub fn rate_limited() -> Self {
        Self::new(ErrorKind::RateLimited)
    }

    /// Creates a new service unavailable error.
    pub fn service_unavailable() -> Self {
        Self::new(ErrorKind::ServiceUnavailable)
    }

    /// Creates a new timeout error.
    pub fn timeout() -> Self {
        Self::new(ErrorKind::Timeout)
    }

    /// Creates a new authentication error.
    pub fn authentication() -> Self {
        Self::new(ErrorKind::Authentication)
    }

    /// Creates a new malformed response error.
    pub fn malformed_response() -> Self {
        Self::new(ErrorKind::MalformedResponse)
    }

    /// Creates a new configuration error.
    pub fn configuration() -> Self {
        Self::new(ErrorKind::Configuration)
    }

    /// Creates a new external error.
    pub fn external_error() -> Self {
        Self::new(ErrorKind::ExternalError)
    }

    /// Creates a new internal error.
    pub fn internal_error() -> Self {
        Self::new(ErrorKind::InternalError)
    }

    /// Returns the error kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error kind as a string.
    pub fn kind_str(&self) -> &'static str {
        self.kind.into()
    }

    /// Returns true if the operation should be retried.
    ///
    /// Only transient conditions qualify. A malformed response is never
    /// retried because sending the same prompt again rarely fixes it.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::NetworkError
                | ErrorKind::RateLimited
                | ErrorKind::ServiceUnavailable
                | ErrorKind::Timeout
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::malformed_response().with_source(error)
    }
}

/// Categories of run failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum RunErrorKind {
    /// The input was rejected before any model call.
    InvalidInput,
    /// A leaf extraction failed.
    Extraction,
    /// A collapse call failed.
    Collapse,
    /// The final reduce call failed.
    FinalReduce,
    /// Measuring the weight of an item failed.
    Measurement,
    /// An item stayed over budget after an attempted collapse.
    OversizedItem,
    /// The working set did not converge under the budget.
    NonConvergence,
    /// The run deadline expired.
    Timeout,
    /// Internal error.
    Internal,
}

/// Structured cause of a failed run.
#[derive(Debug, ThisError)]
pub enum RunError {
    /// The input was rejected before any model call.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Offending chunk index, if a single chunk was at fault.
        index: Option<usize>,
        /// Error message.
        message: String,
    },

    /// Leaf extraction for a chunk failed.
    #[error("extraction of chunk {index} failed: {source}")]
    Extraction {
        /// Index of the chunk in the input sequence.
        index: usize,
        /// Underlying call error.
        #[source]
        source: Error,
    },

    /// Collapsing a batch failed.
    #[error("collapse of batch {batch} in round {round} failed: {source}")]
    Collapse {
        /// Collapse round (1-based).
        round: u32,
        /// Batch index within the round.
        batch: usize,
        /// Underlying call error.
        #[source]
        source: Error,
    },

    /// The final reduce to flashcards failed.
    #[error("final reduce after round {round} failed: {source}")]
    FinalReduce {
        /// Number of collapse rounds executed before the final call.
        round: u32,
        /// Underlying call error.
        #[source]
        source: Error,
    },

    /// Weight measurement failed.
    #[error("weight measurement in round {round} failed: {source}")]
    Measurement {
        /// Round in which the measurement was taken.
        round: u32,
        /// Underlying error.
        #[source]
        source: Error,
    },

    /// An item is still over budget after its singleton batch was collapsed.
    #[error(
        "item {index} still weighs {weight} after collapse in round {round} (budget {budget})"
    )]
    OversizedItem {
        /// Collapse round (1-based).
        round: u32,
        /// Index of the item in the working set.
        index: usize,
        /// Weight after collapse.
        weight: u64,
        /// Configured budget.
        budget: u64,
    },

    /// The working set did not converge under the budget.
    #[error("no convergence after {rounds} rounds: weight {weight} exceeds budget {budget}")]
    NonConvergence {
        /// Rounds executed.
        rounds: u32,
        /// Last observed total weight.
        weight: u64,
        /// Configured budget.
        budget: u64,
    },

    /// The run deadline expired.
    #[error("run timed out after {limit:?}")]
    Timeout {
        /// Configured deadline.
        limit: Duration,
    },

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RunError {
    /// Creates an invalid input error not tied to a single chunk.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            index: None,
            message: message.into(),
        }
    }

    /// Returns the failure category.
    pub fn kind(&self) -> RunErrorKind {
        match self {
            Self::InvalidInput { .. } => RunErrorKind::InvalidInput,
            Self::Extraction { .. } => RunErrorKind::Extraction,
            Self::Collapse { .. } => RunErrorKind::Collapse,
            Self::FinalReduce { .. } => RunErrorKind::FinalReduce,
            Self::Measurement { .. } => RunErrorKind::Measurement,
            Self::OversizedItem { .. } => RunErrorKind::OversizedItem,
            Self::NonConvergence { .. } => RunErrorKind::NonConvergence,
            Self::Timeout { .. } => RunErrorKind::Timeout,
            Self::Internal(_) => RunErrorKind::Internal,
        }
    }

    /// Returns the round the failure is attributed to, if any.
    pub fn round(&self) -> Option<u32> {
        match self {
            Self::Collapse { round, .. }
            | Self::FinalReduce { round, .. }
            | Self::Measurement { round, .. }
            | Self::OversizedItem { round, .. } => Some(*round),
            Self::NonConvergence { rounds, .. } => Some(*rounds),
            _ => None,
        }
    }

    /// Returns the offending chunk, batch or item index, if any.
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::InvalidInput { index, .. } => *index,
            Self::Extraction { index, .. } | Self::OversizedItem { index, .. } => Some(*index),
            Self::Collapse { batch, .. } => Some(*batch),
            _ => None,
        }
    }

    /// Returns the kind of the underlying call error, if the failure came
    /// from a model call or a measurement.
    pub fn source_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Extraction { source, .. }
            | Self::Collapse { source, .. }
            | Self::FinalReduce { source, .. }
            | Self::Measurement { source, .. } => Some(source.kind()),
            _ => None,
        }
    }

    /// Returns true if retrying the whole run may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Extraction { source, .. }
            | Self::Collapse { source, .. }
            | Self::FinalReduce { source, .. }
            | Self::Measurement { source, .. } => source.is_retryable(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = Error::rate_limited().with_message("429 from endpoint");
        assert_eq!(error.to_string(), "rate_limited: 429 from endpoint");
        assert_eq!(Error::timeout().to_string(), "timeout");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(Error::network_error().is_retryable());
        assert!(Error::timeout().is_retryable());
        assert!(!Error::malformed_response().is_retryable());
        assert!(!Error::authentication().is_retryable());
    }

    #[test]
    fn test_run_error_structured_cause() {
        let error = RunError::Extraction {
            index: 2,
            source: Error::service_unavailable(),
        };
        assert_eq!(error.kind(), RunErrorKind::Extraction);
        assert_eq!(error.index(), Some(2));
        assert_eq!(error.round(), None);
        assert_eq!(error.source_kind(), Some(ErrorKind::ServiceUnavailable));
        assert!(error.is_retryable());

        let error = RunError::OversizedItem {
            round: 3,
            index: 0,
            weight: 40,
            budget: 25,
        };
        assert_eq!(error.kind().as_ref(), "oversized_item");
        assert_eq!(error.round(), Some(3));
        assert!(!error.is_retryable());
    }
}
