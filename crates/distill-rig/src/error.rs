//! Error types for distill-rig.

use std::fmt;

use distill_core::ErrorKind;
use rig::completion::CompletionError;

/// Result type alias for rig operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during rig operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Provider error (API call failed, rate limited, etc.)
    #[error("provider error: {provider}: {message}")]
    Provider {
        provider: String,
        kind: ErrorKind,
        message: String,
    },

    /// Prompt template error.
    #[error("template error: {0}")]
    Template(String),

    /// Text splitting error.
    #[error("splitting error: {0}")]
    Splitting(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Creates a provider error with an explicit kind.
    pub fn provider(provider: impl fmt::Display, kind: ErrorKind, message: impl fmt::Display) -> Self {
        Self::Provider {
            provider: provider.to_string(),
            kind,
            message: message.to_string(),
        }
    }

    /// Creates a provider error from a failed completion call.
    pub fn completion(provider: impl fmt::Display, error: &CompletionError) -> Self {
        Self::provider(provider, classify(error), error)
    }

    /// Creates a template error.
    pub fn template(message: impl fmt::Display) -> Self {
        Self::Template(message.to_string())
    }

    /// Creates a splitting error.
    pub fn splitting(message: impl fmt::Display) -> Self {
        Self::Splitting(message.to_string())
    }

    /// Creates a configuration error.
    pub fn config(message: impl fmt::Display) -> Self {
        Self::Config(message.to_string())
    }

    /// Returns the matching call-level error kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Provider { kind, .. } => *kind,
            Self::Template(_) | Self::Config(_) => ErrorKind::Configuration,
            Self::Splitting(_) => ErrorKind::InvalidInput,
            Self::Serialization(_) => ErrorKind::MalformedResponse,
            Self::Io(_) => ErrorKind::InternalError,
        }
    }

    /// Returns true if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        distill_core::Error::new(self.kind()).is_retryable()
    }
}

impl From<Error> for distill_core::Error {
    fn from(error: Error) -> Self {
        let kind = error.kind();
        distill_core::Error::new(kind)
            .with_message(error.to_string())
            .with_source(error)
    }
}

/// Maps a completion failure onto a call-level error kind.
///
/// Provider errors only carry the upstream message, so status codes and
/// well-known phrases are matched on it.
fn classify(error: &CompletionError) -> ErrorKind {
    match error {
        CompletionError::JsonError(_) | CompletionError::ResponseError(_) => {
            ErrorKind::MalformedResponse
        }
        CompletionError::ProviderError(message) => classify_message(message),
        _ => ErrorKind::NetworkError,
    }
}

fn classify_message(message: &str) -> ErrorKind {
    let message = message.to_ascii_lowercase();
    let mentions = |phrases: &[&str]| phrases.iter().any(|p| message.contains(p));
    // Status codes only count as standalone words, not inside larger numbers.
    let status = |codes: &[&str]| {
        message
            .split(|c: char| !c.is_ascii_alphanumeric())
            .any(|word| codes.contains(&word))
    };

    if status(&["429"]) || mentions(&["rate limit", "rate_limit", "too many requests"]) {
        ErrorKind::RateLimited
    } else if status(&["401", "403"])
        || mentions(&["unauthorized", "invalid api key", "authentication"])
    {
        ErrorKind::Authentication
    } else if status(&["500", "502", "503", "504"]) || mentions(&["overloaded", "unavailable"]) {
        ErrorKind::ServiceUnavailable
    } else {
        ErrorKind::ExternalError
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_provider_messages() {
        assert_eq!(classify_message("HTTP 429: Too Many Requests"), ErrorKind::RateLimited);
        assert_eq!(classify_message("Invalid API key provided"), ErrorKind::Authentication);
        assert_eq!(classify_message("Overloaded"), ErrorKind::ServiceUnavailable);
        assert_eq!(classify_message("context length exceeded"), ErrorKind::ExternalError);
    }

    #[test]
    fn test_status_codes_match_whole_words() {
        assert_eq!(classify_message("status=401"), ErrorKind::Authentication);
        assert_eq!(classify_message("HTTP 502 Bad Gateway"), ErrorKind::ServiceUnavailable);
        assert_eq!(
            classify_message("max_tokens 5000 exceeds the model maximum of 4096"),
            ErrorKind::ExternalError
        );
        assert_eq!(classify_message("request 14290 rejected"), ErrorKind::ExternalError);
    }

    #[test]
    fn test_classify_completion_errors() {
        let error = CompletionError::ResponseError("no choices".into());
        assert_eq!(classify(&error), ErrorKind::MalformedResponse);

        let error = CompletionError::ProviderError("503 service unavailable".into());
        assert_eq!(classify(&error), ErrorKind::ServiceUnavailable);
    }

    #[test]
    fn test_conversion_keeps_kind() {
        let error = Error::provider("openai", ErrorKind::RateLimited, "slow down");
        assert!(error.is_retryable());

        let converted = distill_core::Error::from(error);
        assert_eq!(converted.kind(), ErrorKind::RateLimited);
        assert!(converted.is_retryable());

        let converted = distill_core::Error::from(Error::template("missing {text}"));
        assert_eq!(converted.kind(), ErrorKind::Configuration);
    }
}
