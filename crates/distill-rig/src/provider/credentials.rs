//! Credentials for completion providers.

use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

/// API key credentials for AI providers.
#[derive(Clone, Serialize, Deserialize)]
pub struct ApiKeyCredentials {
    /// API key.
    pub api_key: String,
}

impl ApiKeyCredentials {
    /// Creates credentials from an API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }
}

impl std::fmt::Debug for ApiKeyCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyCredentials")
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Credentials for all supported completion providers.
#[derive(Debug, Clone, Serialize, Deserialize, IntoStaticStr)]
#[serde(tag = "provider", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Credentials {
    /// OpenAI credentials.
    OpenAi(ApiKeyCredentials),
    /// Anthropic credentials.
    Anthropic(ApiKeyCredentials),
    /// Google Gemini credentials.
    Gemini(ApiKeyCredentials),
}

impl Credentials {
    /// Returns the provider name as a string.
    pub fn provider(&self) -> &'static str {
        self.into()
    }

    /// Returns the API key.
    pub fn api_key(&self) -> &str {
        match self {
            Self::OpenAi(c) | Self::Anthropic(c) | Self::Gemini(c) => &c.api_key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_key() {
        let credentials = Credentials::OpenAi(ApiKeyCredentials::new("sk-secret"));
        assert!(!format!("{credentials:?}").contains("sk-secret"));
        assert_eq!(credentials.provider(), "open_ai");
        assert_eq!(credentials.api_key(), "sk-secret");
    }
}
