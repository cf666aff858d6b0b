//! Type-safe completion model references.

#[cfg(feature = "config")]
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{Error, Result};

/// Supported completion providers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString)]
#[cfg_attr(feature = "config", derive(ValueEnum))]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI.
    #[default]
    #[cfg_attr(feature = "config", value(name = "openai"))]
    OpenAi,
    /// Anthropic.
    Anthropic,
    /// Google Gemini.
    Gemini,
}

impl ProviderKind {
    /// Returns the environment variable conventionally holding the API key.
    pub fn api_key_env(self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::Gemini => "GEMINI_API_KEY",
        }
    }

    /// Returns the model used when none is configured.
    pub fn default_model(self) -> CompletionModel {
        match self {
            Self::OpenAi => CompletionModel::OpenAi(OpenAiCompletionModel::Gpt4o),
            Self::Anthropic => CompletionModel::Anthropic(AnthropicModel::ClaudeSonnet4),
            Self::Gemini => CompletionModel::Gemini(GeminiCompletionModel::Gemini20Flash),
        }
    }
}

/// Reference to a completion/chat model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "provider", content = "model", rename_all = "snake_case")]
pub enum CompletionModel {
    /// OpenAI completion models.
    OpenAi(OpenAiCompletionModel),
    /// Anthropic models.
    Anthropic(AnthropicModel),
    /// Google Gemini completion models.
    Gemini(GeminiCompletionModel),
}

/// OpenAI completion models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum OpenAiCompletionModel {
    /// GPT-4o (multimodal flagship)
    #[strum(serialize = "gpt-4o")]
    #[serde(rename = "gpt-4o")]
    Gpt4o,
    /// GPT-4o mini (fast, affordable)
    #[strum(serialize = "gpt-4o-mini")]
    #[serde(rename = "gpt-4o-mini")]
    Gpt4oMini,
    /// GPT-4.1 (long context)
    #[strum(serialize = "gpt-4.1")]
    #[serde(rename = "gpt-4.1")]
    Gpt41,
    /// GPT-4.1 mini
    #[strum(serialize = "gpt-4.1-mini")]
    #[serde(rename = "gpt-4.1-mini")]
    Gpt41Mini,
    /// o3 mini (reasoning)
    #[strum(serialize = "o3-mini")]
    #[serde(rename = "o3-mini")]
    O3Mini,
}

/// Anthropic models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum AnthropicModel {
    /// Claude Opus 4 (most capable)
    #[strum(serialize = "claude-opus-4-20250514")]
    #[serde(rename = "claude-opus-4-20250514")]
    ClaudeOpus4,
    /// Claude Sonnet 4 (balanced)
    #[strum(serialize = "claude-sonnet-4-20250514")]
    #[serde(rename = "claude-sonnet-4-20250514")]
    ClaudeSonnet4,
    /// Claude Haiku 3.5 (fast)
    #[strum(serialize = "claude-3-5-haiku-20241022")]
    #[serde(rename = "claude-3-5-haiku-20241022")]
    ClaudeHaiku35,
}

/// Google Gemini completion models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum GeminiCompletionModel {
    /// Gemini 2.0 Flash (fast, multimodal)
    #[strum(serialize = "gemini-2.0-flash")]
    #[serde(rename = "gemini-2.0-flash")]
    Gemini20Flash,
    /// Gemini 1.5 Pro (long context)
    #[strum(serialize = "gemini-1.5-pro")]
    #[serde(rename = "gemini-1.5-pro")]
    Gemini15Pro,
    /// Gemini 1.5 Flash (fast)
    #[strum(serialize = "gemini-1.5-flash")]
    #[serde(rename = "gemini-1.5-flash")]
    Gemini15Flash,
}

impl CompletionModel {
    /// Resolves a model name for a provider, falling back to its default.
    pub fn resolve(provider: ProviderKind, name: Option<&str>) -> Result<Self> {
        let Some(name) = name else {
            return Ok(provider.default_model());
        };

        let unknown = |_| Error::config(format!("unknown {provider} model: {name}"));
        Ok(match provider {
            ProviderKind::OpenAi => Self::OpenAi(name.parse().map_err(unknown)?),
            ProviderKind::Anthropic => Self::Anthropic(name.parse().map_err(unknown)?),
            ProviderKind::Gemini => Self::Gemini(name.parse().map_err(unknown)?),
        })
    }

    /// Returns the provider serving this model.
    pub fn provider(&self) -> ProviderKind {
        match self {
            Self::OpenAi(_) => ProviderKind::OpenAi,
            Self::Anthropic(_) => ProviderKind::Anthropic,
            Self::Gemini(_) => ProviderKind::Gemini,
        }
    }

    /// Returns the model identifier string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::OpenAi(m) => m.as_ref(),
            Self::Anthropic(m) => m.as_ref(),
            Self::Gemini(m) => m.as_ref(),
        }
    }
}
