//! Completion provider abstraction.

use std::sync::Arc;

use rig::completion::{AssistantContent, CompletionError, CompletionModel as RigCompletionModel};
use rig::one_or_many::OneOrMany;
use rig::prelude::CompletionClient;
use rig::providers::{anthropic, gemini, openai};

use super::credentials::Credentials;
use super::model::CompletionModel;
use crate::prompt::RenderedPrompt;
use crate::{Error, Result};

/// Tracing target for provider calls.
const TRACING_TARGET: &str = "distill_rig::provider";

/// Sampling parameters sent with every request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sampling {
    /// Sampling temperature.
    pub temperature: f64,
    /// Upper bound on generated tokens, if any.
    pub max_tokens: Option<u64>,
}

impl Default for Sampling {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: None,
        }
    }
}

/// Completion provider that wraps the rig completion models of each backend.
///
/// This is a cheaply cloneable wrapper around an `Arc<CompletionService>`.
#[derive(Clone)]
pub struct CompletionProvider(Arc<CompletionService>);

enum CompletionService {
    OpenAi {
        model: openai::CompletionModel,
        model_name: String,
    },
    Anthropic {
        model: anthropic::completion::CompletionModel,
        model_name: String,
    },
    Gemini {
        model: gemini::completion::CompletionModel,
        model_name: String,
    },
}

impl CompletionProvider {
    /// Connects to the provider serving `model`.
    pub fn connect(model: CompletionModel, credentials: Credentials) -> Result<Self> {
        let inner = match (credentials, model) {
            (Credentials::OpenAi(c), CompletionModel::OpenAi(m)) => {
                let client = openai::Client::new(&c.api_key)
                    .map_err(|e| Error::config(format!("openai client: {e}")))?
                    .completions_api();
                CompletionService::OpenAi {
                    model: client.completion_model(m.as_ref()),
                    model_name: m.as_ref().to_string(),
                }
            }
            (Credentials::Anthropic(c), CompletionModel::Anthropic(m)) => {
                let client = anthropic::Client::new(&c.api_key)
                    .map_err(|e| Error::config(format!("anthropic client: {e}")))?;
                CompletionService::Anthropic {
                    model: client.completion_model(m.as_ref()),
                    model_name: m.as_ref().to_string(),
                }
            }
            (Credentials::Gemini(c), CompletionModel::Gemini(m)) => {
                let client = gemini::Client::new(&c.api_key)
                    .map_err(|e| Error::config(format!("gemini client: {e}")))?;
                CompletionService::Gemini {
                    model: client.completion_model(m.as_ref()),
                    model_name: m.as_ref().to_string(),
                }
            }
            _ => return Err(Error::config("mismatched credentials and model provider")),
        };

        let provider = Self(Arc::new(inner));
        tracing::debug!(
            target: TRACING_TARGET,
            provider = provider.provider_name(),
            model = provider.model_name(),
            "Completion provider connected"
        );
        Ok(provider)
    }

    /// Returns the model name.
    pub fn model_name(&self) -> &str {
        match self.0.as_ref() {
            CompletionService::OpenAi { model_name, .. } => model_name,
            CompletionService::Anthropic { model_name, .. } => model_name,
            CompletionService::Gemini { model_name, .. } => model_name,
        }
    }

    /// Returns the provider name.
    pub fn provider_name(&self) -> &'static str {
        match self.0.as_ref() {
            CompletionService::OpenAi { .. } => "openai",
            CompletionService::Anthropic { .. } => "anthropic",
            CompletionService::Gemini { .. } => "gemini",
        }
    }

    /// Sends a system and user prompt and returns the text of the reply.
    pub async fn complete(&self, prompt: &RenderedPrompt, sampling: Sampling) -> Result<String> {
        let result = match self.0.as_ref() {
            CompletionService::OpenAi { model, .. } => send(model, prompt, sampling).await,
            CompletionService::Anthropic { model, .. } => send(model, prompt, sampling).await,
            CompletionService::Gemini { model, .. } => send(model, prompt, sampling).await,
        };

        result.map_err(|e| Error::completion(self.provider_name(), &e))
    }
}

async fn send<M>(
    model: &M,
    prompt: &RenderedPrompt,
    sampling: Sampling,
) -> std::result::Result<String, CompletionError>
where
    M: RigCompletionModel,
{
    let request = model
        .completion_request(prompt.user.as_str())
        .preamble(prompt.system.clone())
        .temperature(sampling.temperature);

    let request = match sampling.max_tokens {
        Some(max_tokens) => request.max_tokens(max_tokens),
        None => request,
    };

    let response = request.send().await?;
    let text = extract_text_content(&response.choice);
    if text.trim().is_empty() {
        return Err(CompletionError::ResponseError(
            "response contained no text".into(),
        ));
    }
    Ok(text)
}

/// Extracts text content from assistant content choices.
fn extract_text_content(choice: &OneOrMany<AssistantContent>) -> String {
    choice
        .iter()
        .filter_map(|content| match content {
            AssistantContent::Text(text) => Some(text.text()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("")
}

impl std::fmt::Debug for CompletionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionProvider")
            .field("provider", &self.provider_name())
            .field("model", &self.model_name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{AnthropicModel, ApiKeyCredentials, OpenAiCompletionModel};

    #[test]
    fn test_connect_reports_model() {
        let provider = CompletionProvider::connect(
            CompletionModel::OpenAi(OpenAiCompletionModel::Gpt4o),
            Credentials::OpenAi(ApiKeyCredentials::new("sk-test")),
        )
        .unwrap();
        assert_eq!(provider.provider_name(), "openai");
        assert_eq!(provider.model_name(), "gpt-4o");
    }

    #[test]
    fn test_mismatched_credentials() {
        let error = CompletionProvider::connect(
            CompletionModel::Anthropic(AnthropicModel::ClaudeSonnet4),
            Credentials::OpenAi(ApiKeyCredentials::new("sk-test")),
        )
        .unwrap_err();
        assert!(matches!(error, Error::Config(_)));
    }
}
