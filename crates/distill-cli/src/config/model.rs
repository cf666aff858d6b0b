//! Language model and prompt configuration.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result as AnyhowResult, anyhow};
use clap::Args;
use distill_core::model::LanguageModel;
use distill_rig::RigModel;
use distill_rig::prompt::{PromptSet, PromptTemplate};
use distill_rig::provider::{
    ApiKeyCredentials, CompletionModel, CompletionProvider, Credentials, ProviderKind,
};
use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET_CONFIG;

/// Model provider and prompt configuration.
///
/// The API key is read from `--api-key` / `DISTILL_API_KEY`, or else from the
/// provider's own variable (`OPENAI_API_KEY`, `ANTHROPIC_API_KEY`,
/// `GEMINI_API_KEY`).
#[derive(Clone, Args, Serialize, Deserialize)]
#[must_use = "config does nothing unless you use it"]
pub struct ModelArgs {
    /// Completion provider.
    #[arg(long, env = "DISTILL_PROVIDER", value_enum, default_value_t = ProviderKind::OpenAi)]
    pub provider: ProviderKind,

    /// Model name; defaults to the provider's default model.
    #[arg(long, env = "DISTILL_MODEL")]
    pub model: Option<String>,

    /// API key for the provider.
    #[arg(long, env = "DISTILL_API_KEY", hide_env_values = true)]
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Sampling temperature.
    #[arg(long, env = "DISTILL_TEMPERATURE", default_value_t = 0.0)]
    pub temperature: f64,

    /// Maximum tokens generated per call.
    #[arg(long, env = "DISTILL_MAX_TOKENS")]
    pub max_tokens: Option<u64>,

    /// JSON file with the extraction prompt (`{"system": ..., "user": ...}`).
    #[arg(short = 'm', long)]
    pub map_prompt: Option<PathBuf>,

    /// JSON file with the collapse prompt; defaults to the extraction prompt.
    #[arg(long)]
    pub collapse_prompt: Option<PathBuf>,

    /// JSON file with the flashcard prompt.
    #[arg(short = 'r', long)]
    pub reduce_prompt: Option<PathBuf>,

    /// Uses the scripted mock model instead of a provider.
    #[cfg(feature = "mock")]
    #[arg(long)]
    #[serde(default)]
    pub mock: bool,
}

impl ModelArgs {
    /// Validates sampling parameters.
    pub fn validate(&self) -> AnyhowResult<()> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(anyhow!(
                "Temperature {} is invalid. Must be between 0 and 2.",
                self.temperature
            ));
        }
        if self.max_tokens == Some(0) {
            return Err(anyhow!("Max tokens must be at least 1."));
        }
        Ok(())
    }

    /// Loads the prompt templates, falling back to the built-in ones.
    pub fn prompts(&self) -> AnyhowResult<PromptSet> {
        let map = load_or(self.map_prompt.as_deref(), PromptTemplate::default_map)?;
        let reduce = load_or(self.reduce_prompt.as_deref(), PromptTemplate::default_reduce)?;

        let prompts = PromptSet::new(map, reduce);
        match self.collapse_prompt.as_deref() {
            Some(path) => Ok(prompts.with_collapse(load(path)?)),
            None => Ok(prompts),
        }
    }

    /// Builds the language model described by this configuration.
    pub fn build_model(&self) -> AnyhowResult<Arc<dyn LanguageModel>> {
        #[cfg(feature = "mock")]
        if self.mock {
            tracing::warn!(target: TRACING_TARGET_CONFIG, "Using the scripted mock model");
            return Ok(Arc::new(distill_core::mock::MockModel::new()));
        }

        let model = CompletionModel::resolve(self.provider, self.model.as_deref())?;
        let api_key = self.api_key().ok_or_else(|| {
            anyhow!(
                "No API key for {}: pass --api-key or set {}",
                self.provider,
                self.provider.api_key_env()
            )
        })?;

        let key = ApiKeyCredentials::new(api_key);
        let credentials = match self.provider {
            ProviderKind::OpenAi => Credentials::OpenAi(key),
            ProviderKind::Anthropic => Credentials::Anthropic(key),
            ProviderKind::Gemini => Credentials::Gemini(key),
        };

        let provider = CompletionProvider::connect(model, credentials)
            .context("failed to connect to the completion provider")?;
        let mut rig_model = RigModel::new(provider, self.prompts()?).with_temperature(self.temperature);
        if let Some(max_tokens) = self.max_tokens {
            rig_model = rig_model.with_max_tokens(max_tokens);
        }

        Ok(Arc::new(rig_model))
    }

    fn api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(self.provider.api_key_env()).ok())
            .filter(|key| !key.trim().is_empty())
    }

    /// Logs model configuration (without the API key).
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            provider = %self.provider,
            model = self.model.as_deref().unwrap_or("default"),
            temperature = self.temperature,
            max_tokens = ?self.max_tokens,
            map_prompt = ?self.map_prompt,
            collapse_prompt = ?self.collapse_prompt,
            reduce_prompt = ?self.reduce_prompt,
            "Model configuration"
        );
    }
}

impl std::fmt::Debug for ModelArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelArgs")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish_non_exhaustive()
    }
}

fn load(path: &Path) -> AnyhowResult<PromptTemplate> {
    PromptTemplate::from_file(path)
        .with_context(|| format!("failed to load prompt from {}", path.display()))
}

fn load_or(path: Option<&Path>, default: fn() -> PromptTemplate) -> AnyhowResult<PromptTemplate> {
    path.map_or_else(|| Ok(default()), load)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn args() -> ModelArgs {
        ModelArgs {
            provider: ProviderKind::OpenAi,
            model: None,
            api_key: None,
            temperature: 0.0,
            max_tokens: None,
            map_prompt: None,
            collapse_prompt: None,
            reduce_prompt: None,
            #[cfg(feature = "mock")]
            mock: false,
        }
    }

    #[test]
    fn test_default_prompts() {
        let prompts = args().prompts().unwrap();
        assert_eq!(prompts, PromptSet::default());
    }

    #[test]
    fn test_prompt_files() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"system": "merge", "user": "Merge: {{text}}"}}"#).unwrap();

        let mut args = args();
        args.collapse_prompt = Some(file.path().to_path_buf());
        let prompts = args.prompts().unwrap();
        assert_eq!(prompts.collapse().system, "merge");
        assert_eq!(prompts.map, PromptTemplate::default_map());
    }

    #[test]
    fn test_missing_prompt_file() {
        let mut args = args();
        args.map_prompt = Some(PathBuf::from("/nonexistent/prompt.json"));
        assert!(args.prompts().is_err());
    }

    #[test]
    fn test_validate_temperature() {
        let mut args = args();
        assert!(args.validate().is_ok());
        args.temperature = 3.5;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_explicit_key_builds_model() {
        let mut args = args();
        args.api_key = Some("sk-test".into());
        assert!(args.build_model().is_ok());
    }
}
