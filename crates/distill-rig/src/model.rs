//! Language model backed by a rig completion provider.

use async_trait::async_trait;
use distill_core::model::LanguageModel;
use distill_core::types::{FlashcardSet, SummaryItem};

use crate::prompt::{PromptSet, PromptTemplate};
use crate::provider::{CompletionProvider, Sampling};

/// Tracing target for model operations.
const TRACING_TARGET: &str = "distill_rig::model";

/// [`LanguageModel`] that renders prompt templates and sends them to a
/// completion provider.
#[derive(Debug, Clone)]
pub struct RigModel {
    provider: CompletionProvider,
    prompts: PromptSet,
    sampling: Sampling,
}

impl RigModel {
    /// Creates a model with the given prompts and deterministic sampling.
    pub fn new(provider: CompletionProvider, prompts: PromptSet) -> Self {
        Self {
            provider,
            prompts,
            sampling: Sampling::default(),
        }
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.sampling.temperature = temperature;
        self
    }

    /// Caps the number of generated tokens per call.
    pub fn with_max_tokens(mut self, max_tokens: u64) -> Self {
        self.sampling.max_tokens = Some(max_tokens);
        self
    }

    /// Returns the underlying provider.
    pub fn provider(&self) -> &CompletionProvider {
        &self.provider
    }

    /// Returns the prompt templates.
    pub fn prompts(&self) -> &PromptSet {
        &self.prompts
    }

    async fn complete(
        &self,
        operation: &'static str,
        template: &PromptTemplate,
        text: &str,
    ) -> distill_core::Result<String> {
        let prompt = template.render(text);
        tracing::trace!(
            target: TRACING_TARGET,
            operation,
            model = self.provider.model_name(),
            prompt_len = prompt.user.len(),
            "sending completion request"
        );

        let reply = self.provider.complete(&prompt, self.sampling).await?;
        tracing::trace!(
            target: TRACING_TARGET,
            operation,
            reply_len = reply.len(),
            "received completion"
        );
        Ok(reply)
    }
}

#[async_trait]
impl LanguageModel for RigModel {
    #[tracing::instrument(skip_all, fields(text_len = text.len()))]
    async fn extract(&self, text: &str) -> distill_core::Result<String> {
        self.complete("extract", &self.prompts.map, text).await
    }

    #[tracing::instrument(skip_all, fields(items = items.len()))]
    async fn collapse(&self, items: &[SummaryItem]) -> distill_core::Result<String> {
        let joined = SummaryItem::join_texts(items);
        self.complete("collapse", self.prompts.collapse(), &joined).await
    }

    #[tracing::instrument(skip_all, fields(items = items.len()))]
    async fn reduce_to_flashcards(&self, items: &[SummaryItem]) -> distill_core::Result<FlashcardSet> {
        let joined = SummaryItem::join_texts(items);
        let raw = self.complete("reduce", &self.prompts.reduce, &joined).await?;
        FlashcardSet::from_model_output(&raw)
    }
}
