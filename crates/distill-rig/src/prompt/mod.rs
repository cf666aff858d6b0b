//! Prompt templates for the three model operations.

mod template;

use serde::{Deserialize, Serialize};
pub use template::{DOCS_PLACEHOLDER, PLACEHOLDER, PromptTemplate, RenderedPrompt};

/// Templates for extraction, collapse and the final reduce.
///
/// Collapse reuses the extraction template when no dedicated one is set; the
/// batch is then presented as one document with items separated by blank
/// lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptSet {
    /// Template for leaf extraction.
    pub map: PromptTemplate,
    /// Template for collapsing a batch, if different from `map`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collapse: Option<PromptTemplate>,
    /// Template for the final reduce to flashcards.
    pub reduce: PromptTemplate,
}

impl PromptSet {
    /// Creates a prompt set without a dedicated collapse template.
    pub fn new(map: PromptTemplate, reduce: PromptTemplate) -> Self {
        Self {
            map,
            collapse: None,
            reduce,
        }
    }

    /// Sets a dedicated collapse template.
    pub fn with_collapse(mut self, collapse: PromptTemplate) -> Self {
        self.collapse = Some(collapse);
        self
    }

    /// Returns the template used for collapse calls.
    pub fn collapse(&self) -> &PromptTemplate {
        self.collapse.as_ref().unwrap_or(&self.map)
    }
}

impl Default for PromptSet {
    fn default() -> Self {
        Self::new(PromptTemplate::default_map(), PromptTemplate::default_reduce())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_falls_back_to_map() {
        let prompts = PromptSet::default();
        assert_eq!(prompts.collapse(), &prompts.map);

        let collapse = PromptTemplate::new("merge", "Merge: {text}").unwrap();
        let prompts = prompts.with_collapse(collapse.clone());
        assert_eq!(prompts.collapse(), &collapse);
    }
}
