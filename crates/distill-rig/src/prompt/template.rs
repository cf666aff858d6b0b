//! System and user prompt pair with text substitution.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Placeholder replaced by the request text.
pub const PLACEHOLDER: &str = "{text}";

/// Alternative placeholder accepted for prompt files written for `{docs}`.
pub const DOCS_PLACEHOLDER: &str = "{docs}";

/// A system prompt and a user prompt containing a text placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    /// System prompt, sent as the preamble.
    pub system: String,
    /// User prompt with a `{text}` placeholder.
    pub user: String,
}

/// A template with its placeholder substituted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    /// System prompt.
    pub system: String,
    /// User prompt.
    pub user: String,
}

impl PromptTemplate {
    /// Creates a template, checking that the user prompt has a placeholder.
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Result<Self> {
        let template = Self {
            system: system.into(),
            user: user.into(),
        };
        template.validate()?;
        Ok(template)
    }

    /// Parses a template from a JSON object with `system` and `user` keys.
    pub fn from_json(json: &str) -> Result<Self> {
        let template: Self = serde_json::from_str(json)?;
        template.validate()?;
        Ok(template)
    }

    /// Loads a template from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
            .map_err(|e| Error::template(format!("{}: {e}", path.display())))
    }

    /// Returns an error if the user prompt has no placeholder.
    pub fn validate(&self) -> Result<()> {
        if !self.user.contains(PLACEHOLDER) && !self.user.contains(DOCS_PLACEHOLDER) {
            return Err(Error::template(format!(
                "user prompt must contain a {PLACEHOLDER} placeholder"
            )));
        }
        Ok(())
    }

    /// Substitutes `text` for every placeholder.
    ///
    /// Placeholders are only recognized in the template; the inserted text is
    /// copied verbatim.
    pub fn render(&self, text: &str) -> RenderedPrompt {
        RenderedPrompt {
            system: self.system.clone(),
            user: substitute(&self.user, text),
        }
    }

    /// Built-in prompt for leaf extraction and, by default, collapse.
    pub fn default_map() -> Self {
        Self {
            system: "You are a helpful assistant specialized in effectively summarizing any \
                     kind of text."
                .into(),
            user: "Based on the provided documents, write a summary by picking out the major \
                   CONCEPTS, TERMS, DEFINITIONS and ACRONYMS that are important in the \
                   documents.\n\n\
                   Prioritize clarity and brevity while retaining the essential information. \
                   Convey any supporting details that contribute to a comprehensive \
                   understanding of each concept, term, definition and acronym.\n\n\
                   Do not focus on historical context. Ignore anything that looks like source \
                   code.\n\n\
                   DOCUMENTS:\n{text}\n\n\
                   Helpful Answer:"
                .into(),
        }
    }

    /// Built-in prompt for the final reduce to flashcards.
    pub fn default_reduce() -> Self {
        Self {
            system: "You are a helpful assistant.".into(),
            user: "The following is a set of definitions and concepts:\n{text}\n\n\
                   Distill it into a final, consolidated list of at least twenty (20) \
                   definitions or concepts. For each of them, write a question and an answer \
                   suitable for a flashcard.\n\n\
                   Respond with a single JSON object only, using the questions as keys and the \
                   answers as string values.\n\n\
                   Helpful Answer:"
                .into(),
        }
    }
}

fn substitute(template: &str, text: &str) -> String {
    let mut rendered = String::with_capacity(template.len() + text.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        rendered.push_str(&rest[..start]);
        let tail = &rest[start..];
        match tail
            .strip_prefix(PLACEHOLDER)
            .or_else(|| tail.strip_prefix(DOCS_PLACEHOLDER))
        {
            Some(after) => {
                rendered.push_str(text);
                rest = after;
            }
            None => {
                rendered.push('{');
                rest = &tail[1..];
            }
        }
    }

    rendered.push_str(rest);
    rendered
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_render_substitutes_text() {
        let template = PromptTemplate::new("sys", "Summarize:\n{text}").unwrap();
        let rendered = template.render("alpha beta");
        assert_eq!(rendered.system, "sys");
        assert_eq!(rendered.user, "Summarize:\nalpha beta");
    }

    #[test]
    fn test_docs_placeholder_is_accepted() {
        let template = PromptTemplate::new("sys", "DOCUMENTS: {docs}").unwrap();
        assert_eq!(template.render("x").user, "DOCUMENTS: x");
    }

    #[test]
    fn test_placeholders_in_text_are_left_alone() {
        let template = PromptTemplate::new("sys", "Summarize: {text}").unwrap();
        assert_eq!(
            template.render("Use the {docs} macro here.").user,
            "Summarize: Use the {docs} macro here."
        );

        let template = PromptTemplate::new("sys", "A {docs} B {text} {other}").unwrap();
        assert_eq!(template.render("{text}").user, "A {text} B {text} {other}");
    }

    #[test]
    fn test_missing_placeholder_is_rejected() {
        assert!(PromptTemplate::new("sys", "no slot here").is_err());
        assert!(PromptTemplate::from_json(r#"{"system": "s", "user": "u"}"#).is_err());
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(PromptTemplate::default_map().validate().is_ok());
        assert!(PromptTemplate::default_reduce().validate().is_ok());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"system": "s", "user": "Text: {{text}}"}}"#).unwrap();

        let template = PromptTemplate::from_file(file.path()).unwrap();
        assert_eq!(template.render("hello").user, "Text: hello");
    }
}
