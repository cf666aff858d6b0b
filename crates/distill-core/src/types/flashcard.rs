//! Terminal flashcard artifact and parsing of model output.

use std::collections::BTreeMap;

use derive_more::{Deref, IntoIterator};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

/// Mapping from question text to answer text.
///
/// Serializes as one flat JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, IntoIterator, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlashcardSet {
    #[into_iterator(owned, ref)]
    cards: BTreeMap<String, String>,
}

impl FlashcardSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a card, replacing the answer of an existing question.
    pub fn insert(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.cards.insert(question.into(), answer.into());
    }

    /// Returns the answer for a question.
    pub fn answer(&self, question: &str) -> Option<&str> {
        self.cards.get(question).map(String::as_str)
    }

    /// Parses the raw text returned by the final reduce call.
    ///
    /// Accepts a JSON object of question/answer strings, optionally wrapped in
    /// Markdown code fences or in a `{"flashcards": ...}` envelope, or a list
    /// of `{"question": ..., "answer": ...}` objects. Anything else, including
    /// an empty result, is a malformed response.
    pub fn from_model_output(raw: &str) -> Result<Self> {
        let body = strip_code_fence(raw);
        let value: Value = serde_json::from_str(body).map_err(|e| {
            Error::malformed_response()
                .with_message("flashcard output is not valid JSON")
                .with_source(e)
        })?;

        let cards = Self::from_value(value)?;
        if cards.is_empty() {
            return Err(Error::malformed_response().with_message("model returned no flashcards"));
        }
        Ok(cards)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(mut object) => {
                if object.len() == 1
                    && let Some(inner) = object.remove("flashcards")
                {
                    return Self::from_value(inner);
                }

                let mut cards = Self::new();
                for (question, answer) in object {
                    let Value::String(answer) = answer else {
                        return Err(Error::malformed_response()
                            .with_message(format!("answer to {question:?} is not a string")));
                    };
                    cards.insert(question, answer);
                }
                Ok(cards)
            }
            Value::Array(entries) => {
                let mut cards = Self::new();
                for entry in entries {
                    let question = entry.get("question").and_then(Value::as_str);
                    let answer = entry.get("answer").and_then(Value::as_str);
                    match (question, answer) {
                        (Some(question), Some(answer)) => cards.insert(question, answer),
                        _ => {
                            return Err(Error::malformed_response().with_message(
                                "flashcard entry lacks a string question or answer",
                            ));
                        }
                    }
                }
                Ok(cards)
            }
            other => Err(Error::malformed_response()
                .with_message(format!("expected a JSON object, got {}", json_type(&other)))),
        }
    }
}

impl FromIterator<(String, String)> for FlashcardSet {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            cards: iter.into_iter().collect(),
        }
    }
}

/// Removes a surrounding Markdown code fence (```json ... ```), if any.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.split_once('\n').map_or(rest, |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_parse_flat_object() {
        let cards =
            FlashcardSet::from_model_output(r#"{"What is Rust?": "A systems language."}"#).unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards.answer("What is Rust?"), Some("A systems language."));
    }

    #[test]
    fn test_parse_fenced_output() {
        let raw = "```json\n{\"Q1\": \"A1\", \"Q2\": \"A2\"}\n```";
        let cards = FlashcardSet::from_model_output(raw).unwrap();
        assert_eq!(cards.len(), 2);
    }

    #[test]
    fn test_parse_envelope_and_list() {
        let raw = r#"{"flashcards": [{"question": "Q", "answer": "A"}]}"#;
        let cards = FlashcardSet::from_model_output(raw).unwrap();
        assert_eq!(cards.answer("Q"), Some("A"));
    }

    #[test]
    fn test_reject_malformed() {
        let error = FlashcardSet::from_model_output("Here are your flashcards!").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::MalformedResponse);
        assert!(!error.is_retryable());

        let error = FlashcardSet::from_model_output(r#"{"Q": 42}"#).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::MalformedResponse);

        let error = FlashcardSet::from_model_output("{}").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::MalformedResponse);
    }

    #[test]
    fn test_serializes_flat() {
        let cards: FlashcardSet = [("Q".to_string(), "A".to_string())].into_iter().collect();
        assert_eq!(serde_json::to_string(&cards).unwrap(), r#"{"Q":"A"}"#);
    }
}
