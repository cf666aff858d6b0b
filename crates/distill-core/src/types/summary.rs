//! Summary items flowing through the working set.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Chunk;

/// Free-form metadata attached to a summary item.
///
/// The orchestrator never interprets it; it is carried through collapses for
/// traceability.
pub type Metadata = serde_json::Map<String, Value>;

/// A text payload produced by the leaf extractor or the collapse reducer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryItem {
    /// Summary text.
    pub text: String,
    /// Opaque metadata.
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
    /// Indices of the source chunks this item summarizes, in input order.
    pub sources: Vec<usize>,
    /// Round that produced the item (0 for leaf summaries).
    pub round: u32,
}

impl SummaryItem {
    /// Creates an item without provenance.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: Metadata::new(),
            sources: Vec::new(),
            round: 0,
        }
    }

    /// Creates the leaf summary of a chunk, inheriting its metadata.
    pub fn leaf(chunk: &Chunk, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: chunk.metadata().clone(),
            sources: vec![chunk.index()],
            round: 0,
        }
    }

    /// Creates the replacement item of a collapsed batch.
    ///
    /// Sources are concatenated in batch order and metadata is merged key by
    /// key: equal values are kept once, differing strings are joined with
    /// `", "`, and otherwise the first value wins.
    pub fn collapsed(batch: &[SummaryItem], text: impl Into<String>, round: u32) -> Self {
        let mut metadata = Metadata::new();
        for item in batch {
            merge_metadata(&mut metadata, &item.metadata);
        }

        Self {
            text: text.into(),
            metadata,
            sources: batch.iter().flat_map(|item| item.sources.iter().copied()).collect(),
            round,
        }
    }

    /// Attaches a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Joins the texts of a batch with blank lines, preserving order.
    pub fn join_texts(batch: &[SummaryItem]) -> String {
        batch
            .iter()
            .map(|item| item.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

fn merge_metadata(target: &mut Metadata, incoming: &Metadata) {
    for (key, value) in incoming {
        match target.get_mut(key) {
            None => {
                target.insert(key.clone(), value.clone());
            }
            Some(existing) if *existing == *value => {}
            Some(Value::String(existing)) => {
                if let Value::String(next) = value {
                    existing.push_str(", ");
                    existing.push_str(next);
                }
            }
            Some(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_provenance() {
        let chunk = Chunk::new(4, "raw text");
        let item = SummaryItem::leaf(&chunk, "summary");
        assert_eq!(item.sources, vec![4]);
        assert_eq!(item.round, 0);
        assert!(item.metadata.is_empty());
    }

    #[test]
    fn test_chunk_metadata_reaches_collapsed_item() {
        let batch = vec![
            SummaryItem::leaf(&Chunk::new(0, "a").with_metadata("span", "0..10"), "first"),
            SummaryItem::leaf(&Chunk::new(1, "b").with_metadata("span", "10..25"), "second"),
        ];
        assert_eq!(batch[0].metadata["span"], "0..10");

        let item = SummaryItem::collapsed(&batch, "both", 1);
        assert_eq!(item.metadata["span"], "0..10, 10..25");
    }

    #[test]
    fn test_collapsed_merges_sources_in_order() {
        let batch = vec![
            SummaryItem::leaf(&Chunk::new(0, "a"), "first"),
            SummaryItem::leaf(&Chunk::new(1, "b"), "second"),
        ];
        let item = SummaryItem::collapsed(&batch, "both", 1);
        assert_eq!(item.sources, vec![0, 1]);
        assert_eq!(item.round, 1);
        assert_eq!(SummaryItem::join_texts(&batch), "first\n\nsecond");
    }

    #[test]
    fn test_collapsed_merges_metadata() {
        let batch = vec![
            SummaryItem::new("a")
                .with_metadata("source", "intro.pdf")
                .with_metadata("lang", "en"),
            SummaryItem::new("b")
                .with_metadata("source", "body.pdf")
                .with_metadata("lang", "en")
                .with_metadata("page", 3),
        ];
        let item = SummaryItem::collapsed(&batch, "ab", 1);
        assert_eq!(item.metadata["source"], "intro.pdf, body.pdf");
        assert_eq!(item.metadata["lang"], "en");
        assert_eq!(item.metadata["page"], 3);
    }
}
