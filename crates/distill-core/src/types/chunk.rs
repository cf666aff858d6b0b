//! Input chunk type.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Metadata;

/// One unit of input text and its position in the input sequence.
///
/// Metadata attached to a chunk (source page, byte span) is copied into its
/// leaf summary and merged through every collapse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    index: usize,
    text: String,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    metadata: Metadata,
}

impl Chunk {
    /// Creates a new chunk.
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
            metadata: Metadata::new(),
        }
    }

    /// Attaches a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Builds indexed chunks from an ordered sequence of strings.
    pub fn sequence<I, S>(texts: I) -> Vec<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        texts
            .into_iter()
            .enumerate()
            .map(|(index, text)| Self::new(index, text))
            .collect()
    }

    /// Returns the position of the chunk in the input sequence.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the chunk text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the chunk metadata.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Returns true if the chunk holds no visible text.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_assigns_indices() {
        let chunks = Chunk::sequence(["alpha", "beta", "gamma"]);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].index(), 2);
        assert_eq!(chunks[1].text(), "beta");
    }

    #[test]
    fn test_metadata_entries() {
        let chunk = Chunk::new(0, "text").with_metadata("page", 2);
        assert_eq!(chunk.metadata()["page"], 2);
        assert!(Chunk::new(1, "text").metadata().is_empty());
    }

    #[test]
    fn test_blank_chunk() {
        assert!(Chunk::new(0, " \n\t").is_blank());
        assert!(!Chunk::new(0, "x").is_blank());
    }
}
