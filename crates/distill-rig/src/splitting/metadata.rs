//! Split chunk metadata.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

/// Location of a split chunk in the source document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Chunk index within the source (0-based).
    pub index: usize,
    /// Start byte offset in the source text.
    pub start_offset: usize,
    /// End byte offset in the source text.
    pub end_offset: usize,
    /// Page number (1-indexed, if the source has form-feed page breaks).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<NonZeroU32>,
}

impl ChunkMetadata {
    /// Creates metadata with offset information.
    pub fn new(index: usize, start_offset: usize, end_offset: usize) -> Self {
        Self {
            index,
            start_offset,
            end_offset,
            page: None,
        }
    }

    /// Sets the page number.
    pub fn with_page(mut self, page: NonZeroU32) -> Self {
        self.page = Some(page);
        self
    }

    /// Returns the byte length of the chunk.
    pub fn byte_len(&self) -> usize {
        self.end_offset - self.start_offset
    }

    /// Returns the byte range as `start..end`.
    ///
    /// Rendered as a string so that merged summaries list every span they
    /// cover instead of keeping only the first.
    pub fn span(&self) -> String {
        format!("{}..{}", self.start_offset, self.end_offset)
    }
}
