//! Text splitting implementation.

use std::num::NonZeroU32;

use distill_core::types::Chunk;
use text_splitter::{ChunkConfig, TextSplitter};
use tracing::{debug, instrument};

use super::{ChunkMetadata, SplitChunk};
use crate::{Error, Result};

/// Default chunk size in characters (about one thousand tokens).
pub const DEFAULT_MAX_CHARACTERS: usize = 4_000;

const PAGE_BREAK: char = '\x0c';

/// Splits a document into ordered, non-blank chunks on semantic boundaries.
#[derive(Debug, Clone)]
pub struct DocumentSplitter {
    max_characters: usize,
    overlap: usize,
    trim: bool,
}

impl DocumentSplitter {
    /// Creates a new splitter.
    ///
    /// Fails if `max_characters` is zero or `overlap` is not smaller than it.
    pub fn new(max_characters: usize, overlap: usize, trim: bool) -> Result<Self> {
        if max_characters == 0 {
            return Err(Error::splitting("chunk size must be at least one character"));
        }
        if overlap >= max_characters {
            return Err(Error::splitting(format!(
                "overlap ({overlap}) must be smaller than the chunk size ({max_characters})"
            )));
        }

        debug!(max_characters, overlap, trim, "created document splitter");
        Ok(Self {
            max_characters,
            overlap,
            trim,
        })
    }

    /// Returns the maximum characters per chunk.
    pub fn max_characters(&self) -> usize {
        self.max_characters
    }

    /// Returns the overlap between chunks.
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Splits text into chunks with byte offsets and page numbers.
    ///
    /// Page breaks are indicated by form feed characters. Blank pieces are
    /// dropped, so chunk indices stay contiguous.
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    pub fn split<'a>(&self, text: &'a str) -> Result<Vec<SplitChunk<'a>>> {
        let config = ChunkConfig::new(self.max_characters)
            .with_overlap(self.overlap)
            .map_err(|e| Error::splitting(e.to_string()))?
            .with_trim(self.trim);
        let splitter = TextSplitter::new(config);

        let page_breaks: Vec<usize> = text
            .char_indices()
            .filter(|(_, c)| *c == PAGE_BREAK)
            .map(|(i, _)| i)
            .collect();

        let chunks: Vec<_> = splitter
            .chunk_indices(text)
            .filter(|(_, piece)| !piece.trim().is_empty())
            .enumerate()
            .map(|(index, (offset, piece))| {
                let breaks = page_breaks.iter().take_while(|&&pos| pos < offset).count();
                let page = NonZeroU32::MIN.saturating_add(u32::try_from(breaks).unwrap_or(u32::MAX));
                let metadata = ChunkMetadata::new(index, offset, offset + piece.len());
                SplitChunk::new(piece, metadata.with_page(page))
            })
            .collect();

        debug!(
            chunk_count = chunks.len(),
            page_count = page_breaks.len() + 1,
            "split text into chunks"
        );
        Ok(chunks)
    }

    /// Splits text into engine input chunks.
    pub fn split_chunks(&self, text: &str) -> Result<Vec<Chunk>> {
        Ok(self.split(text)?.iter().map(SplitChunk::to_chunk).collect())
    }
}

impl Default for DocumentSplitter {
    fn default() -> Self {
        Self {
            max_characters: DEFAULT_MAX_CHARACTERS,
            overlap: 0,
            trim: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use distill_core::types::SummaryItem;

    use super::*;

    #[test]
    fn test_split_basic() {
        let splitter = DocumentSplitter::new(50, 0, true).unwrap();
        let text = "Hello world. This is a test. Another sentence here.";
        let chunks = splitter.split(text).unwrap();

        assert!(!chunks.is_empty());
        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= 50);
        }
    }

    #[test]
    fn test_split_with_overlap() {
        let splitter = DocumentSplitter::new(20, 5, true).unwrap();
        let chunks = splitter.split("The quick brown fox jumps over the lazy dog.").unwrap();
        assert!(chunks.len() > 1);
    }

    #[test]
    fn test_invalid_overlap() {
        assert!(DocumentSplitter::new(10, 10, true).is_err());
        assert!(DocumentSplitter::new(0, 0, true).is_err());
    }

    #[test]
    fn test_pages_from_form_feeds() {
        let splitter = DocumentSplitter::new(20, 0, true).unwrap();
        let text = "Page one content.\x0cPage two content.\x0cPage three.";
        let chunks = splitter.split(text).unwrap();

        assert_eq!(chunks[0].metadata.page, NonZeroU32::new(1));
        let last = chunks.last().unwrap();
        assert_eq!(last.metadata.page, NonZeroU32::new(3));
    }

    #[test]
    fn test_metadata_offsets() {
        let splitter = DocumentSplitter::new(500, 0, false).unwrap();
        let text = "Hello world";
        let chunks = splitter.split(text).unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].metadata.start_offset, 0);
        assert_eq!(chunks[0].metadata.byte_len(), text.len());
    }

    #[test]
    fn test_engine_chunks_are_indexed_and_non_blank() {
        let splitter = DocumentSplitter::new(30, 0, true).unwrap();
        let text = "First paragraph text.\n\n\n\nSecond paragraph text.\n\nThird one here.";
        let chunks = splitter.split_chunks(text).unwrap();

        assert!(chunks.len() >= 2);
        for (position, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index(), position);
            assert!(!chunk.is_blank());
        }
    }

    #[test]
    fn test_engine_chunks_carry_location() {
        let splitter = DocumentSplitter::new(20, 0, true).unwrap();
        let chunks = splitter
            .split_chunks("Page one content.\x0cPage two content.")
            .unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].metadata()["page"], 1);
        assert_eq!(chunks[1].metadata()["page"], 2);
        assert_eq!(chunks[0].metadata()["span"], "0..17");

        let leaf = SummaryItem::leaf(&chunks[1], "summary");
        assert_eq!(leaf.metadata["page"], 2);
        assert!(leaf.metadata.contains_key("span"));
    }

    #[test]
    fn test_empty_document() {
        let chunks = DocumentSplitter::default().split_chunks("  \n ").unwrap();
        assert!(chunks.is_empty());
    }
}
