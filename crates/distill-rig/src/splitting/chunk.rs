//! Split chunk type.

use distill_core::types::Chunk;

use super::ChunkMetadata;

/// A chunk produced by the splitter, borrowing from the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitChunk<'a> {
    /// The chunk text.
    pub text: &'a str,
    /// Position of the chunk in the source.
    pub metadata: ChunkMetadata,
}

impl<'a> SplitChunk<'a> {
    /// Creates a new split chunk.
    pub fn new(text: &'a str, metadata: ChunkMetadata) -> Self {
        Self { text, metadata }
    }

    /// Converts into an engine input chunk.
    ///
    /// The byte span and the page number are attached as `span` and `page`
    /// metadata, so every summary can be traced back to the document.
    pub fn to_chunk(&self) -> Chunk {
        let chunk = Chunk::new(self.metadata.index, self.text)
            .with_metadata("span", self.metadata.span());
        match self.metadata.page {
            Some(page) => chunk.with_metadata("page", page.get()),
            None => chunk,
        }
    }
}
