//! Document splitting into engine input chunks.

mod chunk;
mod metadata;
mod splitter;

pub use chunk::SplitChunk;
pub use metadata::ChunkMetadata;
pub use splitter::{DEFAULT_MAX_CHARACTERS, DocumentSplitter};
