//! Input document configuration.

use std::path::PathBuf;

use anyhow::{Context, Result as AnyhowResult, anyhow};
use clap::Args;
use distill_core::types::Chunk;
use distill_rig::splitting::{DEFAULT_MAX_CHARACTERS, DocumentSplitter};
use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET_CONFIG;

/// Source document and chunking configuration.
#[derive(Debug, Clone, Args, Serialize, Deserialize)]
#[must_use = "config does nothing unless you use it"]
pub struct InputConfig {
    /// Path to the UTF-8 text document to distill.
    #[arg(short = 'i', long, env = "DISTILL_INPUT")]
    pub input: PathBuf,

    /// Maximum chunk size in characters.
    #[arg(long, env = "DISTILL_CHUNK_SIZE", default_value_t = DEFAULT_MAX_CHARACTERS)]
    pub chunk_size: usize,

    /// Overlap between consecutive chunks in characters.
    #[arg(long, env = "DISTILL_CHUNK_OVERLAP", default_value_t = 0)]
    pub chunk_overlap: usize,
}

impl InputConfig {
    /// Validates chunking parameters.
    pub fn validate(&self) -> AnyhowResult<()> {
        if self.chunk_size == 0 {
            return Err(anyhow!("Chunk size must be at least one character."));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(anyhow!(
                "Chunk overlap {} must be smaller than the chunk size {}.",
                self.chunk_overlap,
                self.chunk_size
            ));
        }
        Ok(())
    }

    /// Reads the document and splits it into engine input chunks.
    pub fn load_chunks(&self) -> AnyhowResult<Vec<Chunk>> {
        let text = std::fs::read_to_string(&self.input)
            .with_context(|| format!("failed to read {}", self.input.display()))?;

        let splitter = DocumentSplitter::new(self.chunk_size, self.chunk_overlap, true)?;
        let chunks = splitter.split_chunks(&text)?;
        if chunks.is_empty() {
            return Err(anyhow!("{} contains no text", self.input.display()));
        }

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            path = %self.input.display(),
            bytes = text.len(),
            chunks = chunks.len(),
            "Document loaded"
        );
        Ok(chunks)
    }

    /// Logs input configuration.
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            input = %self.input.display(),
            chunk_size = self.chunk_size,
            chunk_overlap = self.chunk_overlap,
            "Input configuration"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn config(input: PathBuf) -> InputConfig {
        InputConfig {
            input,
            chunk_size: 40,
            chunk_overlap: 0,
        }
    }

    #[test]
    fn test_load_chunks() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Ownership moves values between bindings.").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "Borrowing lends access without moving.").unwrap();

        let chunks = config(file.path().to_path_buf()).load_chunks().unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].index(), 1);
    }

    #[test]
    fn test_blank_document_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "   ").unwrap();
        assert!(config(file.path().to_path_buf()).load_chunks().is_err());
    }

    #[test]
    fn test_validate_overlap() {
        let mut config = config(PathBuf::from("doc.txt"));
        assert!(config.validate().is_ok());
        config.chunk_overlap = 40;
        assert!(config.validate().is_err());
    }
}
