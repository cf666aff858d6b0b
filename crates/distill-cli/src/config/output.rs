//! Output and logging configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result as AnyhowResult};
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET_CONFIG;

/// Where results go and how logs are formatted.
#[derive(Debug, Clone, Args, Serialize, Deserialize)]
#[must_use = "config does nothing unless you use it"]
pub struct OutputConfig {
    /// Path of the flashcard JSON file to write.
    #[arg(short = 'o', long, env = "DISTILL_OUTPUT")]
    pub output: PathBuf,

    /// Optional path for a JSON report with run statistics.
    #[arg(long, env = "DISTILL_STATS")]
    pub stats: Option<PathBuf>,

    /// Emits logs as JSON lines instead of human-readable text.
    #[arg(long, env = "DISTILL_LOG_JSON")]
    #[serde(default)]
    pub log_json: bool,
}

impl OutputConfig {
    /// Writes the flashcards as pretty-printed JSON.
    pub fn write_flashcards<T: Serialize>(&self, flashcards: &T) -> AnyhowResult<()> {
        write_json(&self.output, flashcards)?;
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            path = %self.output.display(),
            "Flashcards saved"
        );
        Ok(())
    }

    /// Writes the run statistics, if a path was configured.
    pub fn write_stats<T: Serialize>(&self, stats: &T) -> AnyhowResult<()> {
        let Some(path) = &self.stats else {
            return Ok(());
        };
        write_json(path, stats)?;
        tracing::debug!(
            target: TRACING_TARGET_CONFIG,
            path = %path.display(),
            "Run statistics saved"
        );
        Ok(())
    }
}

/// Serializes `value` to `path`, creating missing parent directories.
fn write_json<T: Serialize>(path: &Path, value: &T) -> AnyhowResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let mut json = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    json.push('\n');
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn test_writes_into_new_directory() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("nested").join("cards.json");
        let config = OutputConfig {
            output: output.clone(),
            stats: None,
            log_json: false,
        };

        let cards = BTreeMap::from([("What is a chunk?", "A unit of input.")]);
        config.write_flashcards(&cards).unwrap();

        let written: BTreeMap<String, String> =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(written["What is a chunk?"], "A unit of input.");
    }

    #[test]
    fn test_stats_are_optional() {
        let dir = tempfile::tempdir().unwrap();
        let config = OutputConfig {
            output: dir.path().join("cards.json"),
            stats: None,
            log_json: false,
        };
        config.write_stats(&"ignored").unwrap();
        assert!(!dir.path().join("stats.json").exists());
    }
}
