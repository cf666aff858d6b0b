//! CLI configuration management.
//!
//! This module defines the complete CLI configuration hierarchy:
//!
//! ```text
//! Cli
//! ├── input: InputConfig    # Source document, chunk size and overlap
//! ├── engine: EngineArgs    # Budget, concurrency, timeouts, policies
//! ├── model: ModelArgs      # Provider, model, API key, prompt files
//! └── output: OutputConfig  # Flashcard and stats files, log format
//! ```
//!
//! All configuration can be provided via CLI arguments or environment variables.
//! Use `--help` to see all available options.
//!
//! # Example
//!
//! ```bash
//! distill -i notes.txt -o cards.json --budget 8000
//!
//! # Or via environment variables
//! DISTILL_PROVIDER=anthropic ANTHROPIC_API_KEY=... distill -i notes.txt -o cards.json
//! ```

mod engine;
mod input;
mod model;
mod output;

use std::process;

use anyhow::Context;
use clap::Parser;
pub use engine::EngineArgs;
pub use input::InputConfig;
pub use model::ModelArgs;
pub use output::OutputConfig;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::TRACING_TARGET_STARTUP;

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(name = "distill")]
#[command(about = "Distill a long document into question/answer flashcards")]
#[command(version)]
pub struct Cli {
    /// Source document and chunking.
    #[clap(flatten)]
    pub input: InputConfig,

    /// Orchestration engine settings.
    #[clap(flatten)]
    pub engine: EngineArgs,

    /// Model provider and prompts.
    #[clap(flatten)]
    pub model: ModelArgs,

    /// Output files and log format.
    #[clap(flatten)]
    pub output: OutputConfig,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    ///
    /// The .env file is loaded before clap parses arguments so that its
    /// variables act as defaults.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Initializes tracing with environment-based filtering.
    ///
    /// Logs go to stderr so the terminal stays readable when output is piped.
    pub fn init_tracing(&self) {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let registry = tracing_subscriber::registry().with(filter);

        if self.output.log_json {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        } else {
            registry
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.input
            .validate()
            .context("invalid input configuration")?;
        self.engine
            .to_config()
            .context("invalid engine configuration")?;
        self.model
            .validate()
            .context("invalid model configuration")?;
        Ok(())
    }

    /// Logs configuration (no sensitive information).
    pub fn log(&self) {
        Self::log_build_info();
        self.input.log();
        self.engine.log();
        self.model.log();
    }

    fn log_build_info() {
        tracing::debug!(
            target: TRACING_TARGET_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "Build information"
        );
    }

    /// Returns a list of enabled compile-time features.
    fn enabled_features() -> Vec<&'static str> {
        [
            cfg!(feature = "dotenv").then_some("dotenv"),
            cfg!(feature = "mock").then_some("mock"),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use distill_core::engine::{MapFailurePolicy, OversizedPolicy};
    use distill_rig::provider::ProviderKind;

    use super::*;

    #[test]
    fn test_parse_minimal() {
        let cli = Cli::try_parse_from(["distill", "-i", "notes.txt", "-o", "cards.json"]).unwrap();
        assert_eq!(cli.input.input.to_str(), Some("notes.txt"));
        assert_eq!(cli.output.output.to_str(), Some("cards.json"));
        assert_eq!(cli.engine.budget, 100_000);
        assert_eq!(cli.model.provider, ProviderKind::OpenAi);
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_parse_policies_and_prompts() {
        let cli = Cli::try_parse_from([
            "distill",
            "--input",
            "notes.txt",
            "--output",
            "out/cards.json",
            "--provider",
            "gemini",
            "--map-failure-policy",
            "skip",
            "--oversized-policy",
            "accept",
            "-m",
            "map.json",
            "-r",
            "reduce.json",
        ])
        .unwrap();

        assert_eq!(cli.model.provider, ProviderKind::Gemini);
        assert_eq!(cli.engine.map_failure_policy, MapFailurePolicy::Skip);
        assert_eq!(cli.engine.oversized_policy, OversizedPolicy::Accept);
        assert!(cli.model.map_prompt.is_some());
        assert!(cli.model.reduce_prompt.is_some());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let cli = Cli::try_parse_from([
            "distill", "-i", "a.txt", "-o", "b.json", "--concurrency", "0",
        ])
        .unwrap();
        assert!(cli.validate().is_err());

        assert!(Cli::try_parse_from(["distill", "-o", "b.json"]).is_err());
        assert!(
            Cli::try_parse_from([
                "distill", "-i", "a.txt", "-o", "b.json", "--map-failure-policy", "lenient",
            ])
            .is_err()
        );
    }
}
