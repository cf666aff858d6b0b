#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;

use std::process;
use std::sync::Arc;

use anyhow::Context;
use distill_core::engine::Engine;
use distill_core::length::TokenEstimate;

use crate::config::Cli;

// Tracing target constants
pub const TRACING_TARGET_STARTUP: &str = "distill_cli::startup";
pub const TRACING_TARGET_SHUTDOWN: &str = "distill_cli::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "distill_cli::config";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::info!(
            target: TRACING_TARGET_SHUTDOWN,
            "application terminated successfully"
        );
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SHUTDOWN,
            error = %format!("{error:#}"),
            "application terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    cli.init_tracing();
    tracing::info!(
        target: TRACING_TARGET_STARTUP,
        version = env!("CARGO_PKG_VERSION"),
        "starting distill"
    );
    cli.log();
    cli.validate()?;

    let chunks = cli.input.load_chunks()?;
    let model = cli.model.build_model()?;
    let engine = Engine::from_arc(
        cli.engine.to_config()?,
        model,
        Arc::new(TokenEstimate::default()),
    );

    let distillation = engine
        .run_chunks(chunks)
        .await
        .context("distillation failed")?;

    cli.output.write_flashcards(distillation.flashcards())?;
    cli.output.write_stats(distillation.stats())?;

    let stats = distillation.stats();
    tracing::info!(
        target: TRACING_TARGET_SHUTDOWN,
        run_id = %stats.run_id,
        cards = distillation.flashcards().len(),
        rounds = stats.rounds,
        model_calls = stats.model_calls,
        "Flashcards generated"
    );

    Ok(())
}
