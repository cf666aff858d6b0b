//! Distillation engine.

use std::sync::Arc;

use futures::future::{join_all, try_join_all};
use jiff::Timestamp;
use tokio::sync::Semaphore;
use tracing::Instrument;
use uuid::Uuid;

use super::convergence::{ConvergenceController, Decision, Measure};
use super::report::{Distillation, RunStats};
use super::splitter::{Batch, split_batches};
use super::{EngineConfig, MapFailurePolicy, OversizedPolicy};
use crate::length::LengthOracle;
use crate::model::{LanguageModel, ModelService};
use crate::stage::{CollapseReducer, FinalReducer, LeafExtractor};
use crate::types::{Chunk, FlashcardSet, OverallState, Phase, SummaryItem, WorkingSet};
use crate::{RunError, RunResult};

/// Tracing target for engine operations.
const TRACING_TARGET: &str = "distill_core::engine";

/// The distillation engine.
///
/// Extracts every chunk concurrently, collapses the working set in rounds of
/// budget-sized batches until it fits, and reduces it to flashcards with one
/// final call. Every run owns its own concurrency permits and state, so one
/// engine can serve concurrent runs.
pub struct Engine {
    config: EngineConfig,
    oracle: Arc<dyn LengthOracle>,
    extractor: LeafExtractor,
    collapser: CollapseReducer,
    reducer: FinalReducer,
    controller: ConvergenceController,
}

/// Mutable bookkeeping of one run.
struct Run {
    state: OverallState,
    permits: Semaphore,
    skipped: Vec<usize>,
    model_calls: usize,
    final_weight: u64,
    oversized_accepted: bool,
}

/// Output of one batch within a collapse round.
struct Collapsed {
    item: SummaryItem,
    weight: u64,
    called: bool,
    still_oversized: bool,
}

impl Engine {
    /// Creates a new engine.
    pub fn new(
        config: EngineConfig,
        model: impl LanguageModel + 'static,
        oracle: impl LengthOracle + 'static,
    ) -> Self {
        Self::from_arc(config, Arc::new(model), Arc::new(oracle))
    }

    /// Creates a new engine around a shared model and oracle.
    ///
    /// The model is wrapped in a [`ModelService`] using the retry and timeout
    /// settings of `config`.
    pub fn from_arc(
        config: EngineConfig,
        model: Arc<dyn LanguageModel>,
        oracle: Arc<dyn LengthOracle>,
    ) -> Self {
        let service = ModelService::from_arc(model)
            .with_retry_policy(config.retry_attempts)
            .with_retry_delay(config.retry_delay)
            .with_timeout(config.call_timeout);

        tracing::info!(
            target: TRACING_TARGET,
            budget = config.budget,
            max_concurrency = config.max_concurrency,
            max_rounds = config.max_rounds,
            map_failure_policy = %config.map_failure_policy,
            oversized_policy = %config.oversized_policy,
            "Distillation engine initialized"
        );

        Self {
            oracle,
            extractor: LeafExtractor::new(service.clone()),
            collapser: CollapseReducer::new(service.clone(), config.budget),
            reducer: FinalReducer::new(service),
            controller: ConvergenceController::new(config.budget, config.max_rounds),
            config,
        }
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Distills an ordered sequence of texts into flashcards.
    pub async fn run<I, S>(&self, texts: I) -> RunResult<Distillation>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.run_chunks(Chunk::sequence(texts)).await
    }

    /// Distills indexed chunks into flashcards.
    ///
    /// Fails without calling the model if the input is empty or a chunk is
    /// blank. Any later failure moves the run to [`Phase::Failed`] and is
    /// returned with its structured cause.
    pub async fn run_chunks(&self, chunks: Vec<Chunk>) -> RunResult<Distillation> {
        validate_chunks(&chunks)?;

        let run_id = Uuid::now_v7();
        let span = tracing::info_span!(
            target: TRACING_TARGET,
            "distill_run",
            %run_id,
            chunks = chunks.len(),
        );

        self.execute(run_id, chunks).instrument(span).await
    }

    async fn execute(&self, run_id: Uuid, chunks: Vec<Chunk>) -> RunResult<Distillation> {
        let started_at = Timestamp::now();
        let chunk_count = chunks.len();
        let mut run = Run {
            state: OverallState::new(chunks),
            permits: Semaphore::new(self.config.max_concurrency),
            skipped: Vec::new(),
            model_calls: 0,
            final_weight: 0,
            oversized_accepted: false,
        };

        tracing::debug!(target: TRACING_TARGET, "Starting distillation run");

        let limit = self.config.run_timeout;
        let outcome = match tokio::time::timeout(limit, self.drive(&mut run)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(RunError::Timeout { limit }),
        };

        if let Err(error) = outcome {
            let _ = run.state.transition(Phase::Failed);
            tracing::error!(
                target: TRACING_TARGET,
                kind = %error.kind(),
                round = run.state.round(),
                error = %error,
                "Distillation run failed"
            );
            return Err(error);
        }

        let final_items = run.state.working_set().len();
        let flashcards = run
            .state
            .take_flashcards()
            .ok_or_else(|| RunError::Internal("run finished without flashcards".into()))?;

        let stats = RunStats {
            run_id,
            chunks: chunk_count,
            skipped_chunks: run.skipped,
            rounds: run.state.round(),
            model_calls: run.model_calls,
            final_items,
            final_weight: run.final_weight,
            oversized_accepted: run.oversized_accepted,
            started_at,
            finished_at: Timestamp::now(),
        };

        tracing::info!(
            target: TRACING_TARGET,
            cards = flashcards.len(),
            rounds = stats.rounds,
            model_calls = stats.model_calls,
            skipped = stats.skipped_chunks.len(),
            "Distillation run completed"
        );

        Ok(Distillation { flashcards, stats })
    }

    async fn drive(&self, run: &mut Run) -> RunResult<()> {
        self.map(run).await?;

        let mut weights = self.weigh(run.state.working_set(), 0).await?;
        loop {
            let before = Measure::of(&weights);
            tracing::debug!(
                target: TRACING_TARGET,
                round = run.state.round(),
                items = before.items,
                weight = before.weight,
                "Working set measured"
            );

            if self.controller.decide(before) == Decision::Finalize {
                break;
            }
            self.controller.admit_round(run.state.round(), before)?;

            run.state.transition(Phase::Collapse)?;
            let round = run.state.next_round();
            let outputs = self
                .collapse_round(run.state.working_set(), &weights, round, &run.permits)
                .await?;

            run.model_calls += outputs.iter().filter(|output| output.called).count();
            let stuck = outputs
                .iter()
                .enumerate()
                .find(|(_, output)| output.still_oversized)
                .map(|(index, output)| (index, output.weight));

            weights = outputs.iter().map(|output| output.weight).collect();
            let next: WorkingSet = outputs.into_iter().map(|output| output.item).collect();

            if let Some((index, weight)) = stuck {
                match self.config.oversized_policy {
                    OversizedPolicy::Fail => {
                        return Err(RunError::OversizedItem {
                            round,
                            index,
                            weight,
                            budget: self.config.budget,
                        });
                    }
                    OversizedPolicy::Accept => {
                        tracing::warn!(
                            target: TRACING_TARGET,
                            round,
                            index,
                            weight,
                            budget = self.config.budget,
                            "Item stays over budget after collapse, finalizing with current working set"
                        );
                        run.oversized_accepted = true;
                        run.state.replace_working_set(next);
                        run.state.transition(Phase::Decide)?;
                        break;
                    }
                }
            }

            let after = Measure::of(&weights);
            tracing::info!(
                target: TRACING_TARGET,
                round,
                items_before = before.items,
                items_after = after.items,
                weight_before = before.weight,
                weight_after = after.weight,
                "Collapse round completed"
            );
            self.controller.check_progress(round, before, after)?;
            run.state.replace_working_set(next);
            run.state.transition(Phase::Decide)?;
        }

        run.final_weight = weights.iter().sum();
        let flashcards = self.finalize(run).await?;
        run.state.set_flashcards(flashcards);
        run.state.transition(Phase::Done)
    }

    /// Extracts every chunk concurrently and seeds the working set.
    async fn map(&self, run: &mut Run) -> RunResult<()> {
        run.state.transition(Phase::MapDispatch)?;

        let chunks = run.state.chunks().to_vec();
        let permits = &run.permits;
        let tasks: Vec<_> = chunks
            .iter()
            .map(|chunk| async move {
                self.extractor
                    .extract(chunk, permits)
                    .await
                    .map_err(|source| RunError::Extraction {
                        index: chunk.index(),
                        source,
                    })
            })
            .collect();

        tracing::debug!(
            target: TRACING_TARGET,
            tasks = tasks.len(),
            "Leaf extraction dispatched"
        );
        run.state.transition(Phase::MapGather)?;

        let summaries = match self.config.map_failure_policy {
            MapFailurePolicy::Strict => try_join_all(tasks).await?,
            MapFailurePolicy::Skip => {
                let mut summaries = Vec::with_capacity(tasks.len());
                let mut first_error = None;
                for result in join_all(tasks).await {
                    match result {
                        Ok(summary) => summaries.push(summary),
                        Err(error) => {
                            tracing::warn!(
                                target: TRACING_TARGET,
                                chunk = error.index(),
                                error = %error,
                                "Skipping chunk after failed extraction"
                            );
                            run.skipped.extend(error.index());
                            first_error.get_or_insert(error);
                        }
                    }
                }
                if summaries.is_empty()
                    && let Some(error) = first_error
                {
                    return Err(error);
                }
                summaries
            }
        };

        run.model_calls += summaries.len();
        run.state.append_summaries(summaries);
        run.state.seed_working_set();
        run.state.transition(Phase::Decide)
    }

    /// Runs one collapse round and returns its outputs in batch order.
    async fn collapse_round(
        &self,
        working_set: &WorkingSet,
        weights: &[u64],
        round: u32,
        permits: &Semaphore,
    ) -> RunResult<Vec<Collapsed>> {
        let budget = self.config.budget;
        let items = working_set.iter().cloned().zip(weights.iter().copied());
        let batches = split_batches(items, budget);
        let compress_singletons = batches.iter().all(Batch::is_singleton);

        for (index, batch) in batches.iter().enumerate() {
            if batch.is_oversized(budget) {
                tracing::warn!(
                    target: TRACING_TARGET,
                    round,
                    batch = index,
                    weight = batch.weight(),
                    budget,
                    "Item exceeds budget on its own, collapsing it alone"
                );
            }
        }

        tracing::debug!(
            target: TRACING_TARGET,
            round,
            items = working_set.len(),
            batches = batches.len(),
            "Collapse round dispatched"
        );

        let tasks = batches.iter().enumerate().map(|(index, batch)| {
            self.collapse_batch(batch, index, round, compress_singletons, permits)
        });
        try_join_all(tasks).await
    }

    async fn collapse_batch(
        &self,
        batch: &Batch,
        index: usize,
        round: u32,
        compress_singletons: bool,
        permits: &Semaphore,
    ) -> RunResult<Collapsed> {
        if !self.collapser.requires_call(batch, compress_singletons) {
            let item = batch
                .items()
                .first()
                .cloned()
                .ok_or_else(|| RunError::Internal("empty batch".into()))?;
            return Ok(Collapsed {
                item,
                weight: batch.weight(),
                called: false,
                still_oversized: false,
            });
        }

        let item = self
            .collapser
            .collapse(batch, round, permits)
            .await
            .map_err(|source| RunError::Collapse {
                round,
                batch: index,
                source,
            })?;
        let weight = self
            .oracle
            .weigh(&item.text)
            .await
            .map_err(|source| RunError::Measurement { round, source })?;

        Ok(Collapsed {
            item,
            weight,
            called: true,
            still_oversized: batch.is_oversized(self.config.budget) && weight > self.config.budget,
        })
    }

    async fn finalize(&self, run: &mut Run) -> RunResult<FlashcardSet> {
        run.state.transition(Phase::FinalReduce)?;
        let round = run.state.round();

        let flashcards = self
            .reducer
            .reduce(run.state.working_set(), &run.permits)
            .await
            .map_err(|source| RunError::FinalReduce { round, source })?;

        run.model_calls += 1;
        Ok(flashcards)
    }

    async fn weigh(&self, working_set: &WorkingSet, round: u32) -> RunResult<Vec<u64>> {
        self.oracle
            .weigh_items(working_set.items())
            .await
            .map_err(|source| RunError::Measurement { round, source })
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn validate_chunks(chunks: &[Chunk]) -> RunResult<()> {
    if chunks.is_empty() {
        return Err(RunError::invalid_input("no input chunks"));
    }
    if let Some(chunk) = chunks.iter().find(|chunk| chunk.is_blank()) {
        return Err(RunError::InvalidInput {
            index: Some(chunk.index()),
            message: format!("chunk {} is empty", chunk.index()),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::RunErrorKind;
    use crate::length::WordCount;
    use crate::mock::MockModel;

    fn config(budget: u64) -> EngineConfig {
        EngineConfig::builder()
            .budget(budget)
            .retry_delay(Duration::ZERO)
            .build()
            .unwrap()
    }

    fn words(prefix: &str, count: usize) -> String {
        (0..count)
            .map(|i| format!("{prefix}{i}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[tokio::test]
    async fn test_rejects_empty_input() {
        let engine = Engine::new(config(25), MockModel::new(), WordCount);
        let error = engine.run(Vec::<String>::new()).await.unwrap_err();
        assert_eq!(error.kind(), RunErrorKind::InvalidInput);
        assert_eq!(error.index(), None);
    }

    #[tokio::test]
    async fn test_rejects_blank_chunk() {
        let model = Arc::new(MockModel::new());
        let engine = Engine::from_arc(config(25), model.clone(), Arc::new(WordCount));
        let error = engine.run(["text", "   "]).await.unwrap_err();
        assert_eq!(error.kind(), RunErrorKind::InvalidInput);
        assert_eq!(error.index(), Some(1));
        assert_eq!(model.extract_calls(), 0);
    }

    #[tokio::test]
    async fn test_small_input_skips_collapse() {
        let model = Arc::new(MockModel::new());
        let engine = Engine::from_arc(config(25), model.clone(), Arc::new(WordCount));

        let result = engine.run([words("w", 5)]).await.unwrap();
        assert_eq!(result.stats.rounds, 0);
        assert_eq!(result.stats.model_calls, 2);
        assert_eq!(model.collapse_calls(), 0);
        assert_eq!(model.reduce_calls(), 1);
        assert!(!result.flashcards.is_empty());
    }

    #[tokio::test]
    async fn test_singleton_passes_through_beside_pairs() {
        // Batches: [a, b], [c]. Only the pair is sent to the model.
        let model = Arc::new(MockModel::new());
        let engine = Engine::from_arc(config(25), model.clone(), Arc::new(WordCount));

        let result = engine
            .run([words("a", 12), words("b", 12), words("c", 12)])
            .await
            .unwrap();
        assert_eq!(result.stats.rounds, 1);
        assert_eq!(model.collapse_calls(), 1);
        assert_eq!(result.stats.final_items, 2);
        assert_eq!(result.stats.final_weight, 24);
    }

    #[tokio::test]
    async fn test_all_singletons_are_compressed() {
        // Every item fits alone but no two fit together.
        let model = Arc::new(MockModel::new());
        let engine = Engine::from_arc(config(25), model.clone(), Arc::new(WordCount));

        let result = engine.run([words("a", 20), words("b", 20)]).await.unwrap();
        assert_eq!(result.stats.rounds, 1);
        assert_eq!(model.collapse_calls(), 2);
        assert_eq!(result.stats.final_weight, 20);
    }
}
