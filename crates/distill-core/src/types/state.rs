//! Orchestration record and phase machine of a single run.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, IntoStaticStr};

use super::{Chunk, FlashcardSet, SummaryItem, WorkingSet};
use crate::{RunError, RunResult};

/// Tracing target for phase transitions.
const TRACING_TARGET: &str = "distill_core::state";

/// Phase of an orchestration run.
///
/// ```text
/// Start → MapDispatch → MapGather → Decide ⇄ Collapse
///                                     └─→ FinalReduce → Done
/// ```
///
/// `Failed` is reachable from every non-terminal phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    /// Input accepted, nothing dispatched yet.
    Start,
    /// One extraction task is being created per chunk.
    MapDispatch,
    /// Waiting for every extraction before seeding the working set.
    MapGather,
    /// Measuring the working set against the budget.
    Decide,
    /// Running one collapse round over budget-sized batches.
    Collapse,
    /// Turning the converged working set into flashcards.
    FinalReduce,
    /// Flashcards produced.
    Done,
    /// The run ended with an error.
    Failed,
}

impl Phase {
    /// Returns true if no further transition is possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Returns true if `next` is a legal successor of this phase.
    pub fn can_transition_to(self, next: Phase) -> bool {
        use Phase::*;

        match (self, next) {
            (from, Failed) => !from.is_terminal(),
            (Start, MapDispatch)
            | (MapDispatch, MapGather)
            | (MapGather, Decide)
            | (Decide, Collapse)
            | (Decide, FinalReduce)
            | (Collapse, Decide)
            | (FinalReduce, Done) => true,
            _ => false,
        }
    }
}

/// State owned exclusively by one orchestration run.
///
/// Only the controller mutates it, and only at round boundaries. Worker tasks
/// return their results instead of writing here.
#[derive(Debug)]
pub struct OverallState {
    chunks: Vec<Chunk>,
    summaries: Vec<SummaryItem>,
    working_set: WorkingSet,
    flashcards: Option<FlashcardSet>,
    phase: Phase,
    round: u32,
}

impl OverallState {
    /// Creates the state of a fresh run.
    pub fn new(chunks: Vec<Chunk>) -> Self {
        Self {
            chunks,
            summaries: Vec::new(),
            working_set: WorkingSet::default(),
            flashcards: None,
            phase: Phase::Start,
            round: 0,
        }
    }

    /// Moves the run to the next phase.
    pub fn transition(&mut self, next: Phase) -> RunResult<()> {
        if !self.phase.can_transition_to(next) {
            return Err(RunError::Internal(format!(
                "illegal phase transition {} -> {}",
                self.phase, next
            )));
        }
        tracing::debug!(
            target: TRACING_TARGET,
            from = %self.phase,
            to = %next,
            round = self.round,
            "Phase transition"
        );
        self.phase = next;
        Ok(())
    }

    /// Returns the current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns the input chunks.
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Returns the accumulated leaf summaries.
    pub fn summaries(&self) -> &[SummaryItem] {
        &self.summaries
    }

    /// Appends gathered leaf summaries.
    pub fn append_summaries(&mut self, summaries: impl IntoIterator<Item = SummaryItem>) {
        self.summaries.extend(summaries);
    }

    /// Builds the initial working set from the accumulated summaries.
    ///
    /// Leaf summaries are ordered by source chunk so the working set follows
    /// input order regardless of completion order.
    pub fn seed_working_set(&mut self) {
        let mut items = self.summaries.clone();
        items.sort_by_key(|item| item.sources.first().copied());
        self.working_set = WorkingSet::new(items);
    }

    /// Returns the current working set.
    pub fn working_set(&self) -> &WorkingSet {
        &self.working_set
    }

    /// Replaces the working set with the committed output of a round.
    pub fn replace_working_set(&mut self, working_set: WorkingSet) {
        self.working_set = working_set;
    }

    /// Returns the number of collapse rounds started so far.
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Starts the next collapse round and returns its number.
    pub fn next_round(&mut self) -> u32 {
        self.round += 1;
        self.round
    }

    /// Stores the terminal artifact.
    pub fn set_flashcards(&mut self, flashcards: FlashcardSet) {
        self.flashcards = Some(flashcards);
    }

    /// Takes the terminal artifact, if the run produced one.
    pub fn take_flashcards(&mut self) -> Option<FlashcardSet> {
        self.flashcards.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let mut state = OverallState::new(Chunk::sequence(["a"]));
        for phase in [
            Phase::MapDispatch,
            Phase::MapGather,
            Phase::Decide,
            Phase::Collapse,
            Phase::Decide,
            Phase::FinalReduce,
            Phase::Done,
        ] {
            state.transition(phase).unwrap();
        }
        assert!(state.phase().is_terminal());
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(Phase::MapDispatch.to_string(), "map_dispatch");
        assert_eq!(Phase::FinalReduce.as_ref(), "final_reduce");
        assert!(Phase::Failed.is_terminal());
        assert!(!Phase::Decide.is_terminal());
    }

    #[test]
    fn test_illegal_transitions() {
        let mut state = OverallState::new(Vec::new());
        assert!(state.transition(Phase::Decide).is_err());
        state.transition(Phase::Failed).unwrap();
        assert!(state.transition(Phase::Failed).is_err());
        assert!(!Phase::Collapse.can_transition_to(Phase::FinalReduce));
    }

    #[test]
    fn test_seed_orders_by_source() {
        let chunks = Chunk::sequence(["a", "b", "c"]);
        let mut state = OverallState::new(chunks.clone());
        state.append_summaries([
            SummaryItem::leaf(&chunks[2], "c"),
            SummaryItem::leaf(&chunks[0], "a"),
            SummaryItem::leaf(&chunks[1], "b"),
        ]);
        state.seed_working_set();

        let texts: Vec<_> = state.working_set().iter().map(|i| i.text.as_str()).collect();
        assert_eq!(texts, ["a", "b", "c"]);
    }
}
