//! Call wrappers for the three model-facing stages of a run.
//!
//! - [`LeafExtractor`] - one extract call per input chunk
//! - [`CollapseReducer`] - one collapse call per batch, with singleton pass-through
//! - [`FinalReducer`] - the single reduce-to-flashcards call

mod collapse;
mod extract;
mod reduce;

pub use collapse::CollapseReducer;
pub use extract::LeafExtractor;
pub use reduce::FinalReducer;
