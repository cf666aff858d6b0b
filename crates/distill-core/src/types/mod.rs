//! Data model shared by the orchestrator and the model boundary.

mod chunk;
mod flashcard;
mod state;
mod summary;
mod working_set;

pub use chunk::Chunk;
pub use flashcard::FlashcardSet;
pub use state::{OverallState, Phase};
pub use summary::{Metadata, SummaryItem};
pub use working_set::WorkingSet;
