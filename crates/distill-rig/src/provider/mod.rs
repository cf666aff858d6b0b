//! Completion providers backed by rig.

mod completion;
mod credentials;
mod model;

pub use completion::{CompletionProvider, Sampling};
pub use credentials::{ApiKeyCredentials, Credentials};
pub use model::{
    AnthropicModel, CompletionModel, GeminiCompletionModel, OpenAiCompletionModel, ProviderKind,
};
