#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod error;
mod model;
pub mod prompt;
pub mod provider;
pub mod splitting;

pub use error::{Error, Result};
pub use model::RigModel;

/// Tracing target for the main library.
pub const TRACING_TARGET: &str = "distill_rig";
