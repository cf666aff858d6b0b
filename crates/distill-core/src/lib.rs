#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod engine;
mod error;
pub mod length;
#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub mod mock;
pub mod model;
pub mod stage;
pub mod types;

#[doc(hidden)]
pub mod prelude;

pub use error::{Error, ErrorKind, Result, RunError, RunErrorKind, RunResult};

/// Tracing target for the main library.
pub const TRACING_TARGET: &str = "distill_core";
