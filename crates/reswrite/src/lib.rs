//! reswrite - rewrites legacy resource format calls in C# solutions.
//!
//! This crate provides the CLI binary. The run loop lives in [`cli`]; the
//! rewrite itself is in `reswrite-csharp`.

pub mod cli;

pub use reswrite_core::error::{OutputErrorCode, ReswriteError};
pub use reswrite_core::output::{ErrorResponse, RunSummary, SCHEMA_VERSION};
