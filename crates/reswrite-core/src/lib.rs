//! Core infrastructure for reswrite.
//!
//! This crate provides the language-agnostic glue around the rewrite engine:
//! - Error types and exit codes
//! - Configuration binding (`appconfig.json`)
//! - Project and file filters
//! - Solution and project inventory
//! - Output path policy and JSON responses

pub mod config;
pub mod error;
pub mod filter;
pub mod output;
pub mod workspace;
