//! C# language support for reswrite.
//!
//! This crate provides:
//! - [`Document`]: one source file's tree plus metadata, compared by identity
//! - [`Compilation`] and [`SemanticModel`]: type declarations and their
//!   attributes, queried per tree snapshot
//! - [`SourceVisitor`] and [`VisitorPipeline`]: document transformations
//! - [`ops::resources_ex`]: the legacy resource format call rewrite
//! - [`project`]: loading a project's documents from disk

pub mod compilation;
pub mod document;
pub mod ops;
pub mod project;
pub mod visitor;

pub use compilation::{AttributeData, Compilation, Literal, SemanticModel, TypeSymbol};
pub use document::{Document, DocumentId};
pub use visitor::{PipelineOutcome, SourceVisitor, VisitError, VisitorPipeline};
