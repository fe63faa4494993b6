//! C# rewrite operations.
//!
//! Each operation is a [`SourceVisitor`](crate::visitor::SourceVisitor)
//! that can be added to a [`VisitorPipeline`](crate::visitor::VisitorPipeline).

pub mod resources_ex;

pub use resources_ex::{ResourcesExContext, ResourcesExSourceVisitor};
