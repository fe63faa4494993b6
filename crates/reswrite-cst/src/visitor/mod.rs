// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Visitor infrastructure for syntax tree traversal.
//!
//! # Traversal Order
//!
//! - **Depth-first, pre-order** for `visit_*` methods
//! - **Post-order** for `leave_node`
//! - Children are visited in source order
//!
//! Every callback receives the [`NodePath`](crate::NodePath) of the node, so a
//! visitor can record positions and edit the tree afterwards with
//! [`SyntaxTree::replace_node`](crate::SyntaxTree::replace_node).
//!
//! ```
//! use reswrite_cst::parse_compilation_unit;
//! use reswrite_cst::visitor::InvocationCollector;
//!
//! let tree = parse_compilation_unit("Outer(Res.AFormat(1));").unwrap();
//! let sites = InvocationCollector::collect(&tree);
//! assert_eq!(sites.len(), 2);
//! ```

mod dispatch;
mod invocation;
mod traits;

pub use dispatch::{walk_node, walk_tree};
pub use invocation::{InvocationCollector, InvocationSite};
pub use traits::{VisitResult, Visitor};
