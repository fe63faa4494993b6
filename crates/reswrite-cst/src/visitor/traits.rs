// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Visitor trait definitions.

use crate::nodes::{Invocation, MemberAccess, Node, NodePath};

/// Result of visiting a node - controls traversal behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VisitResult {
    /// Continue traversal into children.
    #[default]
    Continue,

    /// Skip children, continue with siblings. `leave_node` is still called.
    SkipChildren,

    /// Stop traversal entirely. No further callbacks are made.
    Stop,
}

/// Read-only syntax tree visitor.
///
/// `visit_node` is called for every node; the kind-specific methods are
/// called right after it for the matching kinds. Traversal descends only
/// when both return [`VisitResult::Continue`].
pub trait Visitor {
    fn visit_node(&mut self, _node: &Node, _path: &NodePath) -> VisitResult {
        VisitResult::Continue
    }

    fn visit_invocation(&mut self, _node: &Invocation, _path: &NodePath) -> VisitResult {
        VisitResult::Continue
    }

    fn visit_member_access(&mut self, _node: &MemberAccess, _path: &NodePath) -> VisitResult {
        VisitResult::Continue
    }

    fn leave_node(&mut self, _node: &Node, _path: &NodePath) {}
}
