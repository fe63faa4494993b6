// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! InvocationCollector visitor for call site extraction.
//!
//! Collects every invocation in a tree together with its path, in pre-order:
//! an outer call comes before the calls nested in its target or arguments,
//! and siblings come in source order.

use std::sync::Arc;

use super::dispatch::walk_tree;
use super::traits::{VisitResult, Visitor};
use crate::nodes::{Invocation, Node, NodePath, SyntaxTree};

/// One invocation and where it sits in the tree.
#[derive(Debug, Clone)]
pub struct InvocationSite {
    pub path: NodePath,
    pub invocation: Arc<Invocation>,
}

/// A visitor that collects invocation sites.
#[derive(Debug, Default)]
pub struct InvocationCollector {
    sites: Vec<InvocationSite>,
}

impl InvocationCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect all invocation sites of `tree` in pre-order.
    pub fn collect(tree: &SyntaxTree) -> Vec<InvocationSite> {
        let mut collector = Self::new();
        walk_tree(&mut collector, tree);
        collector.sites
    }
}

impl Visitor for InvocationCollector {
    fn visit_node(&mut self, node: &Node, path: &NodePath) -> VisitResult {
        if let Node::Invocation(invocation) = node {
            self.sites.push(InvocationSite {
                path: path.clone(),
                invocation: invocation.clone(),
            });
        }
        VisitResult::Continue
    }
}
