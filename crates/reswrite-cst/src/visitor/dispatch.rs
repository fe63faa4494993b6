// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Walk functions driving a [`Visitor`] over a tree.

use super::traits::{VisitResult, Visitor};
use crate::nodes::{Node, NodePath, SyntaxTree};

/// Walk a whole tree from its root.
pub fn walk_tree<V: Visitor>(visitor: &mut V, tree: &SyntaxTree) {
    walk_node(visitor, tree.root(), &NodePath::root());
}

/// Walk `node` and its descendants. Returns [`VisitResult::Stop`] if the
/// visitor stopped the traversal.
pub fn walk_node<V: Visitor>(visitor: &mut V, node: &Node, path: &NodePath) -> VisitResult {
    let mut result = visitor.visit_node(node, path);
    if result == VisitResult::Continue {
        result = match node {
            Node::Invocation(inv) => visitor.visit_invocation(inv, path),
            Node::MemberAccess(access) => visitor.visit_member_access(access, path),
            _ => VisitResult::Continue,
        };
    }

    match result {
        VisitResult::Stop => return VisitResult::Stop,
        VisitResult::SkipChildren => {}
        VisitResult::Continue => {
            for (index, child) in node.children().iter().enumerate() {
                if walk_node(visitor, child, &path.child(index)) == VisitResult::Stop {
                    return VisitResult::Stop;
                }
            }
        }
    }

    visitor.leave_node(node, path);
    VisitResult::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{Invocation, NodeKind};
    use crate::parse_compilation_unit;

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
        stop_at_invocation: bool,
    }

    impl Visitor for Recorder {
        fn visit_node(&mut self, node: &Node, path: &NodePath) -> VisitResult {
            if matches!(node.kind(), NodeKind::Invocation | NodeKind::CompilationUnit) {
                self.events.push(format!("visit {}", path));
            }
            VisitResult::Continue
        }

        fn visit_invocation(&mut self, _node: &Invocation, _path: &NodePath) -> VisitResult {
            if self.stop_at_invocation {
                VisitResult::Stop
            } else {
                VisitResult::Continue
            }
        }

        fn leave_node(&mut self, node: &Node, path: &NodePath) {
            if matches!(node.kind(), NodeKind::Invocation | NodeKind::CompilationUnit) {
                self.events.push(format!("leave {}", path));
            }
        }
    }

    #[test]
    fn pre_order_visit_post_order_leave() {
        let tree = parse_compilation_unit("f(g());").unwrap();
        let mut recorder = Recorder::default();
        walk_tree(&mut recorder, &tree);
        assert_eq!(
            recorder.events,
            vec![
                "visit /",
                "visit /0",
                "visit /0/1/0/0",
                "leave /0/1/0/0",
                "leave /0",
                "leave /",
            ]
        );
    }

    #[test]
    fn stop_ends_traversal() {
        let tree = parse_compilation_unit("f(g()); h();").unwrap();
        let mut recorder = Recorder {
            stop_at_invocation: true,
            ..Recorder::default()
        };
        walk_tree(&mut recorder, &tree);
        assert_eq!(recorder.events, vec!["visit /", "visit /0"]);
    }
}
