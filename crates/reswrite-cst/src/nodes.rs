// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Persistent syntax tree nodes.
//!
//! Nodes are immutable and reference counted. Replacing a node rebuilds only
//! the ancestors on the path to it; every other subtree is shared with the
//! previous tree, which stays valid.
//!
//! The tree only gives structure to the shapes the rewrite engine inspects
//! (invocations, member accesses, names and argument lists). Everything else
//! is kept as flat token runs inside balanced [`Group`]s.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::tokenizer::{Token, Trivia};

// ============================================================================
// Node types
// ============================================================================

/// A node of the syntax tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    CompilationUnit(Arc<CompilationUnit>),
    /// `expression(arguments)`
    Invocation(Arc<Invocation>),
    /// `expression.name`
    MemberAccess(Arc<MemberAccess>),
    /// A simple name that may start an expression.
    IdentifierName(Arc<Token>),
    /// A predefined type keyword such as `string`.
    PredefinedType(Arc<Token>),
    /// `this` or `base`.
    Keyword(Arc<Token>),
    ArgumentList(Arc<ArgumentList>),
    Argument(Arc<Argument>),
    /// Balanced `(...)`, `[...]` or `{...}` that is not an argument list.
    Group(Arc<Group>),
    /// Any other token.
    Token(Arc<Token>),
}

/// Discriminant of a [`Node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    CompilationUnit,
    Invocation,
    MemberAccess,
    IdentifierName,
    PredefinedType,
    Keyword,
    ArgumentList,
    Argument,
    Group,
    Token,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationUnit {
    pub members: Vec<Node>,
    pub end_of_file: Token,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub expression: Node,
    pub argument_list: Arc<ArgumentList>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberAccess {
    pub expression: Node,
    /// The `.` token.
    pub operator: Token,
    pub name: Arc<Token>,
}

/// Parenthesized, comma separated arguments.
///
/// `separators.len()` is `arguments.len() - 1` for well-formed lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentList {
    pub open_paren: Token,
    pub arguments: Vec<Arc<Argument>>,
    pub separators: Vec<Token>,
    pub close_paren: Token,
}

/// One argument: the elements between two separators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    pub elements: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub open: Token,
    pub elements: Vec<Node>,
    pub close: Token,
}

impl Invocation {
    /// The member access target, if the call has one.
    pub fn member_access(&self) -> Option<&MemberAccess> {
        match &self.expression {
            Node::MemberAccess(access) => Some(access),
            _ => None,
        }
    }
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::CompilationUnit(_) => NodeKind::CompilationUnit,
            Node::Invocation(_) => NodeKind::Invocation,
            Node::MemberAccess(_) => NodeKind::MemberAccess,
            Node::IdentifierName(_) => NodeKind::IdentifierName,
            Node::PredefinedType(_) => NodeKind::PredefinedType,
            Node::Keyword(_) => NodeKind::Keyword,
            Node::ArgumentList(_) => NodeKind::ArgumentList,
            Node::Argument(_) => NodeKind::Argument,
            Node::Group(_) => NodeKind::Group,
            Node::Token(_) => NodeKind::Token,
        }
    }

    /// Child nodes in source order. Tokens owned directly by a node
    /// (parentheses, separators, the member access dot) are not children.
    pub fn children(&self) -> Vec<Node> {
        match self {
            Node::CompilationUnit(unit) => unit.members.clone(),
            Node::Invocation(inv) => vec![
                inv.expression.clone(),
                Node::ArgumentList(inv.argument_list.clone()),
            ],
            Node::MemberAccess(access) => vec![
                access.expression.clone(),
                Node::IdentifierName(access.name.clone()),
            ],
            Node::ArgumentList(list) => list.arguments.iter().cloned().map(Node::Argument).collect(),
            Node::Argument(arg) => arg.elements.clone(),
            Node::Group(group) => group.elements.clone(),
            Node::IdentifierName(_) | Node::PredefinedType(_) | Node::Keyword(_) | Node::Token(_) => {
                Vec::new()
            }
        }
    }

    /// The child at `index`.
    pub fn child(&self, index: usize) -> Option<Node> {
        match self {
            Node::CompilationUnit(unit) => unit.members.get(index).cloned(),
            Node::Invocation(inv) => match index {
                0 => Some(inv.expression.clone()),
                1 => Some(Node::ArgumentList(inv.argument_list.clone())),
                _ => None,
            },
            Node::MemberAccess(access) => match index {
                0 => Some(access.expression.clone()),
                1 => Some(Node::IdentifierName(access.name.clone())),
                _ => None,
            },
            Node::ArgumentList(list) => list.arguments.get(index).cloned().map(Node::Argument),
            Node::Argument(arg) => arg.elements.get(index).cloned(),
            Node::Group(group) => group.elements.get(index).cloned(),
            _ => None,
        }
    }

    /// A copy of this node with the child at `index` replaced.
    ///
    /// Returns `None` when the index is out of range or the replacement has
    /// a kind that cannot occupy that slot.
    pub fn with_child(&self, index: usize, child: Node) -> Option<Node> {
        match self {
            Node::CompilationUnit(unit) => {
                let mut unit = CompilationUnit::clone(unit);
                *unit.members.get_mut(index)? = child;
                Some(Node::CompilationUnit(Arc::new(unit)))
            }
            Node::Invocation(inv) => {
                let mut inv = Invocation::clone(inv);
                match (index, child) {
                    (0, expression) => inv.expression = expression,
                    (1, Node::ArgumentList(list)) => inv.argument_list = list,
                    _ => return None,
                }
                Some(Node::Invocation(Arc::new(inv)))
            }
            Node::MemberAccess(access) => {
                let mut access = MemberAccess::clone(access);
                match (index, child) {
                    (0, expression) => access.expression = expression,
                    (1, Node::IdentifierName(name)) => access.name = name,
                    _ => return None,
                }
                Some(Node::MemberAccess(Arc::new(access)))
            }
            Node::ArgumentList(list) => {
                let Node::Argument(arg) = child else {
                    return None;
                };
                let mut list = ArgumentList::clone(list);
                *list.arguments.get_mut(index)? = arg;
                Some(Node::ArgumentList(Arc::new(list)))
            }
            Node::Argument(arg) => {
                let mut arg = Argument::clone(arg);
                *arg.elements.get_mut(index)? = child;
                Some(Node::Argument(Arc::new(arg)))
            }
            Node::Group(group) => {
                let mut group = Group::clone(group);
                *group.elements.get_mut(index)? = child;
                Some(Node::Group(Arc::new(group)))
            }
            _ => None,
        }
    }

    /// Replace the descendant at `path` (relative to this node).
    pub fn replace_at(&self, path: &[usize], replacement: Node) -> Option<Node> {
        match path.split_first() {
            None => Some(replacement),
            Some((&index, rest)) => {
                let child = self.child(index)?.replace_at(rest, replacement)?;
                self.with_child(index, child)
            }
        }
    }

    /// The descendant at `path` (relative to this node).
    pub fn descendant(&self, path: &[usize]) -> Option<Node> {
        path.iter()
            .try_fold(self.clone(), |node, &index| node.child(index))
    }

    /// The first token of this node, if it has any.
    pub fn first_token(&self) -> Option<&Token> {
        match self {
            Node::CompilationUnit(unit) => unit
                .members
                .first()
                .and_then(Node::first_token)
                .or(Some(&unit.end_of_file)),
            Node::Invocation(inv) => inv.expression.first_token(),
            Node::MemberAccess(access) => access.expression.first_token(),
            Node::IdentifierName(token)
            | Node::PredefinedType(token)
            | Node::Keyword(token)
            | Node::Token(token) => Some(token),
            Node::ArgumentList(list) => Some(&list.open_paren),
            Node::Argument(arg) => arg.elements.first().and_then(Node::first_token),
            Node::Group(group) => Some(&group.open),
        }
    }

    /// Call `f` for every token of this node in source order.
    pub fn for_each_token(&self, f: &mut impl FnMut(&Token)) {
        match self {
            Node::CompilationUnit(unit) => {
                for member in &unit.members {
                    member.for_each_token(f);
                }
                f(&unit.end_of_file);
            }
            Node::Invocation(inv) => {
                inv.expression.for_each_token(f);
                Node::ArgumentList(inv.argument_list.clone()).for_each_token(f);
            }
            Node::MemberAccess(access) => {
                access.expression.for_each_token(f);
                f(&access.operator);
                f(&access.name);
            }
            Node::IdentifierName(token)
            | Node::PredefinedType(token)
            | Node::Keyword(token)
            | Node::Token(token) => f(token),
            Node::ArgumentList(list) => {
                f(&list.open_paren);
                for (i, arg) in list.arguments.iter().enumerate() {
                    if i > 0 {
                        if let Some(separator) = list.separators.get(i - 1) {
                            f(separator);
                        }
                    }
                    for element in &arg.elements {
                        element.for_each_token(f);
                    }
                }
                for separator in list.separators.iter().skip(list.arguments.len().saturating_sub(1)) {
                    f(separator);
                }
                f(&list.close_paren);
            }
            Node::Argument(arg) => {
                for element in &arg.elements {
                    element.for_each_token(f);
                }
            }
            Node::Group(group) => {
                f(&group.open);
                for element in &group.elements {
                    element.for_each_token(f);
                }
                f(&group.close);
            }
        }
    }

    /// Leading trivia of the first token.
    pub fn leading_trivia(&self) -> &[Trivia] {
        self.first_token()
            .map(|t| t.leading_trivia.as_slice())
            .unwrap_or(&[])
    }

    pub fn has_leading_trivia(&self) -> bool {
        !self.leading_trivia().is_empty()
    }

    /// A copy of this node whose first token carries `trivia` as leading trivia.
    pub fn with_leading_trivia(&self, trivia: Vec<Trivia>) -> Node {
        let retoken = |token: &Token| Arc::new(token.clone().with_leading_trivia(trivia.clone()));
        match self {
            Node::CompilationUnit(unit) => {
                let mut unit = CompilationUnit::clone(unit);
                match unit.members.first_mut() {
                    Some(first) => *first = first.with_leading_trivia(trivia),
                    None => unit.end_of_file.leading_trivia = trivia,
                }
                Node::CompilationUnit(Arc::new(unit))
            }
            Node::Invocation(inv) => {
                let mut inv = Invocation::clone(inv);
                inv.expression = inv.expression.with_leading_trivia(trivia);
                Node::Invocation(Arc::new(inv))
            }
            Node::MemberAccess(access) => {
                let mut access = MemberAccess::clone(access);
                access.expression = access.expression.with_leading_trivia(trivia);
                Node::MemberAccess(Arc::new(access))
            }
            Node::IdentifierName(token) => Node::IdentifierName(retoken(token)),
            Node::PredefinedType(token) => Node::PredefinedType(retoken(token)),
            Node::Keyword(token) => Node::Keyword(retoken(token)),
            Node::Token(token) => Node::Token(retoken(token)),
            Node::ArgumentList(list) => {
                let mut list = ArgumentList::clone(list);
                list.open_paren.leading_trivia = trivia;
                Node::ArgumentList(Arc::new(list))
            }
            Node::Argument(arg) => {
                let mut arg = Argument::clone(arg);
                if let Some(first) = arg.elements.first_mut() {
                    *first = first.with_leading_trivia(trivia);
                }
                Node::Argument(Arc::new(arg))
            }
            Node::Group(group) => {
                let mut group = Group::clone(group);
                group.open.leading_trivia = trivia;
                Node::Group(Arc::new(group))
            }
        }
    }

    pub fn without_leading_trivia(&self) -> Node {
        if self.has_leading_trivia() {
            self.with_leading_trivia(Vec::new())
        } else {
            self.clone()
        }
    }

    /// Source text of this node including all trivia.
    pub fn to_full_text(&self) -> String {
        let mut state = CodegenState::default();
        self.codegen(&mut state);
        state.to_string()
    }
}

// ============================================================================
// Trees and paths
// ============================================================================

/// Position of a node as child indices from the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// The path of this node's `index`th child.
    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

impl From<Vec<usize>> for NodePath {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("/")?;
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{}", index)?;
        }
        Ok(())
    }
}

/// Errors raised by tree edits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// The path does not address a node, or the replacement cannot occupy it.
    #[error("cannot replace node at {path}")]
    InvalidPath { path: NodePath },
}

/// One immutable snapshot of a document's tree.
///
/// Snapshots are compared by identity: two `Arc<SyntaxTree>` values are the
/// same snapshot only if `Arc::ptr_eq` holds.
#[derive(Debug, PartialEq, Eq)]
pub struct SyntaxTree {
    root: Node,
}

impl SyntaxTree {
    pub fn new(root: Node) -> Arc<Self> {
        Arc::new(Self { root })
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn node_at(&self, path: &NodePath) -> Option<Node> {
        self.root.descendant(path.as_slice())
    }

    /// A new snapshot with the node at `path` replaced. `self` is unchanged.
    pub fn replace_node(&self, path: &NodePath, node: Node) -> Result<Arc<Self>, TreeError> {
        self.root
            .replace_at(path.as_slice(), node)
            .map(SyntaxTree::new)
            .ok_or_else(|| TreeError::InvalidPath { path: path.clone() })
    }

    pub fn to_full_text(&self) -> String {
        self.root.to_full_text()
    }
}

// ============================================================================
// Codegen
// ============================================================================

/// Accumulates generated source text.
#[derive(Debug, Default)]
pub struct CodegenState {
    text: String,
}

impl CodegenState {
    pub fn add_token(&mut self, text: &str) {
        self.text.push_str(text);
    }
}

impl fmt::Display for CodegenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Render a node back to source text.
pub trait Codegen {
    fn codegen(&self, state: &mut CodegenState);
}

impl Codegen for Trivia {
    fn codegen(&self, state: &mut CodegenState) {
        state.add_token(&self.text);
    }
}

impl Codegen for Token {
    fn codegen(&self, state: &mut CodegenState) {
        for trivia in &self.leading_trivia {
            trivia.codegen(state);
        }
        state.add_token(&self.text);
        for trivia in &self.trailing_trivia {
            trivia.codegen(state);
        }
    }
}

impl Codegen for ArgumentList {
    fn codegen(&self, state: &mut CodegenState) {
        self.open_paren.codegen(state);
        for (i, arg) in self.arguments.iter().enumerate() {
            if i > 0 {
                if let Some(separator) = self.separators.get(i - 1) {
                    separator.codegen(state);
                }
            }
            arg.codegen(state);
        }
        // A trailing separator (`f(a,)`) has no argument after it.
        for separator in self.separators.iter().skip(self.arguments.len().saturating_sub(1)) {
            separator.codegen(state);
        }
        self.close_paren.codegen(state);
    }
}

impl Codegen for Argument {
    fn codegen(&self, state: &mut CodegenState) {
        for element in &self.elements {
            element.codegen(state);
        }
    }
}

impl Codegen for Node {
    fn codegen(&self, state: &mut CodegenState) {
        match self {
            Node::CompilationUnit(unit) => {
                for member in &unit.members {
                    member.codegen(state);
                }
                unit.end_of_file.codegen(state);
            }
            Node::Invocation(inv) => {
                inv.expression.codegen(state);
                inv.argument_list.codegen(state);
            }
            Node::MemberAccess(access) => {
                access.expression.codegen(state);
                access.operator.codegen(state);
                access.name.codegen(state);
            }
            Node::IdentifierName(token)
            | Node::PredefinedType(token)
            | Node::Keyword(token)
            | Node::Token(token) => token.codegen(state),
            Node::ArgumentList(list) => list.codegen(state),
            Node::Argument(arg) => arg.codegen(state),
            Node::Group(group) => {
                group.open.codegen(state);
                for element in &group.elements {
                    element.codegen(state);
                }
                group.close.codegen(state);
            }
        }
    }
}
