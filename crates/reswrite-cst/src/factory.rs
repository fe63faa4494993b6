// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Constructors for synthesized nodes.
//!
//! Synthesized tokens carry no trivia unless stated otherwise.

use std::sync::Arc;

use crate::nodes::{Argument, ArgumentList, Invocation, MemberAccess, Node};
use crate::tokenizer::{Token, TokenKind, Trivia};

/// A simple name such as `Res`.
pub fn identifier_name(text: &str) -> Node {
    Node::IdentifierName(Arc::new(Token::new(TokenKind::Identifier, text)))
}

/// A predefined type keyword such as `string`.
pub fn predefined_type(keyword: &str) -> Node {
    Node::PredefinedType(Arc::new(Token::new(TokenKind::Keyword, keyword)))
}

/// `expression.name`
pub fn simple_member_access(expression: Node, name: &str) -> Node {
    Node::MemberAccess(Arc::new(MemberAccess {
        expression,
        operator: punct("."),
        name: Arc::new(Token::new(TokenKind::Identifier, name)),
    }))
}

/// An argument holding a single expression.
pub fn argument(expression: Node) -> Arc<Argument> {
    Arc::new(Argument {
        elements: vec![expression],
    })
}

/// A `,` separator followed by a single space.
pub fn comma() -> Token {
    punct(",").with_trailing_trivia(vec![Trivia::whitespace(" ")])
}

/// `(a, b, c)` with [`comma`] separators.
pub fn argument_list(arguments: Vec<Arc<Argument>>) -> Arc<ArgumentList> {
    let separators = (1..arguments.len()).map(|_| comma()).collect();
    Arc::new(ArgumentList {
        open_paren: punct("("),
        arguments,
        separators,
        close_paren: punct(")"),
    })
}

/// `expression(arguments)`
pub fn invocation(expression: Node, argument_list: Arc<ArgumentList>) -> Node {
    Node::Invocation(Arc::new(Invocation {
        expression,
        argument_list,
    }))
}

fn punct(text: &str) -> Token {
    Token::new(TokenKind::Punctuation, text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_a_call() {
        let target = simple_member_access(predefined_type("string"), "Format");
        let args = argument_list(vec![
            argument(simple_member_access(identifier_name("Res"), "Culture")),
            argument(identifier_name("x")),
        ]);
        assert_eq!(
            invocation(target, args).to_full_text(),
            "string.Format(Res.Culture, x)"
        );
    }

    #[test]
    fn empty_argument_list() {
        assert_eq!(Node::ArgumentList(argument_list(Vec::new())).to_full_text(), "()");
    }
}
