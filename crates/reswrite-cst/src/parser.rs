// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Structural parser for C# compilation units.
//!
//! The parser recognizes postfix chains that start at a name:
//!
//! ```text
//! chain  := start ( "." identifier | argument_list )*
//! start  := identifier | predefined-type | "this" | "base"
//! ```
//!
//! Everything else is kept as flat tokens, with balanced brackets grouped so
//! that chains nested anywhere (argument lists, initializers, method bodies)
//! are still found. A name that directly follows `.`, `?.`, `::` or `->` is
//! part of some larger expression the parser does not model, so it never
//! starts a chain.
//!
//! Generic type arguments are not modeled: `Foo<T>(x)` parses as the name
//! `Foo`, the tokens `<T>` and a group `(x)`. A `<` after a name is taken as
//! a type argument list when the tokens up to its matching `>` can only be
//! one, so commas inside it never separate arguments. After `new`, the type
//! name is consumed as plain tokens so the constructor arguments are never
//! mistaken for an invocation.

use std::collections::VecDeque;
use std::sync::Arc;

use thiserror::Error;

use crate::nodes::{
    Argument, ArgumentList, CompilationUnit, Group, Invocation, MemberAccess, Node, SyntaxTree,
};
use crate::tokenizer::{is_predefined_type, tokenize, Token, TokenKind, TokenizeError};

/// Errors raised while parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Tokenize(#[from] TokenizeError),

    /// A closing bracket with no matching open bracket.
    #[error("unexpected '{found}' at byte {offset}")]
    UnexpectedDelimiter { found: String, offset: usize },

    /// End of file inside an open bracket.
    #[error("expected '{expected}' to close the bracket opened at byte {offset}")]
    UnclosedDelimiter { expected: String, offset: usize },
}

/// Parse a whole source file.
pub fn parse_compilation_unit(source: &str) -> Result<Arc<SyntaxTree>, ParseError> {
    let tokens = tokenize(source)?;
    let unit = Parser::new(tokens).parse_unit()?;
    Ok(SyntaxTree::new(Node::CompilationUnit(Arc::new(unit))))
}

/// Where a run of elements ends.
#[derive(Debug, Clone, Copy)]
enum Stop {
    EndOfFile,
    /// Before the given closing bracket.
    Close { text: &'static str, opened_at: usize },
    /// Before `,` or `)` of an argument list.
    Argument { opened_at: usize },
}

struct Parser {
    tokens: VecDeque<Token>,
    /// Byte offset of the next token, including its leading trivia.
    offset: usize,
    /// Text of the last consumed token.
    previous: Option<String>,
    previous_kind: Option<TokenKind>,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens: tokens.into(),
            offset: 0,
            previous: None,
            previous_kind: None,
        }
    }

    fn parse_unit(mut self) -> Result<CompilationUnit, ParseError> {
        let members = self.parse_elements(Stop::EndOfFile)?;
        let end_of_file = self.tokens.pop_front().unwrap_or_else(Token::end_of_file);
        Ok(CompilationUnit {
            members,
            end_of_file,
        })
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.front().filter(|t| t.kind != TokenKind::EndOfFile)
    }

    fn peek_nth(&self, n: usize) -> Option<&Token> {
        self.tokens.get(n).filter(|t| t.kind != TokenKind::EndOfFile)
    }

    fn peek_is_punct(&self, text: &str) -> bool {
        self.peek().is_some_and(|t| t.is_punct(text))
    }

    /// Byte offset of the next token's text.
    fn token_offset(&self) -> usize {
        self.offset + self.tokens.front().map_or(0, Token::leading_width)
    }

    fn bump(&mut self) -> Token {
        let token = self.tokens.pop_front().unwrap_or_else(Token::end_of_file);
        self.offset += token.full_width();
        self.previous = Some(token.text.clone());
        self.previous_kind = Some(token.kind);
        token
    }

    fn follows_member_operator(&self) -> bool {
        matches!(self.previous.as_deref(), Some("." | "?." | "::" | "->"))
    }

    /// Number of tokens in the type argument list starting at the next
    /// token, if the tokens up to the matching `>` can only be one.
    fn type_argument_list_len(&self) -> Option<usize> {
        let mut depth = 0usize;
        for (i, token) in self.tokens.iter().enumerate() {
            match (token.kind, token.text.as_str()) {
                (TokenKind::Punctuation, "<") => depth += 1,
                (TokenKind::Punctuation, ">") => {
                    depth -= 1;
                    if depth == 0 {
                        return self
                            .peek_nth(i + 1)
                            .is_none_or(follows_type_arguments)
                            .then_some(i + 1);
                    }
                }
                (TokenKind::Identifier, _) => {}
                (TokenKind::Keyword, text) if is_predefined_type(text) => {}
                (TokenKind::Punctuation, "," | "." | "::" | "?" | "[" | "]" | "*") => {}
                _ => return None,
            }
        }
        None
    }

    fn parse_elements(&mut self, stop: Stop) -> Result<Vec<Node>, ParseError> {
        let mut elements = Vec::new();
        loop {
            let Some(token) = self.peek() else {
                return match stop {
                    Stop::EndOfFile => Ok(elements),
                    Stop::Close { text, opened_at } => Err(ParseError::UnclosedDelimiter {
                        expected: text.to_string(),
                        offset: opened_at,
                    }),
                    Stop::Argument { opened_at } => Err(ParseError::UnclosedDelimiter {
                        expected: ")".to_string(),
                        offset: opened_at,
                    }),
                };
            };

            if token.kind == TokenKind::Punctuation {
                match (token.text.as_str(), stop) {
                    (",", Stop::Argument { .. }) => return Ok(elements),
                    (")", Stop::Argument { .. }) => return Ok(elements),
                    (close, Stop::Close { text, .. }) if close == text => return Ok(elements),
                    (")" | "]" | "}", _) => {
                        return Err(ParseError::UnexpectedDelimiter {
                            found: token.text.clone(),
                            offset: self.token_offset(),
                        })
                    }
                    ("(" | "[" | "{", _) => {
                        elements.push(self.parse_group()?);
                        continue;
                    }
                    _ => {}
                }
            }

            if token.is_punct("<") && self.previous_kind == Some(TokenKind::Identifier) {
                if let Some(len) = self.type_argument_list_len() {
                    for _ in 0..len {
                        elements.push(Node::Token(Arc::new(self.bump())));
                    }
                    continue;
                }
            }

            if token.kind == TokenKind::Keyword && token.text == "new" {
                elements.push(Node::Token(Arc::new(self.bump())));
                self.parse_created_type(&mut elements);
            } else if starts_chain(token) && !self.follows_member_operator() {
                let chain = self.parse_chain()?;
                elements.push(chain);
            } else {
                elements.push(Node::Token(Arc::new(self.bump())));
            }
        }
    }

    /// Consume the type name after `new` as plain tokens.
    fn parse_created_type(&mut self, elements: &mut Vec<Node>) {
        let mut angle_depth = 0usize;
        while let Some(token) = self.peek() {
            let take = match token.kind {
                TokenKind::Identifier => true,
                TokenKind::Keyword => is_predefined_type(&token.text),
                TokenKind::Punctuation => match token.text.as_str() {
                    "." | "::" | "?" => true,
                    "<" => {
                        angle_depth += 1;
                        true
                    }
                    ">" if angle_depth > 0 => {
                        angle_depth -= 1;
                        true
                    }
                    "," => angle_depth > 0,
                    _ => false,
                },
                _ => false,
            };
            if !take {
                break;
            }
            elements.push(Node::Token(Arc::new(self.bump())));
        }
    }

    fn parse_chain(&mut self) -> Result<Node, ParseError> {
        let first = Arc::new(self.bump());
        let mut expression = match first.kind {
            TokenKind::Keyword if is_predefined_type(&first.text) => Node::PredefinedType(first),
            TokenKind::Keyword => Node::Keyword(first),
            _ => Node::IdentifierName(first),
        };

        loop {
            let dotted_name = self.peek_is_punct(".")
                && self
                    .peek_nth(1)
                    .is_some_and(|t| t.kind == TokenKind::Identifier);
            if dotted_name {
                let operator = self.bump();
                let name = Arc::new(self.bump());
                expression = Node::MemberAccess(Arc::new(MemberAccess {
                    expression,
                    operator,
                    name,
                }));
            } else if self.peek_is_punct("(") {
                let argument_list = self.parse_argument_list()?;
                expression = Node::Invocation(Arc::new(Invocation {
                    expression,
                    argument_list,
                }));
            } else {
                return Ok(expression);
            }
        }
    }

    fn parse_argument_list(&mut self) -> Result<Arc<ArgumentList>, ParseError> {
        let opened_at = self.token_offset();
        let open_paren = self.bump();
        let mut arguments = Vec::new();
        let mut separators = Vec::new();

        if self.peek_is_punct(")") {
            let close_paren = self.bump();
            return Ok(Arc::new(ArgumentList {
                open_paren,
                arguments,
                separators,
                close_paren,
            }));
        }

        loop {
            let elements = self.parse_elements(Stop::Argument { opened_at })?;
            arguments.push(Arc::new(Argument { elements }));
            if self.peek_is_punct(",") {
                separators.push(self.bump());
            } else {
                // parse_elements only returns before `,` or `)`
                let close_paren = self.bump();
                return Ok(Arc::new(ArgumentList {
                    open_paren,
                    arguments,
                    separators,
                    close_paren,
                }));
            }
        }
    }

    fn parse_group(&mut self) -> Result<Node, ParseError> {
        let opened_at = self.token_offset();
        let open = self.bump();
        let text = match open.text.as_str() {
            "(" => ")",
            "[" => "]",
            _ => "}",
        };
        let elements = self.parse_elements(Stop::Close { text, opened_at })?;
        let close = self.bump();
        Ok(Node::Group(Arc::new(Group {
            open,
            elements,
            close,
        })))
    }
}

/// Tokens that may follow the `>` of a type argument list.
fn follows_type_arguments(token: &Token) -> bool {
    token.kind == TokenKind::Punctuation
        && matches!(
            token.text.as_str(),
            "(" | ")" | "]" | "}" | ":" | ";" | "," | "." | "?." | "?" | "==" | "!="
        )
}

fn starts_chain(token: &Token) -> bool {
    match token.kind {
        TokenKind::Identifier => true,
        TokenKind::Keyword => {
            is_predefined_type(&token.text) || token.text == "this" || token.text == "base"
        }
        _ => false,
    }
}
