// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! A lossless C# syntax tree for reswrite.
//!
//! The tree keeps every byte of the source: tokens carry their whitespace,
//! comments and preprocessor lines as trivia, and
//! [`SyntaxTree::to_full_text`] reproduces the input exactly. Structure is
//! only recovered where rewrites need it: postfix chains of member accesses
//! and invocations starting at a name. All other code is held as flat token
//! runs inside balanced bracket groups.
//!
//! ```
//! use reswrite_cst::parse_compilation_unit;
//!
//! let source = "class C { string M() => Res.GreetingFormat(name); }\n";
//! let tree = parse_compilation_unit(source).unwrap();
//! assert_eq!(tree.to_full_text(), source);
//! ```

pub mod factory;
pub mod nodes;
pub mod parser;
pub mod tokenizer;
pub mod visitor;

pub use nodes::{
    Argument, ArgumentList, Codegen, CodegenState, CompilationUnit, Group, Invocation,
    MemberAccess, Node, NodeKind, NodePath, SyntaxTree, TreeError,
};
pub use parser::{parse_compilation_unit, ParseError};
pub use tokenizer::{tokenize, Token, TokenKind, TokenizeError, Trivia, TriviaKind};
