// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Lossless tokenizer for C# source text.
//!
//! Every byte of the input ends up either in a token's text or in one of its
//! trivia lists, so concatenating all tokens with their trivia reproduces the
//! source exactly.
//!
//! Trivia attachment follows the usual convention:
//! - trailing trivia runs up to and including the first end-of-line
//! - everything after that (indentation, comments, blank lines, preprocessor
//!   lines) is leading trivia of the next token
//! - trivia after the last token belongs to the end-of-file token
//!
//! Regular, verbatim and raw string literals are single tokens. An
//! interpolated string is split into a start token, text tokens, and for
//! each hole its braces and the tokens of the hole expression, so calls
//! inside holes are visible to the parser.
//!
//! Conditional compilation keeps the first branch whose condition is not the
//! literal `false` or `0`; the other branches become disabled-text trivia.

use thiserror::Error;

/// Kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Identifier,
    Keyword,
    StringLiteral,
    CharLiteral,
    NumericLiteral,
    Punctuation,
    /// `$"`, `$@"`, `@$"` or `$$"""` opening an interpolated string.
    InterpolatedStringStart,
    /// Literal text between holes, or the format clause of a hole.
    InterpolatedStringText,
    /// The closing quote(s) of an interpolated string.
    InterpolatedStringEnd,
    EndOfFile,
}

/// Kind of a trivia piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriviaKind {
    Whitespace,
    EndOfLine,
    SingleLineComment,
    MultiLineComment,
    /// A preprocessor line such as `#region` or `#if DEBUG`.
    Directive,
    /// Source lines of an inactive conditional branch.
    DisabledText,
}

/// A piece of non-semantic text attached to a token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Trivia {
    pub kind: TriviaKind,
    pub text: String,
}

impl Trivia {
    pub fn new(kind: TriviaKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    /// A whitespace trivia piece.
    pub fn whitespace(text: impl Into<String>) -> Self {
        Self::new(TriviaKind::Whitespace, text)
    }
}

/// A token with its surrounding trivia.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub leading_trivia: Vec<Trivia>,
    pub trailing_trivia: Vec<Trivia>,
}

impl Token {
    /// Create a token without trivia.
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            leading_trivia: Vec::new(),
            trailing_trivia: Vec::new(),
        }
    }

    /// An empty end-of-file token.
    pub fn end_of_file() -> Self {
        Self::new(TokenKind::EndOfFile, "")
    }

    pub fn with_leading_trivia(mut self, trivia: Vec<Trivia>) -> Self {
        self.leading_trivia = trivia;
        self
    }

    pub fn with_trailing_trivia(mut self, trivia: Vec<Trivia>) -> Self {
        self.trailing_trivia = trivia;
        self
    }

    /// The identifier name without a verbatim `@` prefix.
    pub fn value_text(&self) -> &str {
        match self.kind {
            TokenKind::Identifier => self.text.strip_prefix('@').unwrap_or(&self.text),
            _ => &self.text,
        }
    }

    /// Check for a punctuation token with the given text.
    pub fn is_punct(&self, text: &str) -> bool {
        self.kind == TokenKind::Punctuation && self.text == text
    }

    /// Byte length of the leading trivia.
    pub fn leading_width(&self) -> usize {
        self.leading_trivia.iter().map(|t| t.text.len()).sum()
    }

    /// Byte length of the token including all trivia.
    pub fn full_width(&self) -> usize {
        self.leading_width()
            + self.text.len()
            + self.trailing_trivia.iter().map(|t| t.text.len()).sum::<usize>()
    }
}

/// Reserved C# keywords. Contextual keywords (`var`, `partial`, `record`,
/// `nameof`, ...) are tokenized as identifiers.
pub const KEYWORDS: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked",
    "class", "const", "continue", "decimal", "default", "delegate", "do", "double", "else",
    "enum", "event", "explicit", "extern", "false", "finally", "fixed", "float", "for",
    "foreach", "goto", "if", "implicit", "in", "int", "interface", "internal", "is", "lock",
    "long", "namespace", "new", "null", "object", "operator", "out", "override", "params",
    "private", "protected", "public", "readonly", "ref", "return", "sbyte", "sealed", "short",
    "sizeof", "stackalloc", "static", "string", "struct", "switch", "this", "throw", "true",
    "try", "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort", "using", "virtual",
    "void", "volatile", "while",
];

/// Keywords naming predefined types.
pub const PREDEFINED_TYPES: &[&str] = &[
    "bool", "byte", "char", "decimal", "double", "float", "int", "long", "object", "sbyte",
    "short", "string", "uint", "ulong", "ushort",
];

const PUNCT3: &[&str] = &["??=", "<<="];

const PUNCT2: &[&str] = &[
    "?.", "??", "::", "=>", "==", "!=", "<=", ">=", "&&", "||", "++", "--", "+=", "-=", "*=",
    "/=", "%=", "&=", "|=", "^=", "->", "..", "<<",
];

pub fn is_keyword(text: &str) -> bool {
    KEYWORDS.contains(&text)
}

pub fn is_predefined_type(text: &str) -> bool {
    PREDEFINED_TYPES.contains(&text)
}

/// Errors raised by the tokenizer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenizeError {
    #[error("unterminated string literal starting at byte {offset}")]
    UnterminatedString { offset: usize },

    #[error("unterminated character literal starting at byte {offset}")]
    UnterminatedCharacter { offset: usize },

    #[error("unterminated comment starting at byte {offset}")]
    UnterminatedComment { offset: usize },
}

/// Tokenize `source` into tokens ending with an end-of-file token.
pub fn tokenize(source: &str) -> Result<Vec<Token>, TokenizeError> {
    Scanner::new(source).run()
}

struct Scanner<'src> {
    source: &'src str,
    pos: usize,
    at_line_start: bool,
    /// Open interpolated strings and holes, innermost last.
    frames: Vec<Frame>,
    /// Open `#if` directives, innermost last.
    conditionals: Vec<Conditional>,
}

/// An interpolated string being scanned.
#[derive(Debug, Clone, Copy)]
struct InterpolatedString {
    start: usize,
    verbatim: bool,
    /// Length of the quote run delimiting a raw string; zero otherwise.
    raw_quotes: usize,
    /// Braces that open and close a hole.
    braces: usize,
}

#[derive(Debug, Clone, Copy)]
enum Frame {
    /// Literal text of the string.
    Text(InterpolatedString),
    /// A hole; `depth` counts brackets opened inside it.
    Hole {
        string: InterpolatedString,
        depth: usize,
        format: bool,
    },
}

impl Frame {
    fn string(&self) -> InterpolatedString {
        match *self {
            Frame::Text(string) | Frame::Hole { string, .. } => string,
        }
    }
}

/// State of one `#if` ... `#endif` block.
#[derive(Debug, Clone, Copy)]
struct Conditional {
    enclosing_active: bool,
    taken: bool,
    active: bool,
}

impl<'src> Scanner<'src> {
    fn new(source: &'src str) -> Self {
        Self {
            source,
            pos: 0,
            at_line_start: true,
            frames: Vec::new(),
            conditionals: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<Token>, TokenizeError> {
        let mut tokens = Vec::new();
        loop {
            match self.frames.last().copied() {
                Some(Frame::Text(string)) => self.scan_string_text(string, &mut tokens)?,
                Some(Frame::Hole { format: true, .. }) => self.scan_format_clause(&mut tokens)?,
                _ => {
                    if self.scan_code_token(&mut tokens)? {
                        return Ok(tokens);
                    }
                }
            }
        }
    }

    /// Scan one token outside string text. Returns true at end of file.
    fn scan_code_token(&mut self, tokens: &mut Vec<Token>) -> Result<bool, TokenizeError> {
        let leading = self.scan_trivia(false)?;
        if self.peek().is_none() {
            if let Some(frame) = self.frames.last() {
                return Err(TokenizeError::UnterminatedString {
                    offset: frame.string().start,
                });
            }
            tokens.push(Token::end_of_file().with_leading_trivia(leading));
            return Ok(true);
        }

        if let Some(Frame::Hole { string, depth: 0, .. }) = self.frames.last().copied() {
            if self.peek() == Some('}') {
                self.close_hole(string, leading, tokens)?;
                return Ok(false);
            }
        }

        let start = self.pos;
        let kind = self.scan_token()?;
        self.at_line_start = false;
        let text = self.source[start..self.pos].to_string();

        let mut in_format = false;
        if let Some(Frame::Hole { depth, format, .. }) = self.frames.last_mut() {
            match text.as_str() {
                "(" | "[" | "{" => *depth += 1,
                ")" | "]" | "}" => *depth = depth.saturating_sub(1),
                ":" if *depth == 0 => {
                    *format = true;
                    in_format = true;
                }
                _ => {}
            }
        }

        let trailing = if kind == TokenKind::InterpolatedStringStart || in_format {
            Vec::new()
        } else {
            self.scan_trivia(true)?
        };
        tokens.push(Token {
            kind,
            text,
            leading_trivia: leading,
            trailing_trivia: trailing,
        });
        Ok(false)
    }

    // ------------------------------------------------------------------------
    // Character access
    // ------------------------------------------------------------------------

    fn rest(&self) -> &'src str {
        &self.source[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    // ------------------------------------------------------------------------
    // Trivia
    // ------------------------------------------------------------------------

    fn scan_trivia(&mut self, trailing: bool) -> Result<Vec<Trivia>, TokenizeError> {
        let mut trivia = Vec::new();
        loop {
            let start = self.pos;
            let kind = match self.peek() {
                Some('\r') | Some('\n') => {
                    if self.bump() == Some('\r') && self.peek() == Some('\n') {
                        self.bump();
                    }
                    trivia.push(Trivia::new(TriviaKind::EndOfLine, &self.source[start..self.pos]));
                    self.at_line_start = true;
                    if trailing {
                        return Ok(trivia);
                    }
                    continue;
                }
                Some(c) if is_inline_whitespace(c) => {
                    self.eat_while(is_inline_whitespace);
                    TriviaKind::Whitespace
                }
                Some('/') if self.peek_at(1) == Some('/') => {
                    self.eat_while(|c| c != '\r' && c != '\n');
                    self.at_line_start = false;
                    TriviaKind::SingleLineComment
                }
                Some('/') if self.peek_at(1) == Some('*') => {
                    match self.rest()[2..].find("*/") {
                        Some(end) => self.pos += end + 4,
                        None => return Err(TokenizeError::UnterminatedComment { offset: start }),
                    }
                    self.at_line_start = false;
                    TriviaKind::MultiLineComment
                }
                Some('#') if self.at_line_start && !trailing && self.frames.is_empty() => {
                    self.eat_while(|c| c != '\r' && c != '\n');
                    let source = self.source;
                    let line = &source[start..self.pos];
                    trivia.push(Trivia::new(TriviaKind::Directive, line));
                    self.apply_directive(line);
                    if !self.is_active() {
                        self.scan_disabled_text(&mut trivia);
                    }
                    continue;
                }
                _ => return Ok(trivia),
            };
            trivia.push(Trivia::new(kind, &self.source[start..self.pos]));
        }
    }

    // ------------------------------------------------------------------------
    // Conditional compilation
    // ------------------------------------------------------------------------

    fn is_active(&self) -> bool {
        self.conditionals.last().is_none_or(|c| c.active)
    }

    fn apply_directive(&mut self, line: &str) {
        let body = line.trim_start().trim_start_matches('#').trim_start();
        let (keyword, condition) = body
            .split_once(|c: char| c.is_whitespace())
            .unwrap_or((body, ""));
        match keyword {
            "if" => {
                let enclosing_active = self.is_active();
                let holds = branch_condition(condition);
                self.conditionals.push(Conditional {
                    enclosing_active,
                    taken: holds,
                    active: enclosing_active && holds,
                });
            }
            "elif" => {
                if let Some(c) = self.conditionals.last_mut() {
                    let holds = !c.taken && branch_condition(condition);
                    c.active = c.enclosing_active && holds;
                    c.taken |= holds;
                }
            }
            "else" => {
                if let Some(c) = self.conditionals.last_mut() {
                    c.active = c.enclosing_active && !c.taken;
                    c.taken = true;
                }
            }
            "endif" => {
                self.conditionals.pop();
            }
            _ => {}
        }
    }

    /// Consume the directive's line ending and every following line up to
    /// the next directive line.
    fn scan_disabled_text(&mut self, trivia: &mut Vec<Trivia>) {
        let start = self.pos;
        if self.peek() == Some('\r') || self.peek() == Some('\n') {
            if self.bump() == Some('\r') && self.peek() == Some('\n') {
                self.bump();
            }
            trivia.push(Trivia::new(TriviaKind::EndOfLine, &self.source[start..self.pos]));
        }

        let disabled = self.pos;
        loop {
            let rest = self.rest();
            if rest.is_empty() || rest.trim_start_matches(is_inline_whitespace).starts_with('#') {
                break;
            }
            self.pos += rest.find('\n').map_or(rest.len(), |i| i + 1);
        }
        if self.pos > disabled {
            trivia.push(Trivia::new(TriviaKind::DisabledText, &self.source[disabled..self.pos]));
        }
        self.at_line_start = true;
    }

    // ------------------------------------------------------------------------
    // Tokens
    // ------------------------------------------------------------------------

    fn scan_token(&mut self) -> Result<TokenKind, TokenizeError> {
        let start = self.pos;
        let c = match self.peek() {
            Some(c) => c,
            None => return Ok(TokenKind::EndOfFile),
        };

        match c {
            '@' if self.peek_at(1) == Some('"') => {
                self.pos += 2;
                self.scan_verbatim_body(start)?;
                Ok(TokenKind::StringLiteral)
            }
            '@' if self.peek_at(1) == Some('$') => self.begin_interpolated(start),
            '@' if self.peek_at(1).is_some_and(is_ident_start) => {
                self.bump();
                self.eat_while(is_ident_continue);
                Ok(TokenKind::Identifier)
            }
            '$' if matches!(self.peek_at(1), Some('"') | Some('@') | Some('$')) => {
                self.begin_interpolated(start)
            }
            '"' => {
                if self.rest().starts_with("\"\"\"") {
                    self.scan_raw_string(start)?;
                } else {
                    self.bump();
                    self.scan_regular_body(start)?;
                }
                Ok(TokenKind::StringLiteral)
            }
            '\'' => {
                self.bump();
                self.scan_char_body(start)?;
                Ok(TokenKind::CharLiteral)
            }
            c if c.is_ascii_digit()
                || (c == '.' && self.peek_at(1).is_some_and(|d| d.is_ascii_digit())) =>
            {
                self.scan_number();
                Ok(TokenKind::NumericLiteral)
            }
            c if is_ident_start(c) => {
                self.eat_while(is_ident_continue);
                if is_keyword(&self.source[start..self.pos]) {
                    Ok(TokenKind::Keyword)
                } else {
                    Ok(TokenKind::Identifier)
                }
            }
            _ => {
                let rest = self.rest();
                let len = PUNCT3
                    .iter()
                    .chain(PUNCT2.iter())
                    .find(|p| rest.starts_with(**p))
                    .map(|p| p.len())
                    .unwrap_or(c.len_utf8());
                self.pos += len;
                Ok(TokenKind::Punctuation)
            }
        }
    }

    /// Body of `"..."` after the opening quote.
    fn scan_regular_body(&mut self, start: usize) -> Result<(), TokenizeError> {
        loop {
            match self.bump() {
                Some('"') => return Ok(()),
                Some('\\') => {
                    self.bump();
                }
                Some('\n') | None => return Err(TokenizeError::UnterminatedString { offset: start }),
                Some(_) => {}
            }
        }
    }

    /// Body of `@"..."` after the opening quote.
    fn scan_verbatim_body(&mut self, start: usize) -> Result<(), TokenizeError> {
        loop {
            match self.bump() {
                Some('"') if self.peek() == Some('"') => {
                    self.bump();
                }
                Some('"') => return Ok(()),
                None => return Err(TokenizeError::UnterminatedString { offset: start }),
                Some(_) => {}
            }
        }
    }

    /// `"""..."""` raw string; the closing run has as many quotes as the opening one.
    fn scan_raw_string(&mut self, start: usize) -> Result<(), TokenizeError> {
        let quotes = self.rest().chars().take_while(|&c| c == '"').count();
        self.pos += quotes;
        let delimiter = "\"".repeat(quotes);
        match self.rest().find(&delimiter) {
            Some(end) => {
                self.pos += end;
                // A longer run of quotes closes at its end.
                self.eat_while(|c| c == '"');
                Ok(())
            }
            None => Err(TokenizeError::UnterminatedString { offset: start }),
        }
    }

    // ------------------------------------------------------------------------
    // Interpolated strings
    // ------------------------------------------------------------------------

    /// Consume the opening of an interpolated string and enter its text.
    fn begin_interpolated(&mut self, start: usize) -> Result<TokenKind, TokenizeError> {
        let mut verbatim = false;
        if self.peek() == Some('@') {
            self.bump();
            verbatim = true;
        }
        let dollars = self.rest().chars().take_while(|&c| c == '$').count();
        self.pos += dollars;
        if self.peek() == Some('@') {
            self.bump();
            verbatim = true;
        }

        let quotes = self.rest().chars().take_while(|&c| c == '"').count();
        let raw_quotes = match quotes {
            0 => return Err(TokenizeError::UnterminatedString { offset: start }),
            1 | 2 => 0,
            q => q,
        };
        self.pos += raw_quotes.max(1);

        self.frames.push(Frame::Text(InterpolatedString {
            start,
            verbatim,
            raw_quotes,
            braces: if raw_quotes > 0 { dollars } else { 1 },
        }));
        Ok(TokenKind::InterpolatedStringStart)
    }

    /// Scan string text up to the closing quote or the next hole.
    fn scan_string_text(
        &mut self,
        string: InterpolatedString,
        tokens: &mut Vec<Token>,
    ) -> Result<(), TokenizeError> {
        let unterminated = || TokenizeError::UnterminatedString {
            offset: string.start,
        };
        let start = self.pos;
        loop {
            let closing = if string.raw_quotes > 0 {
                self.rest().starts_with(&"\"".repeat(string.raw_quotes))
            } else {
                self.peek() == Some('"') && !(string.verbatim && self.peek_at(1) == Some('"'))
            };
            if closing {
                self.push_text(start, tokens);
                let end = self.pos;
                if string.raw_quotes > 0 {
                    self.eat_while(|c| c == '"');
                } else {
                    self.bump();
                }
                let text = self.source[end..self.pos].to_string();
                self.at_line_start = false;
                self.frames.pop();
                let trailing = self.scan_trivia(true)?;
                tokens.push(
                    Token::new(TokenKind::InterpolatedStringEnd, text).with_trailing_trivia(trailing),
                );
                return Ok(());
            }

            let plain = !string.verbatim && string.raw_quotes == 0;
            match self.peek() {
                None => return Err(unterminated()),
                Some('\n') if plain => return Err(unterminated()),
                Some('\\') if plain => {
                    self.bump();
                    self.bump();
                }
                // `""` in a verbatim string
                Some('"') if string.raw_quotes == 0 => self.pos += 2,
                // a quote run shorter than the delimiter
                Some('"') => self.eat_while(|c| c == '"'),
                Some('{') => {
                    let run = self.rest().chars().take_while(|&c| c == '{').count();
                    if string.raw_quotes == 0 && run >= 2 {
                        self.pos += 2;
                        continue;
                    }
                    if run < string.braces {
                        self.pos += run;
                        continue;
                    }
                    self.pos += run - string.braces;
                    self.push_text(start, tokens);
                    for _ in 0..string.braces {
                        self.bump();
                        tokens.push(Token::new(TokenKind::Punctuation, "{"));
                    }
                    self.frames.pop();
                    self.frames.push(Frame::Hole {
                        string,
                        depth: 0,
                        format: false,
                    });
                    return Ok(());
                }
                Some('}') if string.raw_quotes == 0 && self.peek_at(1) == Some('}') => {
                    self.pos += 2;
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
    }

    /// Text of a hole's format clause, after its `:`.
    fn scan_format_clause(&mut self, tokens: &mut Vec<Token>) -> Result<(), TokenizeError> {
        let start = self.pos;
        self.eat_while(|c| c != '}');
        if self.peek().is_none() {
            let offset = self.frames.last().map_or(start, |f| f.string().start);
            return Err(TokenizeError::UnterminatedString { offset });
        }
        self.push_text(start, tokens);
        if let Some(Frame::Hole { format, .. }) = self.frames.last_mut() {
            *format = false;
        }
        Ok(())
    }

    /// Emit the closing braces of a hole and return to the string text.
    fn close_hole(
        &mut self,
        string: InterpolatedString,
        leading: Vec<Trivia>,
        tokens: &mut Vec<Token>,
    ) -> Result<(), TokenizeError> {
        let mut leading = Some(leading);
        for _ in 0..string.braces {
            if self.peek() != Some('}') {
                return Err(TokenizeError::UnterminatedString {
                    offset: string.start,
                });
            }
            self.bump();
            tokens.push(
                Token::new(TokenKind::Punctuation, "}")
                    .with_leading_trivia(leading.take().unwrap_or_default()),
            );
        }
        self.frames.pop();
        self.frames.push(Frame::Text(string));
        self.at_line_start = false;
        Ok(())
    }

    fn push_text(&self, start: usize, tokens: &mut Vec<Token>) {
        if self.pos > start {
            tokens.push(Token::new(
                TokenKind::InterpolatedStringText,
                &self.source[start..self.pos],
            ));
        }
    }

    /// Body of `'...'` after the opening quote.
    fn scan_char_body(&mut self, start: usize) -> Result<(), TokenizeError> {
        loop {
            match self.bump() {
                Some('\'') => return Ok(()),
                Some('\\') => {
                    self.bump();
                }
                Some('\n') | None => {
                    return Err(TokenizeError::UnterminatedCharacter { offset: start })
                }
                Some(_) => {}
            }
        }
    }

    fn scan_number(&mut self) {
        let start = self.pos;
        while let Some(c) = self.peek() {
            let exponent_sign = (c == '+' || c == '-')
                && self.source[start..self.pos].ends_with(['e', 'E'])
                && !self.source[start..].starts_with("0x")
                && !self.source[start..].starts_with("0X");
            let fraction = c == '.' && self.peek_at(1).is_some_and(|d| d.is_ascii_digit());
            if c.is_ascii_alphanumeric() || c == '_' || fraction || exponent_sign {
                self.bump();
            } else {
                break;
            }
        }
    }
}

/// Every condition holds except the literals `false` and `0`.
fn branch_condition(expression: &str) -> bool {
    let expression = expression.split("//").next().unwrap_or_default().trim();
    !matches!(expression, "false" | "0")
}

fn is_inline_whitespace(c: char) -> bool {
    c != '\r' && c != '\n' && (c.is_whitespace() || c == '\u{feff}')
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}
