// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Type declarations and their attributes, indexed per project.
//!
//! A [`Compilation`] scans the token stream of every tree in a project and
//! records each `class`, `struct`, `interface`, `enum` and `record`
//! declaration together with the attributes written directly above it.
//! Namespaces (block and file-scoped) and enclosing types qualify the names.
//! Partial declarations of one type merge their attributes.
//!
//! A [`SemanticModel`] binds a compilation to one tree snapshot and answers
//! type queries for names in that tree. Names resolve by simple name; a
//! simple name declared in more than one place does not resolve.

use std::collections::HashMap;
use std::sync::Arc;

use reswrite_cst::{SyntaxTree, Token, TokenKind};

/// A literal constructor argument of an attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    /// A string literal, unescaped.
    String(String),
    Char(String),
    Number(String),
    Bool(bool),
    Null,
    /// Anything that is not a plain literal (`typeof(T)`, constants, ...).
    Expression(String),
}

impl Literal {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::String(value) => Some(value),
            _ => None,
        }
    }
}

/// One attribute application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeData {
    /// The name as written, e.g. `global::System.CodeDom.Compiler.GeneratedCode`.
    pub name: String,
    /// Positional constructor arguments in order. Named arguments are not included.
    pub arguments: Vec<Literal>,
}

impl AttributeData {
    /// The last segment of the name without an `Attribute` suffix.
    pub fn simple_name(&self) -> &str {
        let last = self
            .name
            .rsplit(['.', ':'])
            .next()
            .unwrap_or(&self.name);
        last.strip_suffix("Attribute")
            .filter(|s| !s.is_empty())
            .unwrap_or(last)
    }

    pub fn first_argument(&self) -> Option<&Literal> {
        self.arguments.first()
    }
}

/// A declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSymbol {
    pub name: String,
    /// Namespace and enclosing types joined with `.`.
    pub qualified_name: String,
    pub attributes: Vec<AttributeData>,
}

/// The type index of one project.
#[derive(Debug, Default)]
pub struct Compilation {
    types: Vec<TypeSymbol>,
    by_qualified_name: HashMap<String, usize>,
    by_simple_name: HashMap<String, Vec<usize>>,
}

impl Compilation {
    /// Build the index over `trees`.
    pub fn new<'a>(trees: impl IntoIterator<Item = &'a Arc<SyntaxTree>>) -> Arc<Self> {
        let mut compilation = Compilation::default();
        for tree in trees {
            let mut tokens = Vec::new();
            tree.root().for_each_token(&mut |t| {
                if t.kind != TokenKind::EndOfFile {
                    tokens.push(t.clone());
                }
            });
            for declared in DeclarationScanner::new(&tokens).scan() {
                compilation.add(declared);
            }
        }
        Arc::new(compilation)
    }

    fn add(&mut self, declared: TypeSymbol) {
        if let Some(&index) = self.by_qualified_name.get(&declared.qualified_name) {
            self.types[index].attributes.extend(declared.attributes);
            return;
        }
        let index = self.types.len();
        self.by_qualified_name
            .insert(declared.qualified_name.clone(), index);
        self.by_simple_name
            .entry(declared.name.clone())
            .or_default()
            .push(index);
        self.types.push(declared);
    }

    pub fn types(&self) -> &[TypeSymbol] {
        &self.types
    }

    pub fn type_by_qualified_name(&self, name: &str) -> Option<&TypeSymbol> {
        self.by_qualified_name.get(name).map(|&i| &self.types[i])
    }

    /// Resolve a simple name. Ambiguous names do not resolve.
    pub fn resolve_type(&self, name: &str) -> Option<&TypeSymbol> {
        match self.by_simple_name.get(name).map(Vec::as_slice) {
            Some([index]) => self.types.get(*index),
            _ => None,
        }
    }

    /// A model bound to `tree`.
    pub fn semantic_model(self: &Arc<Self>, tree: &Arc<SyntaxTree>) -> SemanticModel {
        SemanticModel {
            tree: tree.clone(),
            compilation: self.clone(),
        }
    }
}

/// Type information for one tree snapshot.
#[derive(Debug, Clone)]
pub struct SemanticModel {
    tree: Arc<SyntaxTree>,
    compilation: Arc<Compilation>,
}

impl SemanticModel {
    /// The snapshot this model was derived from.
    pub fn tree(&self) -> &Arc<SyntaxTree> {
        &self.tree
    }

    pub fn compilation(&self) -> &Arc<Compilation> {
        &self.compilation
    }

    /// Whether this model was derived from exactly `tree`.
    pub fn is_bound_to(&self, tree: &Arc<SyntaxTree>) -> bool {
        Arc::ptr_eq(&self.tree, tree)
    }

    /// The type a name refers to.
    pub fn type_of(&self, name: &Token) -> Option<&TypeSymbol> {
        if name.kind != TokenKind::Identifier {
            return None;
        }
        self.compilation.resolve_type(name.value_text())
    }
}

// ============================================================================
// Declaration scanning
// ============================================================================

const TYPE_KEYWORDS: &[&str] = &["class", "struct", "interface", "enum"];

#[derive(Debug)]
struct Scope {
    name: String,
    /// Brace depth inside the scope, or `None` for a file-scoped namespace.
    depth: Option<usize>,
}

struct DeclarationScanner<'t> {
    tokens: &'t [Token],
    pos: usize,
    depth: usize,
    scopes: Vec<Scope>,
    /// Scope name waiting for its opening brace.
    pending_scope: Option<String>,
    attributes: Vec<AttributeData>,
    declared: Vec<TypeSymbol>,
}

impl<'t> DeclarationScanner<'t> {
    fn new(tokens: &'t [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
            scopes: Vec::new(),
            pending_scope: None,
            attributes: Vec::new(),
            declared: Vec::new(),
        }
    }

    fn scan(mut self) -> Vec<TypeSymbol> {
        let tokens = self.tokens;
        while let Some(token) = tokens.get(self.pos) {
            match (token.kind, token.text.as_str()) {
                (TokenKind::Punctuation, "[") if self.at_declaration_start() => {
                    self.scan_attribute_section();
                    continue;
                }
                (TokenKind::Punctuation, "{") => {
                    self.depth += 1;
                    if let Some(name) = self.pending_scope.take() {
                        self.scopes.push(Scope {
                            name,
                            depth: Some(self.depth),
                        });
                    }
                    self.attributes.clear();
                }
                (TokenKind::Punctuation, "}") => {
                    while self
                        .scopes
                        .last()
                        .is_some_and(|s| s.depth == Some(self.depth))
                    {
                        self.scopes.pop();
                    }
                    self.depth = self.depth.saturating_sub(1);
                    self.attributes.clear();
                }
                (TokenKind::Punctuation, ";") => {
                    self.pending_scope = None;
                    self.attributes.clear();
                }
                (TokenKind::Keyword, "namespace") => {
                    self.pos += 1;
                    self.scan_namespace();
                    continue;
                }
                (TokenKind::Keyword, keyword) if TYPE_KEYWORDS.contains(&keyword) => {
                    self.declare_type(self.pos + 1);
                }
                (TokenKind::Identifier, "record") => {
                    // `record R`, `record class R`, `record struct R`
                    let next = self.pos + 1;
                    let after_kind = tokens
                        .get(next)
                        .filter(|t| {
                            t.kind == TokenKind::Keyword && (t.text == "class" || t.text == "struct")
                        })
                        .map_or(next, |_| next + 1);
                    if self.declare_type(after_kind) {
                        self.pos = after_kind;
                    }
                }
                _ => {}
            }
            self.pos += 1;
        }
        self.declared
    }

    fn previous(&self) -> Option<&Token> {
        self.pos.checked_sub(1).and_then(|i| self.tokens.get(i))
    }

    fn at_declaration_start(&self) -> bool {
        match self.previous() {
            None => true,
            Some(t) => {
                t.kind == TokenKind::Punctuation && matches!(t.text.as_str(), ";" | "{" | "}" | "]")
            }
        }
    }

    /// Record a type declaration if `name_at` holds its name.
    fn declare_type(&mut self, name_at: usize) -> bool {
        let Some(name) = self
            .tokens
            .get(name_at)
            .filter(|t| t.kind == TokenKind::Identifier)
            .map(|t| t.value_text().to_string())
        else {
            return false;
        };
        let qualified_name = self.qualify(&name);
        self.declared.push(TypeSymbol {
            name: name.clone(),
            qualified_name,
            attributes: std::mem::take(&mut self.attributes),
        });
        self.pending_scope = Some(name);
        true
    }

    fn qualify(&self, name: &str) -> String {
        self.scopes
            .iter()
            .map(|s| s.name.as_str())
            .chain(std::iter::once(name))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// `namespace A.B {` or `namespace A.B;`. `pos` is just past the keyword.
    fn scan_namespace(&mut self) {
        let mut name = String::new();
        let tokens = self.tokens;
        while let Some(token) = tokens.get(self.pos) {
            match token.text.as_str() {
                "{" => {
                    self.pending_scope = Some(name);
                    return;
                }
                ";" => {
                    self.scopes.push(Scope { name, depth: None });
                    self.pos += 1;
                    return;
                }
                text => name.push_str(text),
            }
            self.pos += 1;
        }
    }

    /// Consume `[...]` and keep its attributes unless it has a non-type target.
    fn scan_attribute_section(&mut self) {
        let start = self.pos + 1;
        let mut depth = 0usize;
        let mut end = start;
        while let Some(token) = self.tokens.get(end) {
            if token.kind == TokenKind::Punctuation {
                match token.text.as_str() {
                    "(" | "[" | "{" => depth += 1,
                    "]" if depth == 0 => break,
                    ")" | "]" | "}" => depth = depth.saturating_sub(1),
                    _ => {}
                }
            }
            end += 1;
        }
        self.pos = end + 1;

        let tokens = self.tokens;
        let mut body = &tokens[start..end.min(tokens.len())];
        if let [target, colon, rest @ ..] = body {
            if colon.is_punct(":") {
                if target.text != "type" {
                    return;
                }
                body = rest;
            }
        }
        for attribute in split_top_level(body, ",") {
            if let Some(data) = parse_attribute(attribute) {
                self.attributes.push(data);
            }
        }
    }
}

/// Split `tokens` on `separator` outside of brackets.
fn split_top_level<'t>(tokens: &'t [Token], separator: &str) -> Vec<&'t [Token]> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, token) in tokens.iter().enumerate() {
        if token.kind != TokenKind::Punctuation {
            continue;
        }
        match token.text.as_str() {
            "(" | "[" | "{" => depth += 1,
            ")" | "]" | "}" => depth = depth.saturating_sub(1),
            text if depth == 0 && text == separator => {
                parts.push(&tokens[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if start < tokens.len() {
        parts.push(&tokens[start..]);
    }
    parts
}

fn parse_attribute(tokens: &[Token]) -> Option<AttributeData> {
    let open = tokens.iter().position(|t| t.is_punct("("));
    let name: String = tokens[..open.unwrap_or(tokens.len())]
        .iter()
        .map(|t| t.text.as_str())
        .collect();
    if name.is_empty() {
        return None;
    }

    let mut arguments = Vec::new();
    if let Some(open) = open {
        let close = tokens.iter().rposition(|t| t.is_punct(")")).unwrap_or(tokens.len());
        let inner = tokens.get(open + 1..close).unwrap_or(&[]);
        for argument in split_top_level(inner, ",") {
            let named = matches!(
                argument,
                [key, eq, ..] if key.kind == TokenKind::Identifier && (eq.is_punct("=") || eq.is_punct(":"))
            );
            if named {
                continue;
            }
            arguments.push(literal_of(argument));
        }
    }
    Some(AttributeData { name, arguments })
}

fn literal_of(tokens: &[Token]) -> Literal {
    let expression = || tokens.iter().map(|t| t.text.as_str()).collect::<String>();
    let [token] = tokens else {
        return Literal::Expression(expression());
    };
    match token.kind {
        TokenKind::StringLiteral => decode_string(&token.text)
            .map(Literal::String)
            .unwrap_or_else(|| Literal::Expression(expression())),
        TokenKind::CharLiteral => Literal::Char(token.text.clone()),
        TokenKind::NumericLiteral => Literal::Number(token.text.clone()),
        TokenKind::Keyword => match token.text.as_str() {
            "true" => Literal::Bool(true),
            "false" => Literal::Bool(false),
            "null" => Literal::Null,
            _ => Literal::Expression(expression()),
        },
        _ => Literal::Expression(expression()),
    }
}

/// The value of a non-interpolated string literal.
pub(crate) fn decode_string(text: &str) -> Option<String> {
    if let Some(body) = text.strip_prefix('@') {
        let body = body.strip_prefix('"')?.strip_suffix('"')?;
        return Some(body.replace("\"\"", "\""));
    }
    if text.starts_with("\"\"\"") {
        let quotes = text.chars().take_while(|&c| c == '"').count();
        let body = text.get(quotes..text.len().checked_sub(quotes)?)?;
        return Some(body.to_string());
    }
    let body = text.strip_prefix('"')?.strip_suffix('"')?;
    let mut value = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            value.push(c);
            continue;
        }
        let escaped = match chars.next()? {
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            '0' => '\0',
            'a' => '\u{7}',
            'b' => '\u{8}',
            'f' => '\u{c}',
            'v' => '\u{b}',
            'u' => {
                let hex: String = chars.by_ref().take(4).collect();
                char::from_u32(u32::from_str_radix(&hex, 16).ok()?)?
            }
            other => other,
        };
        value.push(escaped);
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reswrite_cst::parse_compilation_unit;

    fn compile(sources: &[&str]) -> Arc<Compilation> {
        let trees: Vec<_> = sources
            .iter()
            .map(|s| parse_compilation_unit(s).unwrap())
            .collect();
        Compilation::new(&trees)
    }

    const GENERATED: &str = r#"
namespace Contoso.Properties
{
    [global::System.CodeDom.Compiler.GeneratedCodeAttribute("DMKSoftware.CodeGenerators.Tools.StronglyTypedResourceBuilderEx", "2.6.0.0")]
    [global::System.Diagnostics.DebuggerNonUserCodeAttribute()]
    internal partial class Res
    {
        internal static string GreetingFormat(object arg0) { return ""; }

        [Obsolete("nested")]
        public enum Kind { A, B }
    }
}
"#;

    mod index {
        use super::*;

        #[test]
        fn records_qualified_names_and_attributes() {
            let compilation = compile(&[GENERATED]);
            let res = compilation
                .type_by_qualified_name("Contoso.Properties.Res")
                .unwrap();
            assert_eq!(res.attributes.len(), 2);
            assert_eq!(res.attributes[0].simple_name(), "GeneratedCode");
            assert_eq!(
                res.attributes[0].arguments,
                vec![
                    Literal::String(
                        "DMKSoftware.CodeGenerators.Tools.StronglyTypedResourceBuilderEx".into()
                    ),
                    Literal::String("2.6.0.0".into()),
                ]
            );
            assert!(res.attributes[1].arguments.is_empty());

            let kind = compilation
                .type_by_qualified_name("Contoso.Properties.Res.Kind")
                .unwrap();
            assert_eq!(kind.attributes[0].simple_name(), "Obsolete");
        }

        #[test]
        fn partial_declarations_merge() {
            let compilation = compile(&[
                "[A(\"one\")] partial class P { }",
                "[B(\"two\")] partial class P { }",
            ]);
            let p = compilation.resolve_type("P").unwrap();
            let names: Vec<_> = p.attributes.iter().map(AttributeData::simple_name).collect();
            assert_eq!(names, vec!["A", "B"]);
        }

        #[test]
        fn ambiguous_simple_names_do_not_resolve() {
            let compilation = compile(&["namespace A { class R {} }", "namespace B { class R {} }"]);
            assert!(compilation.resolve_type("R").is_none());
            assert!(compilation.type_by_qualified_name("B.R").is_some());
        }

        #[test]
        fn file_scoped_namespace_and_records() {
            let compilation = compile(&[
                "namespace N.M;\n[Tag] public record struct Point(int X);\npublic record Named(string Name);",
            ]);
            assert!(compilation.type_by_qualified_name("N.M.Point").is_some());
            assert!(compilation.type_by_qualified_name("N.M.Named").is_some());
            let point = compilation.resolve_type("Point").unwrap();
            assert_eq!(point.attributes.len(), 1);
            assert!(compilation.resolve_type("Named").unwrap().attributes.is_empty());
        }

        #[test]
        fn method_attributes_and_constraints_are_not_types() {
            let compilation = compile(&[
                "class G<T> where T : class, new() { [Obsolete] void M() { } }",
            ]);
            let names: Vec<_> = compilation.types().iter().map(|t| t.name.as_str()).collect();
            assert_eq!(names, vec!["G"]);
            assert!(compilation.resolve_type("G").unwrap().attributes.is_empty());
        }

        #[test]
        fn assembly_attributes_are_ignored() {
            let compilation = compile(&["[assembly: Tag(\"x\")]\nclass C { }"]);
            assert!(compilation.resolve_type("C").unwrap().attributes.is_empty());
        }

        #[test]
        fn named_arguments_are_not_positional() {
            let compilation = compile(&["[Tag(\"pos\", Name = \"named\")] class C { }"]);
            let c = compilation.resolve_type("C").unwrap();
            assert_eq!(c.attributes[0].arguments, vec![Literal::String("pos".into())]);
        }
    }

    mod model {
        use super::*;

        #[test]
        fn binds_to_one_snapshot() {
            let tree = parse_compilation_unit(GENERATED).unwrap();
            let compilation = Compilation::new([&tree]);
            let model = compilation.semantic_model(&tree);
            assert!(model.is_bound_to(&tree));

            let reparsed = parse_compilation_unit(GENERATED).unwrap();
            assert!(!model.is_bound_to(&reparsed));
        }

        #[test]
        fn resolves_identifiers_only() {
            let tree = parse_compilation_unit(GENERATED).unwrap();
            let model = Compilation::new([&tree]).semantic_model(&tree);
            let res = Token::new(TokenKind::Identifier, "Res");
            assert_eq!(model.type_of(&res).unwrap().name, "Res");
            let verbatim = Token::new(TokenKind::Identifier, "@Res");
            assert!(model.type_of(&verbatim).is_some());
            let keyword = Token::new(TokenKind::Keyword, "string");
            assert!(model.type_of(&keyword).is_none());
        }
    }

    #[test]
    fn decodes_string_literals() {
        assert_eq!(decode_string(r#""a\tb\"c\u0041""#).as_deref(), Some("a\tb\"cA"));
        assert_eq!(decode_string(r#"@"c:\x""y""#).as_deref(), Some(r#"c:\x"y"#));
        assert_eq!(decode_string(r#""""raw "q" """"#).as_deref(), Some(r#"raw "q" "#));
        assert_eq!(decode_string("$\"x\""), None);
    }
}
