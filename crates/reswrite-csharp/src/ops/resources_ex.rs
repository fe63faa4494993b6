// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Rewrite calls to legacy resource format helpers.
//!
//! Resource classes generated by `StronglyTypedResourceBuilderEx` expose a
//! `XFormat(args)` helper next to every format-string property `X`. This
//! operation replaces each call
//!
//! ```text
//! Res.GreetingFormat(name)
//! ```
//!
//! with the equivalent
//!
//! ```text
//! string.Format(Res.Culture, Res.Greeting, name)
//! ```
//!
//! A call matches when:
//! 1. its target is `Name.Member` with a simple name as receiver
//! 2. `Member` ends with [`FORMAT_SUFFIX`] and is longer than it
//! 3. the receiver's type carries an attribute whose first constructor
//!    argument is the string [`LEGACY_GENERATOR`]
//!
//! The semantic model is only requested once 1 and 2 hold. Without a model
//! nothing matches.
//!
//! Each replacement produces a new tree, so invocation sites found in the
//! previous tree are stale. The visitor rewrites the first match, rescans the
//! new tree from the top, and stops after a scan that finds nothing.

use std::cell::OnceCell;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info_span, trace};

use reswrite_cst::visitor::InvocationCollector;
use reswrite_cst::{factory, Argument, ArgumentList, Invocation, Node, SyntaxTree};

use crate::compilation::{Literal, SemanticModel};
use crate::document::Document;
use crate::visitor::{SourceVisitor, VisitError};

/// Suffix of the legacy helper methods.
pub const FORMAT_SUFFIX: &str = "Format";

/// First constructor argument of the attribute marking generated classes.
pub const LEGACY_GENERATOR: &str = "DMKSoftware.CodeGenerators.Tools.StronglyTypedResourceBuilderEx";

/// Property of every generated resource class holding the resource culture.
pub const CULTURE_PROPERTY: &str = "Culture";

/// What a matched call is rewritten from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcesExContext {
    /// The member name without [`FORMAT_SUFFIX`].
    pub resource_property_name: String,
    /// The receiver, without leading trivia.
    pub resource_class: Node,
    /// The original arguments in order.
    pub arguments: Vec<Arc<Argument>>,
}

/// Decide whether `invocation`, found in `tree`, is a legacy format call.
///
/// `model` is called at most once, and only after the syntactic checks pass.
/// A model bound to another snapshot is re-derived for `tree`.
pub fn match_invocation(
    tree: &Arc<SyntaxTree>,
    invocation: &Invocation,
    model: impl FnOnce() -> Option<SemanticModel>,
) -> Option<ResourcesExContext> {
    let access = invocation.member_access()?;
    let Node::IdentifierName(receiver) = &access.expression else {
        return None;
    };
    let property = access
        .name
        .value_text()
        .strip_suffix(FORMAT_SUFFIX)
        .filter(|p| !p.is_empty())?;

    let mut model = model()?;
    if !model.is_bound_to(tree) {
        trace!("semantic model belongs to another snapshot, re-deriving");
        model = model.compilation().semantic_model(tree);
    }

    let resource_type = model.type_of(receiver)?;
    let generated = resource_type
        .attributes
        .iter()
        .any(|a| a.first_argument().and_then(Literal::as_str) == Some(LEGACY_GENERATOR));
    if !generated {
        return None;
    }

    Some(ResourcesExContext {
        resource_property_name: property.to_string(),
        resource_class: access.expression.without_leading_trivia(),
        arguments: invocation.argument_list.arguments.clone(),
    })
}

/// Build `string.Format(Res.Culture, Res.Property, args...)`.
///
/// The result has no leading trivia.
pub fn create_updated_expression(context: &ResourcesExContext) -> Node {
    let target = factory::simple_member_access(factory::predefined_type("string"), "Format");
    let culture = factory::simple_member_access(context.resource_class.clone(), CULTURE_PROPERTY);
    let property = factory::simple_member_access(
        context.resource_class.clone(),
        &context.resource_property_name,
    );

    let mut arguments = vec![factory::argument(culture), factory::argument(property)];
    arguments.extend(context.arguments.iter().cloned());
    factory::invocation(target, factory::argument_list(arguments))
}

/// Carry the original call's outer trivia onto its replacement.
fn transplant_trivia(original: &Invocation, replacement: Node) -> Node {
    let leading = original.expression.leading_trivia();
    let replacement = if leading.is_empty() {
        replacement
    } else {
        replacement.with_leading_trivia(leading.to_vec())
    };

    let trailing = &original.argument_list.close_paren.trailing_trivia;
    match replacement {
        Node::Invocation(inv) if !trailing.is_empty() => {
            let mut list = ArgumentList::clone(&inv.argument_list);
            list.close_paren.trailing_trivia = trailing.clone();
            factory::invocation(inv.expression.clone(), Arc::new(list))
        }
        other => other,
    }
}

/// Outcome of rewriting one document to its fixed point.
#[derive(Debug, Clone)]
pub struct FixedPointRun {
    /// The input document itself when nothing matched.
    pub document: Document,
    /// Calls rewritten.
    pub rewrites: usize,
    /// Full-document scans, including the final one that found nothing.
    pub scans: usize,
}

/// Rewrite every legacy format call in `document`.
pub fn rewrite_to_fixed_point(document: Document) -> Result<FixedPointRun, VisitError> {
    let mut current = document;
    let mut rewrites = 0;
    let mut scans = 0;

    let mut has_updates = true;
    while has_updates {
        has_updates = false;
        let tree = current
            .syntax_root()
            .ok_or_else(|| VisitError::MissingTreeRoot {
                document: current.name().to_string(),
            })?;
        scans += 1;

        let model = OnceCell::new();
        for site in InvocationCollector::collect(&tree) {
            let Some(context) = match_invocation(&tree, &site.invocation, || {
                model.get_or_init(|| current.semantic_model()).clone()
            }) else {
                continue;
            };

            let replacement = transplant_trivia(&site.invocation, create_updated_expression(&context));
            let updated = tree
                .replace_node(&site.path, replacement)
                .map_err(|source| VisitError::Tree {
                    document: current.name().to_string(),
                    source,
                })?;
            debug!(
                path = %site.path,
                property = %context.resource_property_name,
                "rewrote resource format call"
            );

            current = current.with_syntax_tree(updated);
            rewrites += 1;
            has_updates = true;
            break;
        }
    }

    debug!(scans, rewrites, "fixed point reached");
    Ok(FixedPointRun {
        document: current,
        rewrites,
        scans,
    })
}

/// Visitor applying [`rewrite_to_fixed_point`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ResourcesExSourceVisitor;

impl ResourcesExSourceVisitor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SourceVisitor for ResourcesExSourceVisitor {
    fn name(&self) -> &str {
        "resources-ex"
    }

    async fn visit(&self, document: Document) -> Result<Document, VisitError> {
        let span = info_span!("document", name = document.name());
        span.in_scope(|| rewrite_to_fixed_point(document).map(|run| run.document))
    }
}
