//! Source visitors and the pipeline that runs them.
//!
//! A [`SourceVisitor`] maps a document to a document. Returning the input
//! handle itself means "no change"; the pipeline reports a change only when
//! the final handle is a different document.

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use reswrite_cst::TreeError;

use crate::document::Document;

/// Errors that abort processing of one document.
#[derive(Debug, Error)]
pub enum VisitError {
    /// The document has no syntax tree.
    #[error("Root cannot be found for document '{document}'.")]
    MissingTreeRoot { document: String },

    /// A replacement could not be applied.
    #[error("failed to update '{document}': {source}")]
    Tree {
        document: String,
        #[source]
        source: TreeError,
    },
}

/// A transformation over one document.
///
/// `#[async_trait]` keeps the trait object safe so pipelines can hold
/// `Box<dyn SourceVisitor>`.
#[async_trait]
pub trait SourceVisitor: Send + Sync {
    /// Human-readable name used in logs.
    fn name(&self) -> &str;

    async fn visit(&self, document: Document) -> Result<Document, VisitError>;
}

/// Result of running a pipeline over one document.
#[derive(Debug, Clone)]
pub enum PipelineOutcome {
    Unchanged,
    Changed(Document),
}

impl PipelineOutcome {
    pub fn is_changed(&self) -> bool {
        matches!(self, PipelineOutcome::Changed(_))
    }
}

/// An ordered list of visitors.
#[derive(Default)]
pub struct VisitorPipeline {
    visitors: Vec<Box<dyn SourceVisitor>>,
}

impl VisitorPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a visitor.
    pub fn with_visitor(mut self, visitor: impl SourceVisitor + 'static) -> Self {
        self.visitors.push(Box::new(visitor));
        self
    }

    pub fn len(&self) -> usize {
        self.visitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visitors.is_empty()
    }

    /// Fold `document` through every visitor in order.
    pub async fn apply(&self, document: Document) -> Result<Document, VisitError> {
        let mut current = document;
        for visitor in &self.visitors {
            debug!(visitor = visitor.name(), document = current.name(), "applying visitor");
            current = visitor.visit(current).await?;
        }
        Ok(current)
    }

    /// Apply the pipeline and compare the result with the input by identity.
    pub async fn run(&self, document: &Document) -> Result<PipelineOutcome, VisitError> {
        let result = self.apply(document.clone()).await?;
        if Document::ptr_eq(&result, document) {
            Ok(PipelineOutcome::Unchanged)
        } else {
            Ok(PipelineOutcome::Changed(result))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentId;
    use reswrite_cst::parse_compilation_unit;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Identity;

    #[async_trait]
    impl SourceVisitor for Identity {
        fn name(&self) -> &str {
            "identity"
        }

        async fn visit(&self, document: Document) -> Result<Document, VisitError> {
            Ok(document)
        }
    }

    /// Re-roots the document on a copy of its root, recording the order it ran in.
    struct Reroot {
        order: Arc<AtomicUsize>,
        seen: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl SourceVisitor for Reroot {
        fn name(&self) -> &str {
            "reroot"
        }

        async fn visit(&self, document: Document) -> Result<Document, VisitError> {
            self.seen
                .store(self.order.fetch_add(1, Ordering::SeqCst), Ordering::SeqCst);
            let tree = document
                .syntax_root()
                .ok_or_else(|| VisitError::MissingTreeRoot {
                    document: document.name().to_string(),
                })?;
            Ok(document.with_syntax_root(tree.root().clone()))
        }
    }

    fn document(tree: bool) -> Document {
        let tree = tree.then(|| parse_compilation_unit("class A { }").unwrap());
        Document::new(DocumentId(0), "A.cs", None, tree)
    }

    #[tokio::test]
    async fn empty_pipeline_is_unchanged() {
        let outcome = VisitorPipeline::new().run(&document(true)).await.unwrap();
        assert!(!outcome.is_changed());
    }

    #[tokio::test]
    async fn identity_visitors_keep_the_document() {
        let pipeline = VisitorPipeline::new()
            .with_visitor(Identity)
            .with_visitor(Identity);
        let doc = document(true);
        let result = pipeline.apply(doc.clone()).await.unwrap();
        assert!(Document::ptr_eq(&doc, &result));
    }

    #[tokio::test]
    async fn visitors_run_in_order_and_thread_the_document() {
        let order = Arc::new(AtomicUsize::new(0));
        let first = Arc::new(AtomicUsize::new(usize::MAX));
        let second = Arc::new(AtomicUsize::new(usize::MAX));
        let pipeline = VisitorPipeline::new()
            .with_visitor(Reroot {
                order: order.clone(),
                seen: first.clone(),
            })
            .with_visitor(Identity)
            .with_visitor(Reroot {
                order: order.clone(),
                seen: second.clone(),
            });
        assert_eq!(pipeline.len(), 3);

        let outcome = pipeline.run(&document(true)).await.unwrap();
        assert!(outcome.is_changed());
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn errors_abort_the_document() {
        let pipeline = VisitorPipeline::new().with_visitor(Reroot {
            order: Arc::new(AtomicUsize::new(0)),
            seen: Arc::new(AtomicUsize::new(0)),
        });
        let err = pipeline.run(&document(false)).await.unwrap_err();
        assert!(matches!(err, VisitError::MissingTreeRoot { .. }));
        assert_eq!(err.to_string(), "Root cannot be found for document 'A.cs'.");
    }
}
