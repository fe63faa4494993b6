//! Documents: one source file's current tree plus its metadata.
//!
//! A [`Document`] is a cheap-to-clone handle. Every edit produces a new
//! handle; the old one stays valid and keeps pointing at the old tree.
//! Identity ([`Document::ptr_eq`]) tells whether a document was changed.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use reswrite_core::workspace::ContentHash;
use reswrite_cst::{Node, SyntaxTree};

use crate::compilation::{Compilation, SemanticModel};

/// Stable identifier of a document within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(pub u32);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doc_{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct DocumentData {
    id: DocumentId,
    name: String,
    path: Option<PathBuf>,
    tree: Option<Arc<SyntaxTree>>,
    compilation: Option<Arc<Compilation>>,
    content_hash: Option<ContentHash>,
}

/// An immutable source document.
#[derive(Debug, Clone)]
pub struct Document {
    data: Arc<DocumentData>,
}

impl Document {
    /// A document without a compilation or content hash.
    pub fn new(
        id: DocumentId,
        name: impl Into<String>,
        path: Option<PathBuf>,
        tree: Option<Arc<SyntaxTree>>,
    ) -> Self {
        Self {
            data: Arc::new(DocumentData {
                id,
                name: name.into(),
                path,
                tree,
                compilation: None,
                content_hash: None,
            }),
        }
    }

    pub fn with_compilation(self, compilation: Arc<Compilation>) -> Self {
        self.map(|data| data.compilation = Some(compilation))
    }

    pub fn with_content_hash(self, hash: ContentHash) -> Self {
        self.map(|data| data.content_hash = Some(hash))
    }

    fn map(&self, f: impl FnOnce(&mut DocumentData)) -> Self {
        let mut data = DocumentData::clone(&self.data);
        f(&mut data);
        Self {
            data: Arc::new(data),
        }
    }

    pub fn id(&self) -> DocumentId {
        self.data.id
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    pub fn path(&self) -> Option<&Path> {
        self.data.path.as_deref()
    }

    /// Hash of the file bytes the tree was parsed from.
    pub fn content_hash(&self) -> Option<&ContentHash> {
        self.data.content_hash.as_ref()
    }

    pub fn compilation(&self) -> Option<&Arc<Compilation>> {
        self.data.compilation.as_ref()
    }

    /// The current tree, if the document has one.
    pub fn syntax_root(&self) -> Option<Arc<SyntaxTree>> {
        self.data.tree.clone()
    }

    /// A semantic model for the current tree. `None` without a compilation.
    pub fn semantic_model(&self) -> Option<SemanticModel> {
        let compilation = self.data.compilation.as_ref()?;
        let tree = self.data.tree.as_ref()?;
        Some(compilation.semantic_model(tree))
    }

    /// A new document pointing at `root`, sharing this one's metadata.
    pub fn with_syntax_root(&self, root: Node) -> Self {
        self.with_syntax_tree(SyntaxTree::new(root))
    }

    /// A new document pointing at `tree`, sharing this one's metadata.
    pub fn with_syntax_tree(&self, tree: Arc<SyntaxTree>) -> Self {
        self.map(|data| data.tree = Some(tree))
    }

    /// Full text of the current tree.
    pub fn to_full_text(&self) -> Option<String> {
        self.data.tree.as_ref().map(|tree| tree.to_full_text())
    }

    /// Identity comparison: true only for handles to the same document value.
    pub fn ptr_eq(a: &Document, b: &Document) -> bool {
        Arc::ptr_eq(&a.data, &b.data)
    }
}
