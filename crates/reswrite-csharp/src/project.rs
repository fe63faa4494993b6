//! Loading a project's documents.
//!
//! Every source file of a project is read, hashed and parsed, and all trees
//! feed one [`Compilation`]. Files that cannot be read or parsed still become
//! documents, without a tree, so the caller can report them per document.

use std::fs;
use std::path::Path;

use tracing::warn;

use reswrite_core::workspace::{ContentHash, ProjectInfo};
use reswrite_cst::parse_compilation_unit;

use crate::compilation::Compilation;
use crate::document::{Document, DocumentId};

/// A project with its documents loaded.
#[derive(Debug, Clone)]
pub struct LoadedProject {
    pub name: String,
    pub documents: Vec<Document>,
}

/// Allocates document ids across projects.
#[derive(Debug, Default)]
pub struct DocumentIdGenerator {
    next: u32,
}

impl DocumentIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> DocumentId {
        let id = DocumentId(self.next);
        self.next += 1;
        id
    }
}

/// Read and parse every document of `project`.
pub fn load_project(project: &ProjectInfo, ids: &mut DocumentIdGenerator) -> LoadedProject {
    let mut documents: Vec<Document> = project
        .documents
        .iter()
        .map(|path| load_document(ids.next_id(), path))
        .collect();

    let trees: Vec<_> = documents.iter().filter_map(Document::syntax_root).collect();
    let compilation = Compilation::new(&trees);
    documents = documents
        .into_iter()
        .map(|doc| doc.with_compilation(compilation.clone()))
        .collect();

    LoadedProject {
        name: project.name.clone(),
        documents,
    }
}

fn load_document(id: DocumentId, path: &Path) -> Document {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(error) => {
            warn!(file = %path.display(), %error, "cannot read source file");
            return Document::new(id, name, Some(path.to_path_buf()), None);
        }
    };
    let hash = ContentHash::compute(&bytes);

    let tree = match String::from_utf8(bytes) {
        Ok(text) => match parse_compilation_unit(&text) {
            Ok(tree) => Some(tree),
            Err(error) => {
                warn!(file = %path.display(), %error, "cannot parse source file");
                None
            }
        },
        Err(_) => {
            warn!(file = %path.display(), "source file is not valid UTF-8");
            None
        }
    };

    Document::new(id, name, Some(path.to_path_buf()), tree).with_content_hash(hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn project(dir: &TempDir, files: &[(&str, &str)]) -> ProjectInfo {
        let mut documents = Vec::new();
        for (name, content) in files {
            let path = dir.path().join(name);
            fs::write(&path, content).unwrap();
            documents.push(path);
        }
        ProjectInfo {
            name: "App".to_string(),
            path: dir.path().join("App.csproj"),
            documents,
        }
    }

    #[test]
    fn documents_share_one_compilation() {
        let dir = TempDir::new().unwrap();
        let info = project(
            &dir,
            &[
                ("Res.cs", "[Gen(\"x\")] class Res { }"),
                ("Use.cs", "class Use { void M() { Res.AFormat(1); } }"),
            ],
        );
        let loaded = load_project(&info, &mut DocumentIdGenerator::new());
        assert_eq!(loaded.documents.len(), 2);

        let model = loaded.documents[1].semantic_model().unwrap();
        assert!(model.compilation().resolve_type("Res").is_some());
        assert_eq!(loaded.documents[0].id(), DocumentId(0));
        assert_eq!(loaded.documents[1].name(), "Use.cs");
        assert!(loaded.documents[1].content_hash().is_some());
    }

    #[test]
    fn unparsable_files_have_no_tree() {
        let dir = TempDir::new().unwrap();
        let info = project(&dir, &[("Broken.cs", "class C { void M( }")]);
        let loaded = load_project(&info, &mut DocumentIdGenerator::new());
        assert!(loaded.documents[0].syntax_root().is_none());
        assert!(loaded.documents[0].path().is_some());
    }

    #[test]
    fn unreadable_files_have_no_tree() {
        let info = ProjectInfo {
            name: "App".to_string(),
            path: PathBuf::from("/nonexistent/App.csproj"),
            documents: vec![PathBuf::from("/nonexistent/Gone.cs")],
        };
        let loaded = load_project(&info, &mut DocumentIdGenerator::new());
        assert!(loaded.documents[0].syntax_root().is_none());
        assert!(loaded.documents[0].content_hash().is_none());
    }

    #[test]
    fn ids_continue_across_projects() {
        let dir = TempDir::new().unwrap();
        let info = project(&dir, &[("A.cs", "class A { }")]);
        let mut ids = DocumentIdGenerator::new();
        let first = load_project(&info, &mut ids);
        let second = load_project(&info, &mut ids);
        assert_eq!(first.documents[0].id(), DocumentId(0));
        assert_eq!(second.documents[0].id(), DocumentId(1));
    }
}
