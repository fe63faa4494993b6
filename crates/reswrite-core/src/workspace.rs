//! Solution and project inventory.
//!
//! This module enumerates the projects of a solution and the source files of
//! each project:
//! - `.sln` files are scanned for `Project(...) = "Name", "path.csproj", ...` lines
//! - a `.csproj` path on its own is a single-project solution
//! - project sources are every `*.cs` file under the project directory,
//!   skipping `bin/`, `obj/` and hidden directories
//! - file ordering is deterministic (sorted by path)
//!
//! Projects listed in the solution but missing on disk do not fail the load;
//! they are reported as [`WorkspaceDiagnostic`]s.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

/// Source file extension handled by the workspace loader.
pub const SOURCE_EXTENSION: &str = "cs";

/// Directories never descended into when enumerating project sources.
pub const EXCLUDED_DIRS: &[&str] = &["bin", "obj"];

// ============================================================================
// Content Hash
// ============================================================================

/// SHA-256 hash of file contents, hex-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl ContentHash {
    /// Compute SHA-256 hash of the given bytes, returning hex-encoded string.
    pub fn compute(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        ContentHash(hex::encode(hasher.finalize()))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Errors that prevent a solution from loading at all.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// The solution or project path does not exist.
    #[error("solution not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// The path is neither a `.sln` nor a `.csproj`.
    #[error("unsupported solution file: {}", path.display())]
    UnsupportedFile { path: PathBuf },

    /// The solution file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A non-fatal problem found while loading a solution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceDiagnostic {
    pub message: String,
}

impl fmt::Display for WorkspaceDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

// ============================================================================
// Inventory
// ============================================================================

/// One project and its source files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectInfo {
    /// Project name as listed in the solution (or the `.csproj` file stem).
    pub name: String,
    /// Path to the project file.
    pub path: PathBuf,
    /// Source files, sorted by path.
    pub documents: Vec<PathBuf>,
}

/// A loaded solution.
#[derive(Debug, Clone)]
pub struct Solution {
    /// Path the solution was opened from.
    pub path: PathBuf,
    /// Projects in solution order.
    pub projects: Vec<ProjectInfo>,
    /// Problems that did not prevent loading.
    pub diagnostics: Vec<WorkspaceDiagnostic>,
}

impl Solution {
    /// Open a `.sln` or a single `.csproj`.
    pub fn open(path: &Path) -> Result<Self, WorkspaceError> {
        if !path.is_file() {
            return Err(WorkspaceError::NotFound {
                path: path.to_path_buf(),
            });
        }

        match extension_lowercase(path).as_deref() {
            Some("sln") => Self::open_sln(path),
            Some("csproj") => Ok(Solution {
                path: path.to_path_buf(),
                projects: vec![load_project(project_name_from_path(path), path.to_path_buf())],
                diagnostics: Vec::new(),
            }),
            _ => Err(WorkspaceError::UnsupportedFile {
                path: path.to_path_buf(),
            }),
        }
    }

    fn open_sln(path: &Path) -> Result<Self, WorkspaceError> {
        let content = fs::read_to_string(path).map_err(|source| WorkspaceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base = parent_dir(path);

        let mut projects = Vec::new();
        let mut diagnostics = Vec::new();
        for (name, relative) in parse_solution_projects(&content) {
            let project_path = base.join(normalize_separators(&relative));
            if !project_path.is_file() {
                diagnostics.push(WorkspaceDiagnostic {
                    message: format!(
                        "project file '{}' for project '{}' was not found",
                        project_path.display(),
                        name
                    ),
                });
                continue;
            }
            projects.push(load_project(name, project_path));
        }

        Ok(Solution {
            path: path.to_path_buf(),
            projects,
            diagnostics,
        })
    }
}

/// Extract `(name, relative path)` pairs for every C# project in a `.sln`.
///
/// Solution folders and non-C# projects are skipped.
pub fn parse_solution_projects(content: &str) -> Vec<(String, String)> {
    static PROJECT_LINE: OnceLock<Regex> = OnceLock::new();
    let re = PROJECT_LINE.get_or_init(|| {
        Regex::new(r#"(?m)^\s*Project\("\{[^}]*\}"\)\s*=\s*"([^"]*)"\s*,\s*"([^"]*)""#)
            .expect("project line regex is valid")
    });

    re.captures_iter(content)
        .filter_map(|caps| {
            let name = caps.get(1)?.as_str().to_string();
            let path = caps.get(2)?.as_str().to_string();
            path.to_ascii_lowercase()
                .ends_with(".csproj")
                .then_some((name, path))
        })
        .collect()
}

fn load_project(name: String, path: PathBuf) -> ProjectInfo {
    let root = parent_dir(&path).to_path_buf();
    ProjectInfo {
        name,
        documents: collect_sources(&root),
        path,
    }
}

/// Collect every source file under `root`, sorted by path.
pub fn collect_sources(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_excluded_dir(entry))
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| extension_lowercase(entry.path()).as_deref() == Some(SOURCE_EXTENSION))
        .map(DirEntry::into_path)
        .collect();
    files.sort();
    files
}

fn is_excluded_dir(entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || EXCLUDED_DIRS.iter().any(|d| name.eq_ignore_ascii_case(d))
}

/// The directory holding `path`; `.` for a bare file name.
fn parent_dir(path: &Path) -> &Path {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

fn extension_lowercase(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

fn project_name_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn normalize_separators(path: &str) -> PathBuf {
    PathBuf::from(path.replace('\\', "/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SLN: &str = r#"
Microsoft Visual Studio Solution File, Format Version 12.00
Project("{FAE04EC0-301F-11D3-BF4B-00C04F79EFBC}") = "App", "App\App.csproj", "{11111111-1111-1111-1111-111111111111}"
EndProject
Project("{2150E333-8FDC-42A3-9474-1A3956D46DE8}") = "Solution Items", "Solution Items", "{22222222-2222-2222-2222-222222222222}"
EndProject
Project("{9A19103F-16F7-4668-BE54-9A1E7A4F7556}") = "Lib", "src/Lib/Lib.csproj", "{33333333-3333-3333-3333-333333333333}"
EndProject
"#;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn content_hash_is_stable() {
        assert_eq!(ContentHash::compute(b"abc"), ContentHash::compute(b"abc"));
        assert_ne!(ContentHash::compute(b"abc"), ContentHash::compute(b"abd"));
        assert_eq!(ContentHash::compute(b"").0.len(), 64);
    }

    #[test]
    fn parses_only_csharp_projects() {
        let projects = parse_solution_projects(SLN);
        assert_eq!(
            projects,
            vec![
                ("App".to_string(), r"App\App.csproj".to_string()),
                ("Lib".to_string(), "src/Lib/Lib.csproj".to_string()),
            ]
        );
    }

    #[test]
    fn opens_solution_and_reports_missing_projects() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "App.sln", SLN);
        write(dir.path(), "App/App.csproj", "<Project />");
        write(dir.path(), "App/Program.cs", "class Program {}");

        let solution = Solution::open(&dir.path().join("App.sln")).unwrap();
        assert_eq!(solution.projects.len(), 1);
        assert_eq!(solution.projects[0].name, "App");
        assert_eq!(solution.diagnostics.len(), 1);
        assert!(solution.diagnostics[0].message.contains("'Lib'"));
    }

    #[test]
    fn collects_sorted_sources_skipping_build_output() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "b.cs", "");
        write(dir.path(), "a.cs", "");
        write(dir.path(), "sub/c.CS", "");
        write(dir.path(), "obj/Generated.cs", "");
        write(dir.path(), "bin/Debug/x.cs", "");
        write(dir.path(), ".vs/y.cs", "");
        write(dir.path(), "readme.md", "");

        let names: Vec<_> = collect_sources(dir.path())
            .into_iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("a.cs"),
                PathBuf::from("b.cs"),
                PathBuf::from("sub/c.CS"),
            ]
        );
    }

    #[test]
    fn csproj_opens_as_single_project() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "Tool/Tool.csproj", "<Project />");
        write(dir.path(), "Tool/Main.cs", "");

        let solution = Solution::open(&dir.path().join("Tool/Tool.csproj")).unwrap();
        assert_eq!(solution.projects.len(), 1);
        assert_eq!(solution.projects[0].name, "Tool");
        assert_eq!(solution.projects[0].documents.len(), 1);
    }

    #[test]
    fn bare_file_names_live_in_the_current_directory() {
        assert_eq!(parent_dir(Path::new("App.csproj")), Path::new("."));
        assert_eq!(parent_dir(Path::new("src/App.csproj")), Path::new("src"));
        assert_eq!(parent_dir(Path::new("/App.csproj")), Path::new("/"));
    }

    #[test]
    fn project_beside_the_solution() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "App.sln",
            "Project(\"{FAE04EC0-301F-11D3-BF4B-00C04F79EFBC}\") = \"App\", \"App.csproj\", \"{1}\"\n",
        );
        write(dir.path(), "App.csproj", "<Project />");
        write(dir.path(), "Program.cs", "class Program {}");

        let solution = Solution::open(&dir.path().join("App.sln")).unwrap();
        assert_eq!(solution.projects.len(), 1);
        assert_eq!(
            solution.projects[0].documents,
            vec![dir.path().join("Program.cs")]
        );
    }

    #[test]
    fn missing_solution_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = Solution::open(&dir.path().join("missing.sln")).unwrap_err();
        assert!(matches!(err, WorkspaceError::NotFound { .. }));
    }

    #[test]
    fn unsupported_extension_is_an_error() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "notes.txt", "");
        let err = Solution::open(&dir.path().join("notes.txt")).unwrap_err();
        assert!(matches!(err, WorkspaceError::UnsupportedFile { .. }));
    }
}
