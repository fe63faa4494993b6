//! Output writing and JSON response types.
//!
//! This module owns two concerns:
//! - the output path policy: rewritten text goes to `<path>.upd` unless the
//!   run is configured to overwrite sources in place
//! - the JSON documents printed on stdout at the end of a run
//!
//! The writer refuses to write when the file on disk no longer matches the
//! content hash captured when the document was loaded.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::error::{OutputErrorCode, ReswriteError};
use crate::workspace::ContentHash;

/// Schema version for JSON output.
pub const SCHEMA_VERSION: &str = "1";

/// Extension appended to the source path when not rewriting in place.
pub const UPDATE_EXTENSION: &str = "upd";

// ============================================================================
// Writer
// ============================================================================

/// Errors raised while writing one document.
#[derive(Debug, Error)]
pub enum OutputError {
    /// The changed document has no file path.
    #[error("document '{document}' has no file path")]
    MissingOutputPath { document: String },

    /// The file was modified on disk after it was loaded.
    #[error("{} changed on disk since it was loaded", path.display())]
    ContentChanged { path: PathBuf },

    /// The target could not be read or written.
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Applies the output path policy and writes rewritten text.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputWriter {
    rewrite_files: bool,
    dry_run: bool,
}

impl OutputWriter {
    /// Create a writer.
    ///
    /// With `rewrite_files` the source is overwritten; otherwise the text
    /// goes to a `.upd` sibling. With `dry_run` nothing touches the disk.
    pub fn new(rewrite_files: bool, dry_run: bool) -> Self {
        Self {
            rewrite_files,
            dry_run,
        }
    }

    /// The path a document at `source` is written to.
    pub fn target_path(&self, source: &Path) -> PathBuf {
        if self.rewrite_files {
            source.to_path_buf()
        } else {
            let mut target = source.as_os_str().to_owned();
            target.push(".");
            target.push(UPDATE_EXTENSION);
            PathBuf::from(target)
        }
    }

    /// Write `text` for the document `name` loaded from `source`.
    ///
    /// When `expected` is given, the current bytes of `source` must still
    /// hash to it. Returns the target path.
    pub fn write(
        &self,
        name: &str,
        source: Option<&Path>,
        text: &str,
        expected: Option<&ContentHash>,
    ) -> Result<PathBuf, OutputError> {
        let source = source.ok_or_else(|| OutputError::MissingOutputPath {
            document: name.to_string(),
        })?;

        if let Some(expected) = expected {
            let current = fs::read(source).map_err(|e| OutputError::Io {
                path: source.to_path_buf(),
                source: e,
            })?;
            if &ContentHash::compute(&current) != expected {
                return Err(OutputError::ContentChanged {
                    path: source.to_path_buf(),
                });
            }
        }

        let target = self.target_path(source);
        if self.dry_run {
            info!(target = %target.display(), "dry run, not writing");
            return Ok(target);
        }

        fs::write(&target, text).map_err(|e| OutputError::Io {
            path: target.clone(),
            source: e,
        })?;
        info!(target = %target.display(), "wrote rewritten source");
        Ok(target)
    }
}

// ============================================================================
// Responses
// ============================================================================

/// Summary printed at the end of a successful run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    /// Always "ok".
    pub status: String,
    pub schema_version: String,
    /// Projects processed after filtering.
    pub projects: usize,
    /// Documents processed after filtering.
    pub documents: usize,
    /// Documents whose rewritten text was written (or would be, on dry run).
    pub rewritten: usize,
    /// Documents skipped because of a per-document error.
    pub skipped: usize,
    /// Whether this was a dry run.
    pub dry_run: bool,
    /// Target paths, in processing order.
    pub files: Vec<String>,
}

impl RunSummary {
    /// An empty summary.
    pub fn new(dry_run: bool) -> Self {
        Self {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            dry_run,
            ..Self::default()
        }
    }
}

/// Error details carried by an [`ErrorResponse`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Numeric error code.
    pub code: u8,
    /// Human-readable message.
    pub message: String,
    /// File involved, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl ErrorInfo {
    /// Create from a ReswriteError.
    pub fn from_error(err: &ReswriteError) -> Self {
        let file = match err {
            ReswriteError::FileNotFound { path } => Some(path.clone()),
            _ => None,
        };
        ErrorInfo {
            code: OutputErrorCode::from(err).code(),
            message: err.to_string(),
            file,
        }
    }
}

/// Response printed when a run fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always "error".
    pub status: String,
    pub schema_version: String,
    pub error: ErrorInfo,
}

impl ErrorResponse {
    /// Create from a ReswriteError.
    pub fn from_error(err: &ReswriteError) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            error: ErrorInfo::from_error(err),
        }
    }
}

/// Emit a response as pretty-printed JSON to a writer.
///
/// This is the single output path for the CLI.
pub fn emit_response<T: Serialize>(response: &T, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}
