//! Project and file filters for restricting the scope of a run.
//!
//! Both filters share the same precedence:
//!
//! 1. If the include list is non-empty, only matching items are selected and
//!    the exclude list is ignored
//! 2. Otherwise, if the exclude list is non-empty, matching items are removed
//! 3. Otherwise every item passes
//!
//! Projects are matched by exact name. Files are matched by glob against
//! either the file name or the full path.

use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};
use thiserror::Error;

/// Error type for filter construction.
#[derive(Debug, Error)]
pub enum FilterError {
    /// Invalid glob pattern syntax.
    #[error("invalid glob pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// Exact-name filter used for projects.
#[derive(Debug, Clone, Default)]
pub struct NameFilter {
    include: Vec<String>,
    exclude: Vec<String>,
}

impl NameFilter {
    /// Create a filter from include and exclude name lists.
    pub fn new(include: &[String], exclude: &[String]) -> Self {
        Self {
            include: include.to_vec(),
            exclude: exclude.to_vec(),
        }
    }

    /// Check whether `name` is selected.
    pub fn matches(&self, name: &str) -> bool {
        if !self.include.is_empty() {
            return self.include.iter().any(|n| n == name);
        }
        if !self.exclude.is_empty() {
            return !self.exclude.iter().any(|n| n == name);
        }
        true
    }
}

/// Glob filter used for source files.
#[derive(Debug, Clone)]
pub struct FileFilterSpec {
    /// Glob set for inclusion patterns; `None` when no inclusions were given.
    inclusions: Option<GlobSet>,
    /// Glob set for exclusion patterns; `None` when no exclusions were given.
    exclusions: Option<GlobSet>,
}

impl FileFilterSpec {
    /// Build a filter from include and exclude pattern lists.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::Path;
    /// use reswrite_core::filter::FileFilterSpec;
    ///
    /// let spec = FileFilterSpec::new(&[], &["*.Designer.cs".to_string()]).unwrap();
    /// assert!(!spec.matches("Strings.Designer.cs", Some(Path::new("/src/Strings.Designer.cs"))));
    /// assert!(spec.matches("Program.cs", Some(Path::new("/src/Program.cs"))));
    /// ```
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self, FilterError> {
        let inclusions = if include.is_empty() {
            None
        } else {
            Some(build_glob_set(include)?)
        };
        let exclusions = if exclude.is_empty() {
            None
        } else {
            Some(build_glob_set(exclude)?)
        };
        Ok(Self {
            inclusions,
            exclusions,
        })
    }

    /// A filter that selects every file.
    pub fn all() -> Self {
        Self {
            inclusions: None,
            exclusions: None,
        }
    }

    /// Check whether a file with the given name and path is selected.
    ///
    /// A file without a path never satisfies an include list and is never
    /// removed by an exclude list.
    pub fn matches(&self, name: &str, path: Option<&Path>) -> bool {
        let hits = |set: &GlobSet, path: &Path| set.is_match(name) || set.is_match(path);

        if let Some(inclusions) = &self.inclusions {
            return path.is_some_and(|p| hits(inclusions, p));
        }
        if let Some(exclusions) = &self.exclusions {
            return path.is_none_or(|p| !hits(exclusions, p));
        }
        true
    }
}

/// Build a GlobSet from a list of patterns.
fn build_glob_set(patterns: &[String]) -> Result<GlobSet, FilterError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| FilterError::InvalidPattern {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| FilterError::InvalidPattern {
        pattern: patterns.join(", "),
        message: e.to_string(),
    })
}
