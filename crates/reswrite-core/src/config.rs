//! Configuration handling for reswrite.
//!
//! Settings are read from the `appSettings` section of an optional JSON file
//! (`appconfig.json` by default). Key lookup is case-insensitive, so both
//! `solution` and `Solution` bind to the same setting.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

/// Default configuration file name, resolved against the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "appconfig.json";

/// Name of the section holding the settings.
pub const SETTINGS_SECTION: &str = "appSettings";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file exists but could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The configuration file is not valid JSON or has mistyped settings.
    #[error("invalid configuration in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A required setting is absent or empty.
    #[error("the '{setting}' configuration setting was not found in {} file", file.display())]
    ConfigurationMissing { setting: String, file: PathBuf },
}

/// Run settings.
///
/// Field names in the JSON file are matched ignoring ASCII case; the list
/// settings use dotted keys (`projects.include.names` and friends).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Path to the `.sln` (or a single `.csproj`) to process.
    pub solution: String,

    /// Overwrite source files instead of writing `<path>.upd` siblings.
    #[serde(rename = "rewritefiles")]
    pub rewrite_files: bool,

    /// Project names to skip (ignored when the include list is non-empty).
    #[serde(rename = "projects.exclude.names")]
    pub projects_exclude_names: Vec<String>,

    /// Project names to process exclusively.
    #[serde(rename = "projects.include.names")]
    pub projects_include_names: Vec<String>,

    /// Glob patterns of files to skip (ignored when the include list is non-empty).
    #[serde(rename = "files.exclude.patterns")]
    pub files_exclude_patterns: Vec<String>,

    /// Glob patterns of files to process exclusively.
    #[serde(rename = "files.include.patterns")]
    pub files_include_patterns: Vec<String>,
}

impl AppSettings {
    /// Load settings from `path`.
    ///
    /// A missing file yields default settings; callers apply overrides and
    /// then call [`AppSettings::validate`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "configuration file not found, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse settings from JSON text.
    pub fn from_json_str(content: &str) -> Result<Self, serde_json::Error> {
        let root: Value = serde_json::from_str(content)?;
        let section = match root {
            Value::Object(map) => map
                .into_iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(SETTINGS_SECTION))
                .map(|(_, value)| value),
            _ => None,
        };

        match section {
            Some(Value::Object(map)) => serde_json::from_value(Value::Object(lowercase_keys(map))),
            Some(Value::Null) | None => Ok(Self::default()),
            Some(other) => serde_json::from_value(other),
        }
    }

    /// Check that every required setting is present.
    pub fn validate(&self, file: &Path) -> Result<(), ConfigError> {
        if self.solution.trim().is_empty() {
            return Err(ConfigError::ConfigurationMissing {
                setting: "solution".to_string(),
                file: file.to_path_buf(),
            });
        }
        Ok(())
    }
}

fn lowercase_keys(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter()
        .map(|(key, value)| (key.to_ascii_lowercase(), value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parses_all_settings() {
        let json = r#"{
            "appSettings": {
                "solution": "src/App.sln",
                "rewriteFiles": true,
                "projects.include.names": ["App"],
                "projects.exclude.names": ["App.Tests"],
                "files.include.patterns": ["**/*.cs"],
                "files.exclude.patterns": ["*.Designer.cs"]
            }
        }"#;
        let settings = AppSettings::from_json_str(json).unwrap();
        assert_eq!(settings.solution, "src/App.sln");
        assert!(settings.rewrite_files);
        assert_eq!(settings.projects_include_names, vec!["App"]);
        assert_eq!(settings.projects_exclude_names, vec!["App.Tests"]);
        assert_eq!(settings.files_include_patterns, vec!["**/*.cs"]);
        assert_eq!(settings.files_exclude_patterns, vec!["*.Designer.cs"]);
    }

    #[test]
    fn keys_are_case_insensitive() {
        let json = r#"{ "AppSettings": { "Solution": "A.sln", "RewriteFiles": true } }"#;
        let settings = AppSettings::from_json_str(json).unwrap();
        assert_eq!(settings.solution, "A.sln");
        assert!(settings.rewrite_files);
    }

    #[test]
    fn missing_section_yields_defaults() {
        let settings = AppSettings::from_json_str(r#"{ "logging": {} }"#).unwrap();
        assert_eq!(settings, AppSettings::default());
        assert!(!settings.rewrite_files);
    }

    #[test]
    fn mistyped_setting_is_an_error() {
        let json = r#"{ "appSettings": { "rewriteFiles": "yes" } }"#;
        assert!(AppSettings::from_json_str(json).is_err());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = AppSettings::load(&dir.path().join(DEFAULT_CONFIG_FILE)).unwrap();
        assert_eq!(settings, AppSettings::default());
    }

    #[test]
    fn invalid_file_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&path, "{ not json").unwrap();
        let err = AppSettings::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Json { .. }));
        assert!(err.to_string().contains(DEFAULT_CONFIG_FILE));
    }

    #[test]
    fn empty_solution_fails_validation() {
        let settings = AppSettings::default();
        let err = settings.validate(Path::new(DEFAULT_CONFIG_FILE)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "the 'solution' configuration setting was not found in appconfig.json file"
        );
    }

    #[test]
    fn present_solution_passes_validation() {
        let settings = AppSettings {
            solution: "App.sln".to_string(),
            ..AppSettings::default()
        };
        assert!(settings.validate(Path::new(DEFAULT_CONFIG_FILE)).is_ok());
    }
}
