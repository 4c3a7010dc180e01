use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use super::stats::SyncStats;
use super::writer::DeclarationChange;

/// Config file picked up from the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "cpp_refactor.toml";

/// Configuration options for header synchronization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncOptions {
    /// Name of the ancestor directory that `#include "..."` paths are relative to
    pub root_marker: String,

    /// Extra directories to resolve includes against
    pub include_roots: Vec<PathBuf>,

    /// Whether to copy the header aside before replacing it
    pub backup: bool,

    /// Appended to the header file name for the backup copy
    pub backup_suffix: String,

    /// Appended to the header file name for the not-yet-renamed rewrite
    pub temp_suffix: String,

    /// Compute and report changes without writing anything
    pub dry_run: bool,

    /// Source file extensions collected in batch mode
    pub source_extensions: Vec<String>,

    /// Maximum number of source files to process in batch mode
    pub max_files: Option<usize>,

    /// Number of parallel threads to use in batch mode
    pub parallel_threads: Option<usize>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            root_marker: "google3".to_string(),
            include_roots: Vec::new(),
            backup: true,
            backup_suffix: ".before_cpp_refactor.h".to_string(),
            temp_suffix: ".modified_by_cpp_refactor.h".to_string(),
            dry_run: false,
            source_extensions: vec!["cc".to_string(), "cpp".to_string()],
            max_files: None,
            parallel_threads: None,
        }
    }
}

impl SyncOptions {
    /// Load options from a TOML file; missing keys keep their defaults
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Load from `path`, else from `cpp_refactor.toml` in the working directory, else defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_toml_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                debug!("Using config file {}", DEFAULT_CONFIG_FILE);
                Self::from_toml_file(DEFAULT_CONFIG_FILE)
            }
            None => Ok(Self::default()),
        }
    }
}

/// Result of synchronizing one header with one source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncOutcome {
    pub source: PathBuf,
    pub header: PathBuf,
    pub class_name: String,

    /// Declarations rewritten to match a changed definition
    pub updated: Vec<DeclarationChange>,

    /// Declarations removed
    pub deleted: Vec<String>,

    /// Declarations inserted into the public section
    pub added: Vec<String>,

    /// Declarations already matching a definition
    pub unchanged: usize,

    /// SHA-256 of the header as read
    pub hash_before: String,

    /// SHA-256 of the rewritten header
    pub hash_after: String,

    /// Whether the header file was replaced on disk
    pub written: bool,
}

impl SyncOutcome {
    /// Whether the rewrite differs from the header on disk
    pub fn has_changes(&self) -> bool {
        self.hash_before != self.hash_after
    }
}

/// A source file that could not be synchronized
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncFailure {
    pub source: PathBuf,
    pub error: String,
}

/// JSON report written by `--report`
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub generated_at: DateTime<Utc>,
    pub stats: SyncStats,
    pub outcomes: Vec<SyncOutcome>,
    pub failures: Vec<SyncFailure>,
}

impl SyncReport {
    pub fn new(stats: SyncStats, outcomes: Vec<SyncOutcome>, failures: Vec<SyncFailure>) -> Self {
        Self {
            generated_at: Utc::now(),
            stats,
            outcomes,
            failures,
        }
    }

    /// Write the report as pretty-printed JSON
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("Failed to serialize report")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn partial_config_keeps_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = dir.path().join("cpp_refactor.toml");
        std::fs::write(&config, "backup = false\ninclude_roots = [\"/src\"]\n")?;

        let options = SyncOptions::from_toml_file(&config)?;
        assert!(!options.backup);
        assert_eq!(options.include_roots, vec![PathBuf::from("/src")]);
        assert_eq!(options.root_marker, "google3");
        assert_eq!(options.source_extensions, vec!["cc", "cpp"]);
        Ok(())
    }

    #[test]
    fn unknown_values_are_rejected() -> Result<()> {
        let dir = tempdir()?;
        let config = dir.path().join("bad.toml");
        std::fs::write(&config, "backup = \"maybe\"\n")?;
        assert!(SyncOptions::from_toml_file(&config).is_err());
        Ok(())
    }
}
