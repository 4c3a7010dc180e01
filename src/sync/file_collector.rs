use std::path::{Path, PathBuf};
use anyhow::Result;
use log::{debug, trace};
use walkdir::WalkDir;

use crate::utils::file_utils;

/// File collector for finding source files in batch mode
#[derive(Debug, Default)]
pub struct FileCollector {
    /// Valid file extensions to collect
    valid_extensions: Vec<String>,
}

impl FileCollector {
    /// Create a new file collector for `.cc` and `.cpp` sources
    pub fn new() -> Self {
        Self {
            valid_extensions: vec!["cc".to_string(), "cpp".to_string()],
        }
    }

    /// Create a new file collector with custom file extensions
    pub fn with_extensions(extensions: Vec<String>) -> Self {
        Self {
            valid_extensions: extensions,
        }
    }

    /// Collect all files with valid extensions under `input_dir`, sorted by path
    pub fn collect_files(&self, input_dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let input_dir = input_dir.as_ref();
        debug!("Collecting files from directory: {}", input_dir.display());

        let mut files = Vec::new();
        for entry in WalkDir::new(input_dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            if file_utils::has_any_extension(entry.path(), &self.valid_extensions) {
                trace!("Found file: {}", entry.path().display());
                files.push(entry.into_path());
            }
        }

        debug!("Collected {} files for processing", files.len());
        Ok(files)
    }

    /// Get the list of valid file extensions
    pub fn extensions(&self) -> &[String] {
        &self.valid_extensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn collects_sources_only() -> Result<()> {
        let dir = tempdir()?;
        fs::create_dir_all(dir.path().join("nested"))?;
        fs::write(dir.path().join("b.cc"), "")?;
        fs::write(dir.path().join("a.h"), "")?;
        fs::write(dir.path().join("nested/c.CPP"), "")?;
        fs::write(dir.path().join("notes.txt"), "")?;

        let files = FileCollector::new().collect_files(dir.path())?;
        assert_eq!(files, vec![dir.path().join("b.cc"), dir.path().join("nested/c.CPP")]);
        Ok(())
    }
}
