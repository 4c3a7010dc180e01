use std::path::{Path, PathBuf};
use std::fs;
use anyhow::{Result, Context};
use log::{debug, trace};

/// Create a directory if it doesn't exist
pub fn ensure_dir_exists(dir: impl AsRef<Path>) -> Result<()> {
    let dir = dir.as_ref();
    if !dir.exists() {
        debug!("Creating directory: {}", dir.display());
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }
    Ok(())
}

/// Check if a file has a specific extension
pub fn has_extension(path: impl AsRef<Path>, extension: &str) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

/// Check if a file has one of the specified extensions
pub fn has_any_extension(path: impl AsRef<Path>, extensions: &[String]) -> bool {
    extensions.iter().any(|ext| has_extension(path.as_ref(), ext))
}

/// Read a file as lines, each keeping its terminator
pub fn read_lines(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file {}", path.display()))?;
    trace!("Read {} bytes from {}", content.len(), path.display());
    Ok(content.split_inclusive('\n').map(str::to_string).collect())
}

/// Nearest ancestor directory of `path` named `name`
pub fn find_ancestor_named(path: impl AsRef<Path>, name: &str) -> Option<PathBuf> {
    path.as_ref()
        .ancestors()
        .find(|ancestor| ancestor.file_name().is_some_and(|file_name| file_name == name))
        .map(Path::to_path_buf)
}

/// `path` with `suffix` appended to its file name
pub fn with_suffix(path: impl AsRef<Path>, suffix: &str) -> PathBuf {
    let path = path.as_ref();
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(suffix);
    path.with_file_name(name)
}

/// Copy `path` next to itself with `suffix` appended, returning the copy's path
pub fn backup_file(path: impl AsRef<Path>, suffix: &str) -> Result<PathBuf> {
    let path = path.as_ref();
    let backup = with_suffix(path, suffix);
    fs::copy(path, &backup)
        .with_context(|| format!("Failed to back up {} to {}", path.display(), backup.display()))?;
    debug!("Backed up {} to {}", path.display(), backup.display());
    Ok(backup)
}

/// Replace `path` by writing a sibling temp file and renaming it over the original
pub fn replace_file(path: impl AsRef<Path>, content: &str, temp_suffix: &str) -> Result<()> {
    let path = path.as_ref();

    // Create parent directory if it doesn't exist
    if let Some(parent) = path.parent() {
        ensure_dir_exists(parent)?;
    }

    let temp = with_suffix(path, temp_suffix);
    fs::write(&temp, content)
        .with_context(|| format!("Failed to write file {}", temp.display()))?;
    fs::rename(&temp, path)
        .with_context(|| format!("Failed to move {} to {}", temp.display(), path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn replace_leaves_no_temp_file() -> Result<()> {
        let dir = tempdir()?;
        let header = dir.path().join("a.h");
        fs::write(&header, "old\n")?;

        let backup = backup_file(&header, ".bak")?;
        replace_file(&header, "new\n", ".tmp")?;

        assert_eq!(fs::read_to_string(&header)?, "new\n");
        assert_eq!(fs::read_to_string(backup)?, "old\n");
        assert!(!dir.path().join("a.h.tmp").exists());
        Ok(())
    }

    #[test]
    fn lines_keep_terminators() -> Result<()> {
        let dir = tempdir()?;
        let file = dir.path().join("a.cc");
        fs::write(&file, "one\ntwo")?;
        assert_eq!(read_lines(&file)?, vec!["one\n".to_string(), "two".to_string()]);
        Ok(())
    }

    #[test]
    fn finds_marker_ancestor() {
        let found = find_ancestor_named("/work/google3/base/strings/a.cc", "google3");
        assert_eq!(found, Some(PathBuf::from("/work/google3")));
        assert_eq!(find_ancestor_named("/work/src/a.cc", "google3"), None);
    }
}
