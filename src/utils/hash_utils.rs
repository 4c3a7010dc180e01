use std::path::Path;
use anyhow::Result;
use sha2::{Sha256, Digest};
use log::trace;

use super::file_utils;

/// Calculate SHA-256 hash of a string
pub fn hash_string(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Calculate SHA-256 hash of a sequence of lines as they would be written
pub fn hash_lines(lines: &[String]) -> String {
    let mut hasher = Sha256::new();
    for line in lines {
        hasher.update(line.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// Calculate SHA-256 hash of a file
pub fn hash_file(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    trace!("Calculating hash for file: {}", path.display());

    let lines = file_utils::read_lines(path)?;
    Ok(hash_lines(&lines))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_hash_matches_joined_content() {
        let lines = vec!["a\n".to_string(), "b".to_string()];
        assert_eq!(hash_lines(&lines), hash_string("a\nb"));
    }
}
