use std::path::PathBuf;

use serde::Serialize;

use super::types::SyncOutcome;

/// Statistics for a synchronization run
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    /// Total number of source files processed
    pub total_files: usize,

    /// Number of headers that already matched their source
    pub in_sync_headers: usize,

    /// Number of headers replaced on disk
    pub written_headers: usize,

    /// Number of headers with pending changes that were not written (dry run)
    pub pending_headers: usize,

    /// Total declarations rewritten
    pub updated_declarations: usize,

    /// Total declarations removed
    pub deleted_declarations: usize,

    /// Total declarations inserted
    pub added_declarations: usize,

    /// Number of source files that failed
    pub error_files: usize,

    /// Paths to source files that failed
    pub error_file_paths: Vec<PathBuf>,
}

impl SyncStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one successful outcome
    pub fn record(&mut self, outcome: &SyncOutcome) {
        self.total_files += 1;
        self.updated_declarations += outcome.updated.len();
        self.deleted_declarations += outcome.deleted.len();
        self.added_declarations += outcome.added.len();
        if outcome.written {
            self.written_headers += 1;
        } else if outcome.has_changes() {
            self.pending_headers += 1;
        } else {
            self.in_sync_headers += 1;
        }
    }

    /// Count one failed source file
    pub fn record_failure(&mut self, source: impl Into<PathBuf>) {
        self.total_files += 1;
        self.error_files += 1;
        self.error_file_paths.push(source.into());
    }

    /// Merge another stats instance into this one
    pub fn merge(&mut self, other: &Self) {
        self.total_files += other.total_files;
        self.in_sync_headers += other.in_sync_headers;
        self.written_headers += other.written_headers;
        self.pending_headers += other.pending_headers;
        self.updated_declarations += other.updated_declarations;
        self.deleted_declarations += other.deleted_declarations;
        self.added_declarations += other.added_declarations;
        self.error_files += other.error_files;
        self.error_file_paths.extend(other.error_file_paths.iter().cloned());
    }

    /// Percentage of source files processed without error
    pub fn success_rate(&self) -> f64 {
        if self.total_files == 0 {
            return 0.0;
        }

        let successful = self.total_files - self.error_files;
        (successful as f64 / self.total_files as f64) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::writer::DeclarationChange;

    fn outcome(written: bool, hash_after: &str) -> SyncOutcome {
        SyncOutcome {
            source: PathBuf::from("a.cc"),
            header: PathBuf::from("a.h"),
            class_name: "A".to_string(),
            updated: vec![DeclarationChange { before: "void f();".into(), after: "void f(int a);".into() }],
            deleted: Vec::new(),
            added: vec!["void g();".to_string()],
            unchanged: 2,
            hash_before: "x".to_string(),
            hash_after: hash_after.to_string(),
            written,
        }
    }

    #[test]
    fn records_and_merges() {
        let mut stats = SyncStats::new();
        stats.record(&outcome(true, "y"));
        stats.record(&outcome(false, "y"));

        let mut other = SyncStats::new();
        other.record(&outcome(false, "x"));
        other.record_failure("broken.cc");
        stats.merge(&other);

        assert_eq!(stats.total_files, 4);
        assert_eq!(stats.written_headers, 1);
        assert_eq!(stats.pending_headers, 1);
        assert_eq!(stats.in_sync_headers, 1);
        assert_eq!(stats.added_declarations, 3);
        assert_eq!(stats.error_file_paths, vec![PathBuf::from("broken.cc")]);
        assert_eq!(stats.success_rate(), 75.0);
    }
}
