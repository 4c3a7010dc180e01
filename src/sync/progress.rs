use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

/// Below this many files no bar is drawn
const MIN_FILES_FOR_BAR: usize = 10;

/// Progress tracker for batch planning
#[derive(Debug, Default)]
pub struct ProgressTracker {
    /// Hide the bar regardless of the file count
    hidden: bool,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracker that never draws
    pub fn hidden() -> Self {
        Self { hidden: true }
    }

    fn progress_bar(&self, len: usize) -> Option<ProgressBar> {
        if self.hidden || len <= MIN_FILES_FOR_BAR {
            return None;
        }

        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({eta}) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        Some(ProgressBar::new(len as u64).with_style(style))
    }

    /// Run `operation` over `paths` in parallel, keeping input order in the result
    pub fn track_path_progress<F, R>(&self, paths: &[PathBuf], operation: F) -> Vec<R>
    where
        F: Fn(&PathBuf) -> R + Sync + Send,
        R: Send,
    {
        let progress_bar = self.progress_bar(paths.len());
        let processed_count = AtomicUsize::new(0);

        let results: Vec<R> = paths
            .par_iter()
            .map(|path| {
                let result = operation(path);

                let current_count = processed_count.fetch_add(1, Ordering::SeqCst) + 1;
                if let Some(pb) = &progress_bar {
                    pb.set_position(current_count as u64);

                    // Update message occasionally to avoid too many redraws
                    if current_count % 10 == 0 || current_count == paths.len() {
                        if let Some(file_name) = path.file_name() {
                            pb.set_message(format!("{}", file_name.to_string_lossy()));
                        }
                    }
                }
                result
            })
            .collect();

        if let Some(pb) = progress_bar {
            pb.finish_with_message("Planning complete");
        }

        results
    }
}
