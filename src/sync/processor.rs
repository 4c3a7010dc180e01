use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::parser::{parse_classes, parse_declarations, parse_definitions, ClassRecord, SourceText};
use crate::utils::{file_utils, hash_utils};

use super::differ::{assign_identity_keys, pair};
use super::file_collector::FileCollector;
use super::progress::ProgressTracker;
use super::stats::SyncStats;
use super::types::{SyncFailure, SyncOptions, SyncOutcome, SyncReport};
use super::writer::rewrite_header;

static INCLUDE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*#\s*include\s*"([^"]+)""#).unwrap());

/// A computed rewrite that has not touched the disk yet
#[derive(Debug, Clone)]
pub struct SyncPlan {
    pub outcome: SyncOutcome,

    /// Full rewritten header text, line by line
    pub lines: Vec<String>,
}

/// First quoted `#include` target in `lines`
pub fn find_include(lines: &[String]) -> Option<String> {
    lines
        .iter()
        .find_map(|line| INCLUDE_RE.captures(line).map(|captures| captures[1].to_string()))
}

/// Header synchronizer: plans rewrites from source files and applies them
#[derive(Debug)]
pub struct SyncProcessor {
    /// Configuration options for synchronization
    options: SyncOptions,

    /// File collector for batch mode
    file_collector: FileCollector,

    /// Progress tracker for batch planning
    progress_tracker: ProgressTracker,
}

impl SyncProcessor {
    /// Create a new processor with the given options
    pub fn new(options: SyncOptions) -> Self {
        Self {
            file_collector: FileCollector::with_extensions(options.source_extensions.clone()),
            progress_tracker: ProgressTracker::new(),
            options,
        }
    }

    /// Create a new processor with default options
    pub fn with_defaults() -> Self {
        Self::new(SyncOptions::default())
    }

    /// Hide the batch progress bar
    pub fn without_progress(mut self) -> Self {
        self.progress_tracker = ProgressTracker::hidden();
        self
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Locate the header named by the source's first quoted `#include`.
    ///
    /// Tried against the `root_marker` ancestor, then the source's own directory, then each
    /// configured include root.
    pub fn resolve_header(&self, source: &Path, source_lines: &[String]) -> Result<PathBuf> {
        let include = find_include(source_lines)
            .with_context(|| format!("No #include \"...\" line found in {}", source.display()))?;

        let absolute = source.canonicalize().unwrap_or_else(|_| source.to_path_buf());
        let mut bases = Vec::new();
        bases.extend(file_utils::find_ancestor_named(&absolute, &self.options.root_marker));
        bases.extend(absolute.parent().map(Path::to_path_buf));
        bases.extend(self.options.include_roots.iter().cloned());

        for base in &bases {
            let candidate = base.join(&include);
            if candidate.is_file() {
                debug!("Resolved \"{}\" to {}", include, candidate.display());
                return Ok(candidate);
            }
        }

        bail!(
            "Header \"{}\" included by {} not found under {}",
            include,
            source.display(),
            bases.iter().map(|b| b.display().to_string()).collect::<Vec<_>>().join(", ")
        )
    }

    /// Pick the class to synchronize: the named one, or the first one the source defines members of
    fn select_class(
        &self,
        classes: Vec<ClassRecord>,
        class_name: Option<&str>,
        header: &Path,
        source_lines: &[String],
    ) -> Result<ClassRecord> {
        let found = match class_name {
            Some(name) => classes.into_iter().find(|class| class.name == name),
            None => classes.into_iter().find(|class| {
                let qualifier = format!("{}::", class.name);
                source_lines.iter().any(|line| line.contains(&qualifier))
            }),
        };
        found.ok_or_else(|| match class_name {
            Some(name) => anyhow!("Class {} not found in {}", name, header.display()),
            None => anyhow!("No class in {} has definitions in the source", header.display()),
        })
    }

    /// Compute the rewritten header for `source` without writing anything
    pub fn plan(&self, source: &Path, header: Option<&Path>, class_name: Option<&str>) -> Result<SyncPlan> {
        let source_lines = file_utils::read_lines(source)?;
        let header = match header {
            Some(header) => header.to_path_buf(),
            None => self.resolve_header(source, &source_lines)?,
        };
        let header_lines = file_utils::read_lines(&header)?;

        let classes = parse_classes(&SourceText::from_lines(header_lines.clone()))
            .with_context(|| format!("Failed to parse classes in {}", header.display()))?;
        let class = self.select_class(classes, class_name, &header, &source_lines)?;
        debug!("Synchronizing class {} from {}", class.name, header.display());

        let qualifier = format!("{}::", class.name);
        let first_definition = source_lines
            .iter()
            .position(|line| line.contains(&qualifier))
            .with_context(|| format!("No {}... definition found in {}", qualifier, source.display()))?;
        let definitions_text = SourceText::from_lines(source_lines[first_definition..].to_vec());

        let mut declared = parse_declarations(&class)
            .with_context(|| format!("Failed to parse declarations of {} in {}", class.name, header.display()))?;
        let mut defined = parse_definitions(&definitions_text, &class.name)
            .with_context(|| format!("Failed to parse definitions in {}", source.display()))?;
        debug!("Found {} declarations and {} definitions", declared.len(), defined.len());

        assign_identity_keys(&mut declared);
        assign_identity_keys(&mut defined);
        let pairing = pair(&declared, &defined);
        pairing.annotate(&mut declared);

        let rewritten = rewrite_header(&header_lines, &class, &declared, &defined, &pairing)
            .with_context(|| format!("Failed to rewrite {}", header.display()))?;

        info!(
            "{}: {} updated, {} deleted, {} added, {} unchanged",
            class.name,
            rewritten.updated.len(),
            rewritten.deleted.len(),
            rewritten.added.len(),
            pairing.unchanged.len()
        );

        let outcome = SyncOutcome {
            source: source.to_path_buf(),
            header,
            class_name: class.name,
            updated: rewritten.updated,
            deleted: rewritten.deleted,
            added: rewritten.added,
            unchanged: pairing.unchanged.len(),
            hash_before: hash_utils::hash_lines(&header_lines),
            hash_after: hash_utils::hash_lines(&rewritten.lines),
            written: false,
        };
        Ok(SyncPlan { outcome, lines: rewritten.lines })
    }

    /// Write a plan to disk: backup, temp sibling, rename
    pub fn apply(&self, plan: SyncPlan) -> Result<SyncOutcome> {
        let SyncPlan { mut outcome, lines } = plan;
        let header = outcome.header.clone();

        if !outcome.has_changes() {
            info!("{} is already in sync", header.display());
            return Ok(outcome);
        }
        if self.options.dry_run {
            info!("Dry run: not writing {}", header.display());
            return Ok(outcome);
        }

        let current_hash = hash_utils::hash_file(&header)?;
        if current_hash != outcome.hash_before {
            bail!("{} changed on disk since it was read", header.display());
        }

        if self.options.backup {
            file_utils::backup_file(&header, &self.options.backup_suffix)?;
        }
        file_utils::replace_file(&header, &lines.concat(), &self.options.temp_suffix)?;
        info!("Wrote {}", header.display());

        outcome.written = true;
        Ok(outcome)
    }

    /// Plan and apply for one source file
    pub fn sync_file(&self, source: &Path, header: Option<&Path>, class_name: Option<&str>) -> Result<SyncOutcome> {
        let plan = self.plan(source, header, class_name)?;
        self.apply(plan)
    }

    /// Synchronize every source file under `input_dir`.
    ///
    /// Plans run in parallel; writes happen afterwards one at a time, and a header claimed by an
    /// earlier source is not rewritten again.
    pub fn sync_directory(&self, input_dir: impl AsRef<Path>) -> Result<SyncReport> {
        let input_dir = input_dir.as_ref();
        info!("Scanning directory: {}", input_dir.display());

        let mut files = self.file_collector.collect_files(input_dir)?;
        if let Some(max_files) = self.options.max_files {
            if files.len() > max_files {
                warn!("Limiting to {} files out of {}", max_files, files.len());
                files.truncate(max_files);
            }
        }
        info!("Found {} files to process", files.len());

        let thread_count = self.options.parallel_threads.unwrap_or_else(|| {
            let available = num_cpus::get();
            let used = std::cmp::max(1, available.saturating_sub(1));
            debug!("Using {} threads for parallel processing (available: {})", used, available);
            used
        });
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(thread_count)
            .build()
            .context("Failed to build thread pool")?;

        let plans = pool.install(|| {
            self.progress_tracker
                .track_path_progress(&files, |source| self.plan(source, None, None))
        });

        let mut stats = SyncStats::new();
        let mut outcomes = Vec::new();
        let mut failures = Vec::new();
        let mut claimed_headers = HashSet::new();

        for (source, plan) in files.iter().zip(plans) {
            let result = plan.and_then(|plan| {
                let key = plan.outcome.header.canonicalize().unwrap_or_else(|_| plan.outcome.header.clone());
                if !claimed_headers.insert(key) && plan.outcome.has_changes() {
                    bail!("{} was already synchronized in this batch", plan.outcome.header.display());
                }
                self.apply(plan)
            });

            match result {
                Ok(outcome) => {
                    stats.record(&outcome);
                    outcomes.push(outcome);
                }
                Err(e) => {
                    warn!("Failed to synchronize {}: {:#}", source.display(), e);
                    stats.record_failure(source);
                    failures.push(SyncFailure {
                        source: source.clone(),
                        error: format!("{:#}", e),
                    });
                }
            }
        }

        info!(
            "Processed {} files: {} written, {} already in sync, {} failed",
            stats.total_files, stats.written_headers, stats.in_sync_headers, stats.error_files
        );
        Ok(SyncReport::new(stats, outcomes, failures))
    }
}
