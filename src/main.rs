use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;

use cpp_refactor::sync::{SyncOptions, SyncProcessor, SyncReport, SyncStats};

/// Rewrite C++ class declarations in a header to match the definitions in its source file.
#[derive(Parser)]
#[command(name = "cpp_refactor", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML config file (default: ./cpp_refactor.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write a JSON report of the run to this file
    #[arg(long, global = true)]
    report: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Synchronize the header of one source file
    Sync {
        /// Source file holding the definitions
        source: PathBuf,

        /// Header to rewrite (default: the source's first quoted #include)
        #[arg(long)]
        header: Option<PathBuf>,

        /// Class to synchronize (default: the first class the source defines members of)
        #[arg(long)]
        class: Option<String>,

        /// Report changes without writing
        #[arg(long)]
        dry_run: bool,

        /// Do not keep a backup copy of the header
        #[arg(long)]
        no_backup: bool,
    },
    /// Synchronize the headers of every source file under a directory
    Batch {
        /// Directory to scan
        dir: PathBuf,

        /// Number of planning threads
        #[arg(long)]
        threads: Option<usize>,

        /// Maximum number of source files
        #[arg(long)]
        max_files: Option<usize>,

        /// Report changes without writing
        #[arg(long)]
        dry_run: bool,

        /// Do not keep backup copies of the headers
        #[arg(long)]
        no_backup: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let mut options = SyncOptions::load(cli.config.as_deref())?;

    let report = match cli.command {
        Commands::Sync { source, header, class, dry_run, no_backup } => {
            options.dry_run |= dry_run;
            options.backup &= !no_backup;

            let processor = SyncProcessor::new(options);
            let outcome = processor.sync_file(&source, header.as_deref(), class.as_deref())?;
            for change in &outcome.updated {
                println!("Updated:\n    {}\n --> {}", change.before, change.after);
            }
            for declaration in &outcome.deleted {
                println!("Deleted:\n    {}", declaration);
            }
            for declaration in &outcome.added {
                println!("Added:\n    {}", declaration);
            }

            let mut stats = SyncStats::new();
            stats.record(&outcome);
            SyncReport::new(stats, vec![outcome], Vec::new())
        }
        Commands::Batch { dir, threads, max_files, dry_run, no_backup } => {
            options.dry_run |= dry_run;
            options.backup &= !no_backup;
            options.parallel_threads = threads.or(options.parallel_threads);
            options.max_files = max_files.or(options.max_files);

            let report = SyncProcessor::new(options).sync_directory(&dir)?;
            println!(
                "Processed {} files ({:.1}% succeeded): {} headers written, {} pending, {} already in sync",
                report.stats.total_files,
                report.stats.success_rate(),
                report.stats.written_headers,
                report.stats.pending_headers,
                report.stats.in_sync_headers
            );
            for failure in &report.failures {
                println!("  {}: {}", failure.source.display(), failure.error);
            }
            report
        }
    };

    if let Some(path) = cli.report {
        report.write_json(&path)?;
        info!("Report written to {}", path.display());
    }

    Ok(())
}
