pub mod differ;
pub mod renderer;
pub mod writer;
pub mod types;
pub mod stats;
pub mod processor;
mod file_collector;
mod progress;

// Re-export the main API for easier access
pub use differ::{assign_identity_keys, identity_key, name_slots, pair, NameSlot, PairingResult};
pub use renderer::render_declaration;
pub use writer::{find_public_label, rewrite_header, DeclarationChange, RewrittenHeader};
pub use types::{SyncFailure, SyncOptions, SyncOutcome, SyncReport, DEFAULT_CONFIG_FILE};
pub use stats::SyncStats;
pub use processor::{find_include, SyncPlan, SyncProcessor};
pub use file_collector::FileCollector;
pub use progress::ProgressTracker;
