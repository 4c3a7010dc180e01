pub mod parser;
pub mod sync;
pub mod utils;

// Re-export main types and functions for easier access
pub use parser::{ClassRecord, FunctionRecord, Parameter, ParseError, ParseResult, ScanCursor, SourceText};
pub use sync::{SyncOptions, SyncOutcome, SyncProcessor, SyncReport, SyncStats};

// Re-export utility functions
pub use utils::file_utils;
