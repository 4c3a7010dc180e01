pub mod types;
pub mod error;
pub mod scanner;
pub mod class_parser;
pub mod function_parser;
mod text;

// Re-export the main API for easier access
pub use types::{ClassRecord, FunctionRecord, Parameter, Position, Span, ExcludePair};
pub use error::{ParseError, ParseResult};
pub use scanner::{ScanCursor, SourceText};
pub use class_parser::parse_classes;
pub use function_parser::{parse_declarations, parse_definitions, parse_functions, split_parameters, ParseMode};

pub(crate) use text::{annotations, has_token, indentation, remove_token, strip_annotations};
