use std::fmt;
use serde::{Serialize, Deserialize};

/// A zero-based `(line, column)` location in a [`SourceText`](super::SourceText).
///
/// `column` is a byte offset within the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    /// Line index
    pub line: usize,

    /// Byte offset within the line
    pub column: usize,
}

impl Position {
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.column + 1)
    }
}

/// An end-exclusive range between two positions, possibly spanning several lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Inclusive line range covered by this span
    pub fn lines(&self) -> std::ops::RangeInclusive<usize> {
        self.start.line..=self.end.line
    }
}

/// An `(open, close)` token pair that must be balanced before a target match is honored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExcludePair {
    pub open: &'static str,
    pub close: &'static str,
}

impl ExcludePair {
    pub const fn new(open: &'static str, close: &'static str) -> Self {
        Self { open, close }
    }
}

pub const BRACE: ExcludePair = ExcludePair::new("{", "}");
pub const PAREN: ExcludePair = ExcludePair::new("(", ")");
pub const ANGLE: ExcludePair = ExcludePair::new("<", ">");

/// Nesting tracked while reading signatures: parameter lists, template arguments, brace-init defaults
pub const SIGNATURE_PAIRS: &[ExcludePair] = &[BRACE, PAREN, ANGLE];

/// Nesting tracked while skipping to the end of a block. `<` and `>` are left out because inside
/// bodies they are comparison and member-access operators, not brackets.
pub const BLOCK_PAIRS: &[ExcludePair] = &[BRACE, PAREN];

/// Nesting tracked while looking for the next parameter-list opener
pub const OPENER_PAIRS: &[ExcludePair] = &[BRACE, ANGLE];

/// A single function parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// Everything before a top-level `=`, trimmed with whitespace collapsed
    pub type_and_name: String,

    /// Text after a top-level `=`, if any
    pub default_value: Option<String>,
}

impl Parameter {
    pub fn new(type_and_name: impl Into<String>, default_value: Option<String>) -> Self {
        Self {
            type_and_name: type_and_name.into(),
            default_value,
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.default_value {
            Some(value) => write!(f, "{} = {}", self.type_and_name, value),
            None => f.write_str(&self.type_and_name),
        }
    }
}

/// A member function found either as a header declaration or as an out-of-line definition
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FunctionRecord {
    /// From the first token of the signature through its terminating `;` or `}`, end exclusive
    pub range: Span,

    /// Function name; destructors keep their leading `~`
    pub name: String,

    /// Return type text, empty for constructors and destructors
    pub return_type: String,

    /// Leading modifiers such as `static` or `inline`
    pub prefix: String,

    /// Trailing modifiers such as `const`
    pub suffix: String,

    /// Parameters in source order
    pub parameters: Vec<Parameter>,

    /// Whether a leading `virtual` was stripped from the prefix
    pub is_virtual: bool,

    /// Whether a trailing `override` was stripped from the suffix
    pub is_override: bool,

    /// Normalized signature fingerprint, assigned once both sides are parsed
    pub identity_key: Option<String>,

    /// Index of the definition this declaration should be rewritten to
    #[serde(skip)]
    pub change_to: Option<usize>,

    /// Whether this declaration has no definition left and should be removed
    #[serde(skip)]
    pub marked_deleted: bool,
}

/// A class found in a header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassRecord {
    /// Name of the class
    pub name: String,

    /// From the opening `{` through the matching `}`
    pub body_span: Span,

    /// Body lines, the first one starting at the opening brace
    pub body_lines: Vec<String>,
}

impl ClassRecord {
    /// Line index in the enclosing file where `body_lines[0]` sits
    pub fn line_offset(&self) -> usize {
        self.body_span.start.line
    }
}
