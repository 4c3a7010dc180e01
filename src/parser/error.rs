use thiserror::Error;

use super::types::Position;

/// Structural problems that stop a scan
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("no identifier follows `class` at {position}")]
    MissingClassName { position: Position },

    #[error("expected {expected} after {after}, reached end of input")]
    Unterminated { expected: String, after: Position },

    #[error("`{found}` at {position} closes `{open}`")]
    MismatchedBracket {
        found: &'static str,
        open: &'static str,
        position: Position,
    },
}

pub type ParseResult<T> = std::result::Result<T, ParseError>;
