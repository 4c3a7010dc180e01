use log::trace;

use super::error::{ParseError, ParseResult};
use super::types::{ExcludePair, Position};

const LINE_COMMENT: &str = "//";
const BLOCK_COMMENT_OPEN: &str = "/*";
const BLOCK_COMMENT_CLOSE: &str = "*/";

/// Immutable line-oriented text. Each line keeps its terminator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceText {
    lines: Vec<String>,
}

/// Where the next [`SourceText::find`] resumes.
///
/// Owned by a single scan and only moved forward, except through [`ScanCursor::set_start_position`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanCursor {
    next_line: usize,
    next_column: usize,
    comment_start: Option<usize>,
}

impl ScanCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cursor resuming at `position`
    pub fn at(position: Position) -> Self {
        let mut cursor = Self::new();
        cursor.set_start_position(position.line, position.column);
        cursor
    }

    pub fn set_start_position(&mut self, line: usize, column: usize) {
        self.next_line = line;
        self.next_column = column;
    }

    /// Position the next search starts from
    pub fn position(&self) -> Position {
        Position::new(self.next_line, self.next_column)
    }

    /// First line of the comment run that preceded the last match, if any
    pub fn comment_start(&self) -> Option<usize> {
        self.comment_start
    }
}

impl SourceText {
    pub fn from_lines(lines: Vec<String>) -> Self {
        Self { lines }
    }

    /// Split `content` into lines, keeping terminators
    pub fn parse(content: &str) -> Self {
        Self::from_lines(content.split_inclusive('\n').map(str::to_string).collect())
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }

    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Text between `start` (inclusive) and `end` (exclusive), across lines
    pub fn slice(&self, start: Position, end: Position) -> String {
        if start >= end {
            return String::new();
        }
        let mut out = String::new();
        for index in start.line..=end.line.min(self.lines.len().saturating_sub(1)) {
            let line = &self.lines[index];
            let from = if index == start.line { start.column } else { 0 };
            let to = if index == end.line { end.column } else { line.len() };
            out.push_str(line.get(from.min(line.len())..to.min(line.len())).unwrap_or(""));
        }
        out
    }

    /// Find the first of `target` outside comments and outside any open `exclude_pairs` nesting
    pub fn find(
        &self,
        cursor: &mut ScanCursor,
        target: &str,
        exclude_pairs: &[ExcludePair],
    ) -> ParseResult<Option<Position>> {
        Ok(self.find_any(cursor, &[target], exclude_pairs)?.map(|(position, _)| position))
    }

    /// Like [`find`](Self::find), but fails with [`ParseError::Unterminated`] when nothing matches
    pub fn expect(
        &self,
        cursor: &mut ScanCursor,
        target: &str,
        exclude_pairs: &[ExcludePair],
    ) -> ParseResult<Position> {
        Ok(self.expect_any(cursor, &[target], exclude_pairs)?.0)
    }

    pub fn expect_any<'t>(
        &self,
        cursor: &mut ScanCursor,
        targets: &[&'t str],
        exclude_pairs: &[ExcludePair],
    ) -> ParseResult<(Position, &'t str)> {
        let after = cursor.position();
        self.find_any(cursor, targets, exclude_pairs)?
            .ok_or_else(|| ParseError::Unterminated {
                expected: targets.iter().map(|t| format!("`{t}`")).collect::<Vec<_>>().join(" or "),
                after,
            })
    }

    /// Find the first of several targets; returns where it starts and which one matched.
    ///
    /// Targets are compared before bracket and comment tokens at each column, so a target that
    /// is also a close token is accepted at depth zero instead of being popped. A close token
    /// seen with nothing open belongs to an enclosing scope and is ignored.
    pub fn find_any<'t>(
        &self,
        cursor: &mut ScanCursor,
        targets: &[&'t str],
        exclude_pairs: &[ExcludePair],
    ) -> ParseResult<Option<(Position, &'t str)>> {
        let mut depth: Vec<&ExcludePair> = Vec::new();
        let mut in_block_comment = false;
        let mut comment_start: Option<usize> = None;

        for line_index in cursor.next_line..self.lines.len() {
            let line = &self.lines[line_index];
            let trimmed = line.trim();

            if !in_block_comment && trimmed.starts_with(LINE_COMMENT) {
                comment_start.get_or_insert(line_index);
                continue;
            }
            if trimmed.is_empty() {
                comment_start = None;
            }

            let bytes = line.as_bytes();
            let mut column = if line_index == cursor.next_line { cursor.next_column } else { 0 };

            while column < bytes.len() {
                let rest = &bytes[column..];

                if in_block_comment {
                    if rest.starts_with(BLOCK_COMMENT_CLOSE.as_bytes()) {
                        in_block_comment = false;
                        column += BLOCK_COMMENT_CLOSE.len();
                    } else {
                        column += 1;
                    }
                    continue;
                }

                if depth.is_empty() {
                    let hit = targets
                        .iter()
                        .find(|target| !target.is_empty() && rest.starts_with(target.as_bytes()));
                    if let Some(target) = hit {
                        let position = Position::new(line_index, column);
                        cursor.next_line = line_index;
                        cursor.next_column = column + target.len();
                        cursor.comment_start = comment_start;
                        trace!("found `{}` at {}", target, position);
                        return Ok(Some((position, *target)));
                    }
                }

                if rest.starts_with(LINE_COMMENT.as_bytes()) {
                    break;
                }
                if rest.starts_with(BLOCK_COMMENT_OPEN.as_bytes()) {
                    in_block_comment = true;
                    comment_start.get_or_insert(line_index);
                    column += BLOCK_COMMENT_OPEN.len();
                    continue;
                }

                for pair in exclude_pairs {
                    if rest.starts_with(pair.open.as_bytes()) {
                        depth.push(pair);
                        break;
                    }
                    if rest.starts_with(pair.close.as_bytes()) {
                        match depth.last() {
                            Some(open) if open.close == pair.close => {
                                depth.pop();
                            }
                            Some(open) => {
                                return Err(ParseError::MismatchedBracket {
                                    found: pair.close,
                                    open: open.open,
                                    position: Position::new(line_index, column),
                                });
                            }
                            None => {}
                        }
                        break;
                    }
                }
                column += 1;
            }
        }

        Ok(None)
    }
}

impl From<Vec<String>> for SourceText {
    fn from(lines: Vec<String>) -> Self {
        Self::from_lines(lines)
    }
}
