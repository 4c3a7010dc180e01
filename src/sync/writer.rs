use log::info;
use serde::Serialize;

use crate::parser::types::BLOCK_PAIRS;
use crate::parser::{indentation, ClassRecord, FunctionRecord, ParseResult, Position, ScanCursor, SourceText};

use super::differ::PairingResult;
use super::renderer::render_declaration;

const PUBLIC_LABEL: &str = "public:";
const DEFAULT_INDENT: &str = "  ";

/// One rewritten declaration, before and after
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeclarationChange {
    pub before: String,
    pub after: String,
}

/// Header text after splicing, plus previews of what moved
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewrittenHeader {
    pub lines: Vec<String>,
    pub updated: Vec<DeclarationChange>,
    pub deleted: Vec<String>,
    pub added: Vec<String>,
}

/// Body-relative position of the class's own `public:` label; labels of nested types are skipped
pub fn find_public_label(class: &ClassRecord) -> ParseResult<Option<Position>> {
    let body = SourceText::from_lines(class.body_lines.clone());
    let mut cursor = ScanCursor::at(Position::new(0, 1));
    body.find(&mut cursor, PUBLIC_LABEL, BLOCK_PAIRS)
}

/// A byte-range replacement in the joined header text
#[derive(Debug)]
struct Edit {
    start: usize,
    end: usize,
    text: String,
}

impl Edit {
    fn is_insertion(&self) -> bool {
        self.start == self.end
    }
}

/// Byte offsets of every line start in the joined header text
struct LineIndex<'a> {
    lines: &'a [String],
    starts: Vec<usize>,
    class: &'a ClassRecord,
}

impl<'a> LineIndex<'a> {
    fn new(lines: &'a [String], class: &'a ClassRecord) -> Self {
        let mut starts = Vec::with_capacity(lines.len() + 1);
        let mut total = 0;
        for line in lines {
            starts.push(total);
            total += line.len();
        }
        starts.push(total);
        Self { lines, starts, class }
    }

    /// File position of a body-relative position
    fn absolute(&self, position: Position) -> Position {
        let column = match position.line {
            0 => position.column + self.class.body_span.start.column,
            _ => position.column,
        };
        Position::new(position.line + self.class.line_offset(), column)
    }

    fn offset(&self, position: Position) -> usize {
        self.starts[position.line] + position.column
    }

    fn line_start(&self, line: usize) -> usize {
        self.starts[line]
    }

    fn line_end(&self, line: usize) -> usize {
        self.starts[line + 1]
    }

    fn before(&self, position: Position) -> &str {
        &self.lines[position.line][..position.column]
    }

    fn after(&self, position: Position) -> &str {
        &self.lines[position.line][position.column..]
    }
}

/// Nothing but whitespace and an optional `//` comment
fn is_blank_or_comment(text: &str) -> bool {
    let text = text.trim();
    text.is_empty() || text.starts_with("//")
}

/// Splice the pairing into `header_lines`.
///
/// `header_functions` must be annotated (see [`PairingResult::annotate`]) and ordered as parsed.
/// Edits cover only the columns of each declaration, so text sharing its lines survives.
/// Changed declarations are replaced in place and deleted ones dropped, along with their lines
/// when nothing else is on them. Additions go after the `public:` label, or after the opening
/// brace when the class has none.
pub fn rewrite_header(
    header_lines: &[String],
    class: &ClassRecord,
    header_functions: &[FunctionRecord],
    cc_functions: &[FunctionRecord],
    pairing: &PairingResult,
) -> ParseResult<RewrittenHeader> {
    let index = LineIndex::new(header_lines, class);
    let added: Vec<String> = pairing.added.iter().map(|&i| render_declaration(&cc_functions[i], None)).collect();
    let mut rewritten = RewrittenHeader { added: added.clone(), ..RewrittenHeader::default() };
    let mut edits = Vec::new();

    for function in header_functions {
        let start = index.absolute(function.range.start);
        let end = index.absolute(function.range.end);
        if let Some(cc_index) = function.change_to {
            let after = render_declaration(function, Some(&cc_functions[cc_index]));
            let before = render_declaration(function, None);
            info!("Updated:\n    {}\n --> {}", before, after);
            edits.push(Edit { start: index.offset(start), end: index.offset(end), text: after.clone() });
            rewritten.updated.push(DeclarationChange { before, after });
        } else if function.marked_deleted {
            let before = render_declaration(function, None);
            info!("Deleted:\n    {}", before);
            let alone = index.before(start).trim().is_empty() && is_blank_or_comment(index.after(end));
            let edit = if alone {
                Edit { start: index.line_start(start.line), end: index.line_end(end.line), text: String::new() }
            } else {
                let trailing = index.after(end);
                let spaces = trailing.len() - trailing.trim_start_matches([' ', '\t']).len();
                Edit { start: index.offset(start), end: index.offset(end) + spaces, text: String::new() }
            };
            edits.push(edit);
            rewritten.deleted.push(before);
        }
    }

    if !added.is_empty() {
        for declaration in &added {
            info!("Added:\n    {}", declaration);
        }
        edits.push(insertion(&index, class, header_functions, &added)?);
    }

    // Back to front; at equal offsets an insertion goes last so it lands before the edited text
    edits.sort_by_key(|edit| (std::cmp::Reverse(edit.start), edit.is_insertion()));
    let mut text = header_lines.concat();
    for edit in edits {
        text.replace_range(edit.start..edit.end, &edit.text);
    }
    rewritten.lines = SourceText::parse(&text).into_lines();

    Ok(rewritten)
}

/// Additions as new lines under the anchor, or inline when the anchor line goes on
fn insertion(
    index: &LineIndex<'_>,
    class: &ClassRecord,
    header_functions: &[FunctionRecord],
    added: &[String],
) -> ParseResult<Edit> {
    let anchor = match find_public_label(class)? {
        Some(label) => Position::new(label.line, label.column + PUBLIC_LABEL.len()),
        None => Position::new(0, 1),
    };
    let anchor = index.absolute(anchor);

    if !is_blank_or_comment(index.after(anchor)) {
        let text = added.iter().map(|declaration| format!(" {declaration}")).collect();
        return Ok(Edit { start: index.offset(anchor), end: index.offset(anchor), text });
    }

    let indent = header_functions
        .first()
        .and_then(|f| index.lines.get(index.absolute(f.range.start).line))
        .map(|line| indentation(line).to_string())
        .unwrap_or_else(|| DEFAULT_INDENT.to_string());
    let text = added.iter().map(|declaration| format!("{indent}{declaration}\n")).collect();
    let at = index.line_end(anchor.line);
    Ok(Edit { start: at, end: at, text })
}
