use log::{debug, trace};

use super::error::{ParseError, ParseResult};
use super::scanner::{ScanCursor, SourceText};
use super::text::{find_single_colon, is_identifier, is_identifier_char};
use super::types::{ClassRecord, Position, Span, BLOCK_PAIRS};

const CLASS_KEYWORD: &str = "class";

/// Extract every class body in `text`, in order of appearance.
///
/// Forward declarations (`class Foo;`, `friend class Foo;`), `enum class` and template parameters
/// are skipped. Classes nested inside an extracted body are not reported separately.
pub fn parse_classes(text: &SourceText) -> ParseResult<Vec<ClassRecord>> {
    let mut cursor = ScanCursor::new();
    let mut classes = Vec::new();

    while let Some(position) = text.find(&mut cursor, CLASS_KEYWORD, &[])? {
        let line = text.line(position.line).unwrap_or_default();
        if !is_class_keyword(line, position.column) {
            continue;
        }

        let name = class_name_after(line, position.column + CLASS_KEYWORD.len())
            .ok_or(ParseError::MissingClassName { position })?;

        let (open, token) = text.expect_any(&mut cursor, &[";", "{"], &[])?;
        if token == ";" {
            trace!("Skipping forward declaration of {}", name);
            continue;
        }
        let close = text.expect(&mut cursor, "}", BLOCK_PAIRS)?;

        let mut body_lines: Vec<String> = text.lines()[open.line..=close.line].to_vec();
        body_lines[0] = body_lines[0][open.column..].to_string();

        debug!("Found class {} spanning lines {}..={}", name, open.line + 1, close.line + 1);
        classes.push(ClassRecord {
            name,
            body_span: Span::new(open, Position::new(close.line, close.column + 1)),
            body_lines,
        });
    }

    Ok(classes)
}

fn is_class_keyword(line: &str, column: usize) -> bool {
    let before = &line[..column];
    let after = &line[column + CLASS_KEYWORD.len()..];

    if before.chars().next_back().is_some_and(is_identifier_char) {
        return false;
    }
    if !after.chars().next().is_some_and(char::is_whitespace) {
        return false;
    }

    let before = before.trim_end();
    if before.ends_with('<') || before.ends_with(',') {
        return false;
    }
    before.split_whitespace().last() != Some("enum")
}

/// Name declared after `class`: the last plain identifier before the base clause or body,
/// so export macros and `final` are passed over
fn class_name_after(line: &str, from: usize) -> Option<String> {
    let rest = &line[from..];
    let head = rest.split(|c: char| c == '{' || c == ';').next().unwrap_or_default();
    let head = match find_single_colon(head) {
        Some(colon) => &head[..colon],
        None => head,
    };

    head.split_whitespace()
        .filter(|token| *token != "final" && is_identifier(token))
        .last()
        .map(str::to_string)
}
