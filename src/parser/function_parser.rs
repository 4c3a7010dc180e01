use log::{debug, trace};

use super::error::ParseResult;
use super::scanner::{ScanCursor, SourceText};
use super::text::{
    collapse_whitespace, find_single_colon, is_identifier, is_identifier_char, is_macro_name, mask_operator_symbols,
    normalize_declarator, strip_comments,
};
use super::types::{
    ClassRecord, FunctionRecord, Parameter, Position, Span, BLOCK_PAIRS, OPENER_PAIRS, SIGNATURE_PAIRS,
};

const ACCESS_LABELS: &[&str] = &["public", "protected", "private"];

/// Lead tokens of entries in a class body that are not member functions
const NON_MEMBER_KEYWORDS: &[&str] = &["friend", "typedef", "using"];

const BUILTIN_TYPES: &[&str] = &[
    "void", "bool", "char", "short", "int", "long", "float", "double", "unsigned", "signed", "auto",
];

/// Declaration suffixes that never have an out-of-line definition
const NO_DEFINITION_SUFFIXES: &[&str] = &["=0", "=default", "=delete"];

/// What kind of text [`parse_functions`] is reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode<'a> {
    /// A class body; only pure declarations are kept
    Declarations { class_name: &'a str },

    /// A source file slice; only `ClassName::member` definitions are kept
    Definitions { class_name: &'a str },
}

impl<'a> ParseMode<'a> {
    pub fn class_name(&self) -> &'a str {
        match *self {
            ParseMode::Declarations { class_name } | ParseMode::Definitions { class_name } => class_name,
        }
    }

    /// Class whose qualifier definitions must carry, `None` when reading declarations
    pub fn owner(&self) -> Option<&'a str> {
        match *self {
            ParseMode::Definitions { class_name } => Some(class_name),
            ParseMode::Declarations { .. } => None,
        }
    }
}

/// Member function declarations of a parsed class, ranges relative to `class.body_lines`
pub fn parse_declarations(class: &ClassRecord) -> ParseResult<Vec<FunctionRecord>> {
    let body = SourceText::from_lines(class.body_lines.clone());
    parse_functions(&body, ParseMode::Declarations { class_name: &class.name })
}

/// Out-of-line `class_name::` definitions in `text`
pub fn parse_definitions(text: &SourceText, class_name: &str) -> ParseResult<Vec<FunctionRecord>> {
    parse_functions(text, ParseMode::Definitions { class_name })
}

/// Extract function records in source order.
///
/// Every entry is consumed through its terminator before it is kept or dropped, so the scan
/// never resumes inside a body or parameter list.
pub fn parse_functions(text: &SourceText, mode: ParseMode<'_>) -> ParseResult<Vec<FunctionRecord>> {
    let scan = SourceText::from_lines(text.lines().iter().map(|line| mask_operator_symbols(line)).collect());
    let records = FunctionParser { mode }.run(text, &scan)?;
    match mode.owner() {
        Some(owner) => debug!("Parsed {} definitions of {}", records.len(), owner),
        None => debug!("Parsed {} declarations of {}", records.len(), mode.class_name()),
    }
    Ok(records)
}

/// Split a parameter list at top-level commas and each parameter at its top-level `=`.
///
/// Accepts the list with or without its surrounding parentheses.
pub fn split_parameters(raw: &str) -> ParseResult<Vec<Parameter>> {
    let inner = strip_comments(raw);
    let inner = inner.trim();
    let inner = match inner.strip_prefix('(') {
        Some(list) => list.strip_suffix(')').unwrap_or(list),
        None => inner,
    };
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }

    let text = SourceText::parse(inner);
    let mut cursor = ScanCursor::new();
    let mut start = Position::default();
    let mut parameters = Vec::new();

    while let Some(comma) = text.find(&mut cursor, ",", SIGNATURE_PAIRS)? {
        parameters.push(split_default(&text.slice(start, comma))?);
        start = cursor.position();
    }
    parameters.push(split_default(&text.slice(start, end_of(&text)))?);

    Ok(parameters)
}

fn split_default(piece: &str) -> ParseResult<Parameter> {
    let text = SourceText::parse(piece);
    let mut cursor = ScanCursor::new();

    let parameter = match text.find(&mut cursor, "=", SIGNATURE_PAIRS)? {
        Some(equals) => Parameter::new(
            normalize_declarator(&collapse_whitespace(&text.slice(Position::default(), equals))),
            Some(collapse_whitespace(&text.slice(cursor.position(), end_of(&text)))),
        ),
        None => Parameter::new(normalize_declarator(&collapse_whitespace(piece)), None),
    };
    Ok(parameter)
}

fn end_of(text: &SourceText) -> Position {
    match text.lines().last() {
        Some(line) => Position::new(text.len() - 1, line.len()),
        None => Position::default(),
    }
}

struct FunctionParser<'a> {
    mode: ParseMode<'a>,
}

/// Name and the tokens in front of it
#[derive(Debug)]
struct Head {
    prefix: Vec<String>,
    return_type: String,
    name: String,
    structor: bool,
}

impl Head {
    /// A lone unqualified identifier before `(` that is not a constructor
    fn is_macro_call(&self) -> bool {
        self.prefix.is_empty() && self.return_type.is_empty() && !self.structor && !self.name.contains("::")
    }

    /// `int x_ = Compute(...)` style data member
    fn is_initializer(&self) -> bool {
        self.prefix.iter().chain(std::iter::once(&self.return_type)).any(|t| t.contains('='))
    }

    /// `friend`, `typedef` and `using` entries
    fn is_non_member(&self) -> bool {
        self.prefix
            .iter()
            .chain([&self.return_type, &self.name])
            .any(|t| NON_MEMBER_KEYWORDS.contains(&t.as_str()))
    }

    /// `int count_ GUARDED_BY(mu_)`: the "name" is an annotation macro after a data member
    fn is_annotated_data_member(&self) -> bool {
        !self.structor
            && !self.prefix.is_empty()
            && is_macro_name(&self.name)
            && is_identifier(&self.return_type)
            && !BUILTIN_TYPES.contains(&self.return_type.as_str())
    }
}

impl FunctionParser<'_> {
    /// `scan` is `text` with operator symbols masked; brackets are matched on `scan`, text is
    /// read from `text`
    fn run(&self, text: &SourceText, scan: &SourceText) -> ParseResult<Vec<FunctionRecord>> {
        let mut cursor = ScanCursor::new();
        if self.owner().is_none() && text.line(0).is_some_and(|l| l.starts_with('{')) {
            cursor.set_start_position(0, 1);
        }

        let mut records = Vec::new();
        let mut consumed = cursor.position();

        while let Some(open) = scan.find(&mut cursor, "(", OPENER_PAIRS)? {
            let (start, lead) = self.lead_text(text, consumed, open);
            let close = scan.expect(&mut cursor, ")", SIGNATURE_PAIRS)?;
            let raw_parameters = text.slice(open, Position::new(close.line, close.column + 1));

            let head = match self.split_head(&lead) {
                Some(head) if !head.is_macro_call() => head,
                _ => {
                    trace!("Skipping call-like `{}(` at line {}", lead, open.line + 1);
                    consumed = cursor.position();
                    continue;
                }
            };

            let after_close = cursor.position();
            let (terminator, has_body) = loop {
                let (position, token) = scan.expect_any(&mut cursor, &[";", "{"], SIGNATURE_PAIRS)?;
                if token == ";" {
                    break (position, false);
                }
                if opens_member_initializer(&text.slice(after_close, position)) {
                    scan.expect(&mut cursor, "}", BLOCK_PAIRS)?;
                    continue;
                }
                break (position, true);
            };
            let suffix = text.slice(after_close, terminator);
            let end = if has_body {
                scan.expect(&mut cursor, "}", BLOCK_PAIRS)?
            } else {
                terminator
            };
            consumed = cursor.position();

            let range = Span::new(start, Position::new(end.line, end.column + 1));
            if let Some(record) = self.build(head, &raw_parameters, &suffix, has_body, range)? {
                trace!("Function {} at lines {}..={}", record.name, range.start.line + 1, range.end.line + 1);
                records.push(record);
            }
        }

        Ok(records)
    }

    fn owner(&self) -> Option<&str> {
        self.mode.owner()
    }

    fn qualifier(&self) -> String {
        format!("{}::", self.mode.class_name())
    }

    fn is_structor(&self, name: &str) -> bool {
        let qualifier = self.qualifier();
        let member = match self.owner() {
            Some(_) => name.strip_prefix(qualifier.as_str()).unwrap_or(name),
            None => name,
        };
        let class_name = self.mode.class_name();
        member == class_name || member.strip_prefix('~') == Some(class_name)
    }

    /// Text in front of `open`: the rest of its line after the last consumed entry, plus the
    /// preceding line when the return type was wrapped onto it. Also returns where it starts.
    fn lead_text(&self, text: &SourceText, consumed: Position, open: Position) -> (Position, String) {
        let line = text.line(open.line).unwrap_or_default();
        let from = if consumed.line == open.line { consumed.column.min(open.column) } else { 0 };
        let segment = &line[from..open.column];
        let lead = clean_lead(segment);
        let start = Position::new(open.line, from + lead_offset(segment));

        let single = lead.split_whitespace().count() == 1;
        if !single || self.is_structor(&lead) || open.line == 0 || open.line <= consumed.line {
            return (start, lead);
        }

        let previous_line = open.line - 1;
        let previous = text.line(previous_line).unwrap_or_default();
        let from = if previous_line == consumed.line { consumed.column.min(previous.len()) } else { 0 };
        let previous_start = Position::new(previous_line, from + lead_offset(&previous[from..]));
        let previous = strip_comments(&previous[from..]);
        let previous = previous.trim();
        if previous.is_empty()
            || previous.starts_with('#')
            || previous.ends_with(|c: char| ";{}:,".contains(c))
        {
            return (start, lead);
        }

        (previous_start, clean_lead(&format!("{previous} {lead}")))
    }

    fn split_head(&self, lead: &str) -> Option<Head> {
        let mut tokens: Vec<&str> = lead.split_whitespace().collect();
        let mut name = tokens.pop()?.to_string();
        if let Some(&last) = tokens.last() {
            if last.ends_with("operator") {
                tokens.pop();
                name = if name.starts_with(is_identifier_char) {
                    format!("{last} {name}")
                } else {
                    format!("{last}{name}")
                };
            }
        }

        let structor = self.is_structor(&name);
        let return_type = if structor {
            String::new()
        } else {
            tokens.pop().map(str::to_string).unwrap_or_default()
        };

        Some(Head {
            prefix: tokens.iter().map(|t| t.to_string()).collect(),
            return_type,
            name,
            structor,
        })
    }

    fn build(
        &self,
        head: Head,
        raw_parameters: &str,
        suffix: &str,
        has_body: bool,
        range: Span,
    ) -> ParseResult<Option<FunctionRecord>> {
        let suffix = collapse_whitespace(&strip_comments(suffix));

        let record = match self.owner() {
            None => {
                if has_body {
                    trace!("Skipping inline definition of {}", head.name);
                    return Ok(None);
                }
                if head.is_initializer() {
                    return Ok(None);
                }
                if head.is_non_member() || head.is_annotated_data_member() {
                    trace!("Skipping non-member `{}`", head.name);
                    return Ok(None);
                }
                let compact = suffix.replace(' ', "");
                if NO_DEFINITION_SUFFIXES.iter().any(|s| compact.ends_with(s)) {
                    trace!("Skipping {} declared `{}`", head.name, suffix);
                    return Ok(None);
                }

                let mut prefix = head.prefix;
                let is_virtual = prefix.first().is_some_and(|t| t == "virtual");
                if is_virtual {
                    prefix.remove(0);
                }

                let mut suffix_tokens: Vec<&str> = suffix.split_whitespace().collect();
                let is_override = suffix_tokens.last() == Some(&"override");
                if is_override {
                    suffix_tokens.pop();
                }

                FunctionRecord {
                    range,
                    name: head.name,
                    return_type: head.return_type,
                    prefix: prefix.join(" "),
                    suffix: suffix_tokens.join(" "),
                    parameters: split_parameters(raw_parameters)?,
                    is_virtual,
                    is_override,
                    ..FunctionRecord::default()
                }
            }
            Some(class_name) => {
                if !has_body {
                    return Ok(None);
                }
                let qualifier = self.qualifier();
                let member = match head.name.strip_prefix(qualifier.as_str()) {
                    Some(member) if !member.contains("::") => member.to_string(),
                    _ => {
                        trace!("Skipping {} outside {}", head.name, class_name);
                        return Ok(None);
                    }
                };

                let suffix = match find_single_colon(&suffix) {
                    Some(colon) => suffix[..colon].trim().to_string(),
                    None => suffix,
                };
                let parameters = split_parameters(raw_parameters)?
                    .into_iter()
                    .map(|p| Parameter::new(strip_qualifier(&p.type_and_name, class_name), p.default_value))
                    .collect();

                FunctionRecord {
                    range,
                    name: member,
                    return_type: strip_qualifier(&head.return_type, class_name),
                    prefix: strip_qualifier(&head.prefix.join(" "), class_name),
                    suffix,
                    parameters,
                    ..FunctionRecord::default()
                }
            }
        };

        Ok(Some(record))
    }
}

/// Comment-free, whitespace-collapsed text after the last statement boundary or access label
fn clean_lead(raw: &str) -> String {
    let stripped = strip_comments(raw);
    let mut lead = match stripped.rfind(|c: char| c == ';' || c == '{' || c == '}') {
        Some(index) => &stripped[index + 1..],
        None => stripped.as_str(),
    };
    if let Some(colon) = find_single_colon(lead) {
        if ACCESS_LABELS.contains(&lead[..colon].trim()) {
            lead = &lead[colon + 1..];
        }
    }
    normalize_declarator(&collapse_whitespace(lead))
}

/// Byte offset in `segment` where [`clean_lead`]'s text begins
fn lead_offset(segment: &str) -> usize {
    let mut start = segment.rfind(|c: char| c == ';' || c == '{' || c == '}').map_or(0, |index| index + 1);
    if let Some(index) = segment[start..].rfind("*/") {
        start += index + 2;
    }
    if let Some(colon) = find_single_colon(&segment[start..]) {
        if ACCESS_LABELS.contains(&segment[start..start + colon].trim()) {
            start += colon + 1;
        }
    }
    let rest = &segment[start..];
    start + rest.len() - rest.trim_start().len()
}

/// Whether a `{` right after `between` belongs to a constructor's member initializer such as
/// `: count_{0}` rather than opening the body
fn opens_member_initializer(between: &str) -> bool {
    let text = collapse_whitespace(&strip_comments(between));
    find_single_colon(&text).is_some() && text.ends_with(|c: char| is_identifier_char(c) || c == '>')
}

/// Remove `class_name::` wherever it starts a name
fn strip_qualifier(text: &str, class_name: &str) -> String {
    let qualifier = format!("{class_name}::");
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(index) = rest.find(qualifier.as_str()) {
        out.push_str(&rest[..index]);
        if out.chars().next_back().is_some_and(is_identifier_char) {
            out.push_str(&qualifier);
        }
        rest = &rest[index + qualifier.len()..];
    }
    out.push_str(rest);
    out
}
