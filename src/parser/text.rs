//! Small string helpers shared by the extractors.

use once_cell::sync::Lazy;
use regex::Regex;

static BLOCK_COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());
static LINE_COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"//[^\n]*").unwrap());
static DECLARATOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+([*&]+)").unwrap());
static IDENTIFIER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());
static MACRO_NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z][A-Z0-9]*_[A-Z0-9_]*$").unwrap());
static ANNOTATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[[^\]]*\]\]|\b[A-Z][A-Z0-9]*_[A-Z0-9_]*(?:\s*\([^()]*\))?").unwrap());
static OPERATOR_SYMBOL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(operator\s*)(\(\)|\[\]|[-+*/%^&|~!=<>,]+)").unwrap());

pub fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

pub fn is_identifier(token: &str) -> bool {
    IDENTIFIER_RE.is_match(token)
}

/// Remove `/* ... */` and `// ...` comments
pub fn strip_comments(text: &str) -> String {
    let without_blocks = BLOCK_COMMENT_RE.replace_all(text, " ");
    LINE_COMMENT_RE.replace_all(&without_blocks, "").into_owned()
}

/// Trim and collapse every whitespace run to a single space
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Attach `*` and `&` to the type they modify: `Foo &x` and `Foo & x` both become `Foo& x`
pub fn normalize_declarator(text: &str) -> String {
    collapse_whitespace(&DECLARATOR_RE.replace_all(text, "$1 "))
}

/// Drop the first whitespace-separated token equal to `target`
pub fn remove_token(text: &str, target: &str) -> String {
    let mut tokens: Vec<&str> = text.split_whitespace().collect();
    if let Some(index) = tokens.iter().position(|t| *t == target) {
        tokens.remove(index);
    }
    tokens.join(" ")
}

pub fn has_token(text: &str, target: &str) -> bool {
    text.split_whitespace().any(|t| t == target)
}

/// `SCREAMING_CASE` with at least one underscore, the shape of annotation macros
pub fn is_macro_name(token: &str) -> bool {
    MACRO_NAME_RE.is_match(token)
}

/// Attributes and annotation macros in `text`: `[[nodiscard]]`, `ABSL_LOCKS_EXCLUDED(mu_)`
pub fn annotations(text: &str) -> Vec<&str> {
    ANNOTATION_RE.find_iter(text).map(|m| m.as_str()).collect()
}

/// `text` without its [`annotations`]
pub fn strip_annotations(text: &str) -> String {
    collapse_whitespace(&ANNOTATION_RE.replace_all(text, " "))
}

/// Blank out the symbols of `operator<`, `operator()` and friends so a bracket scan does not
/// treat them as openers. Byte offsets are preserved.
pub fn mask_operator_symbols(line: &str) -> String {
    OPERATOR_SYMBOL_RE
        .replace_all(line, |captures: &regex::Captures<'_>| {
            format!("{}{}", &captures[1], " ".repeat(captures[2].len()))
        })
        .into_owned()
}

/// Byte index of the first `:` that is not part of a `::`
pub fn find_single_colon(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut index = 0;
    while index < bytes.len() {
        if bytes[index] == b':' {
            if bytes.get(index + 1) == Some(&b':') {
                index += 2;
                continue;
            }
            return Some(index);
        }
        index += 1;
    }
    None
}

/// Leading whitespace of a line
pub fn indentation(line: &str) -> &str {
    let content = line.trim_start();
    &line[..line.len() - content.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_both_comment_styles() {
        assert_eq!(
            collapse_whitespace(&strip_comments("int /* count */ a, // trailing\n int b")),
            "int a, int b"
        );
    }

    #[test]
    fn single_colon_ignores_scope_operator() {
        assert_eq!(find_single_colon("Foo::Foo() : a_(1)"), Some(11));
        assert_eq!(find_single_colon("std::string"), None);
    }

    #[test]
    fn declarators_bind_to_the_type() {
        assert_eq!(normalize_declarator("const Foo &foo"), "const Foo& foo");
        assert_eq!(normalize_declarator("Foo * Create"), "Foo* Create");
        assert_eq!(normalize_declarator("char** argv"), "char** argv");
    }

    #[test]
    fn removes_only_whole_tokens() {
        assert_eq!(remove_token("static inline", "static"), "inline");
        assert_eq!(remove_token("static_cast", "static"), "static_cast");
    }

    #[test]
    fn operator_symbols_are_blanked_in_place() {
        let line = "  bool operator<(const A& o) const;\n";
        let masked = mask_operator_symbols(line);
        assert_eq!(masked, "  bool operator (const A& o) const;\n");
        assert_eq!(masked.len(), line.len());
        assert_eq!(mask_operator_symbols("int operator()(int x);"), "int operator  (int x);");
        assert_eq!(mask_operator_symbols("A& operator<<=(int n);"), "A& operator   (int n);");
        assert_eq!(mask_operator_symbols("my_operator<int>(x)"), "my_operator<int>(x)");
    }

    #[test]
    fn annotations_are_found_and_stripped() {
        assert_eq!(annotations("[[nodiscard]] static"), vec!["[[nodiscard]]"]);
        assert_eq!(annotations("const ABSL_LOCKS_EXCLUDED(mu_)"), vec!["ABSL_LOCKS_EXCLUDED(mu_)"]);
        assert_eq!(strip_annotations("const ABSL_LOCKS_EXCLUDED( mu_ ) final"), "const final");
        assert!(is_macro_name("ABSL_GUARDED_BY"));
        assert!(!is_macro_name("Count"));
        assert!(!is_macro_name("HRESULT"));
    }
}
