use anyhow::Result;
use pretty_assertions::assert_eq;
use test_case::test_case;

use cpp_refactor::parser::types::SIGNATURE_PAIRS;
use cpp_refactor::parser::{
    parse_classes, parse_declarations, parse_definitions, split_parameters, Parameter, Position, ScanCursor, SourceText,
};
use cpp_refactor::sync::{assign_identity_keys, pair, render_declaration};

#[test_case("(a, std::pair<int,int> b = {1,2})", 32 ; "template and brace init")]
#[test_case("(int (*fn)(int), char c)", 23 ; "function pointer")]
#[test_case("(/* ) */ int a)", 14 ; "block comment")]
#[test_case("()", 1 ; "empty")]
fn closing_paren_skips_nested_groups(line: &str, column: usize) -> Result<()> {
    let text = SourceText::parse(line);
    let mut cursor = ScanCursor::at(Position::new(0, 1));
    assert_eq!(text.find(&mut cursor, ")", SIGNATURE_PAIRS)?, Some(Position::new(0, column)));
    Ok(())
}

#[test_case("// class Hidden {};\nclass Shown {};\n" ; "line comment")]
#[test_case("/* class Hidden {};\n   still hidden */ class Shown {};\n" ; "multi-line block comment")]
#[test_case("enum class Color { kRed };\nclass Shown {};\n" ; "enum class")]
#[test_case("template <class T> class Shown {};\n" ; "template parameter")]
#[test_case("class Hidden;\nclass Shown {};\n" ; "forward declaration")]
fn only_real_class_bodies_are_extracted(source: &str) -> Result<()> {
    let classes = parse_classes(&SourceText::parse(source))?;
    let names: Vec<&str> = classes.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Shown"]);
    Ok(())
}

#[test_case("(int a, float b)", &[("int a", None), ("float b", None)] ; "plain")]
#[test_case("(int a=2)", &[("int a", Some("2"))] ; "default")]
#[test_case("(int a, int b = Max(1, 2))", &[("int a", None), ("int b", Some("Max(1, 2)"))] ; "call default")]
fn parameter_lists(raw: &str, expected: &[(&str, Option<&str>)]) -> Result<()> {
    let expected: Vec<Parameter> = expected
        .iter()
        .map(|(text, value)| Parameter::new(*text, value.map(str::to_string)))
        .collect();
    assert_eq!(split_parameters(raw)?, expected);
    Ok(())
}

/// Pair a class body against definitions and describe the result
fn pairing(header: &str, source: &str) -> Result<(Vec<String>, Vec<String>, Vec<(String, String)>)> {
    let class = parse_classes(&SourceText::parse(header))?.remove(0);
    let mut declared = parse_declarations(&class)?;
    let mut defined = parse_definitions(&SourceText::parse(source), &class.name)?;
    assign_identity_keys(&mut declared);
    assign_identity_keys(&mut defined);
    let result = pair(&declared, &defined);

    let deleted = result.deleted.iter().map(|&i| render_declaration(&declared[i], None)).collect();
    let added = result.added.iter().map(|&i| render_declaration(&defined[i], None)).collect();
    let changed = result
        .changed
        .iter()
        .map(|(&h, &c)| (render_declaration(&declared[h], None), render_declaration(&defined[c], None)))
        .collect();
    Ok((deleted, added, changed))
}

#[test]
fn single_swap_is_a_change() -> Result<()> {
    let (deleted, added, changed) = pairing("class A {\n  void f(int a);\n};\n", "void A::f(int a, int b) {}\n")?;
    assert!(deleted.is_empty() && added.is_empty());
    assert_eq!(changed, vec![("void f(int a);".to_string(), "void f(int a, int b);".to_string())]);
    Ok(())
}

#[test]
fn overloads_are_added_and_deleted() -> Result<()> {
    let (deleted, added, changed) = pairing(
        "class A {\n  void f();\n  void f(int a);\n};\n",
        "void A::f(int a) {}\nvoid A::f(double d) {}\n",
    )?;
    assert_eq!(deleted, vec!["void f();"]);
    assert_eq!(added, vec!["void f(double d);"]);
    assert!(changed.is_empty());
    Ok(())
}
