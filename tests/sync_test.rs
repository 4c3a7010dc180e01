use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use pretty_assertions::assert_eq;
use tempfile::{tempdir, TempDir};

use cpp_refactor::sync::{SyncOptions, SyncProcessor};

const WIDGET_HEADER: &str = "\
#ifndef WIDGETS_WIDGET_H_
#define WIDGETS_WIDGET_H_

#include <string>

namespace widgets {

class Widget : public Base {
 public:
  explicit Widget(int size);
  virtual ~Widget();

  // Draws the widget.
  virtual void Draw(Canvas* canvas) const;
  std::string Name() const;

 private:
  int size_;
};

}  // namespace widgets

#endif  // WIDGETS_WIDGET_H_
";

const WIDGET_SOURCE: &str = "\
#include \"widgets/widget.h\"

#include <utility>

namespace widgets {

Widget::Widget(int size) : Base(), size_(size) {}

Widget::~Widget() {}

void Widget::Draw(Canvas* canvas, int layer) const {
  canvas->Fill(size_);
}

std::string Widget::Name() const { return \"widget\"; }

int Widget::Area() const { return size_ * size_; }

}  // namespace widgets
";

const WIDGET_SYNCED: &str = "\
#ifndef WIDGETS_WIDGET_H_
#define WIDGETS_WIDGET_H_

#include <string>

namespace widgets {

class Widget : public Base {
 public:
  int Area() const;
  explicit Widget(int size);
  virtual ~Widget();

  // Draws the widget.
  virtual void Draw(Canvas* canvas, int layer) const;
  std::string Name() const;

 private:
  int size_;
};

}  // namespace widgets

#endif  // WIDGETS_WIDGET_H_
";

/// Lay out `files` under a fresh `google3` root
fn google3_tree(files: &[(&str, &str)]) -> Result<(TempDir, PathBuf)> {
    let dir = tempdir()?;
    let root = dir.path().join("google3");
    for (relative, content) in files {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap_or(&root))?;
        fs::write(&path, content)?;
    }
    Ok((dir, root))
}

fn quiet_processor(options: SyncOptions) -> SyncProcessor {
    SyncProcessor::new(options).without_progress()
}

#[test]
fn syncs_header_found_through_google3_root() -> Result<()> {
    let (_dir, root) = google3_tree(&[
        ("widgets/widget.h", WIDGET_HEADER),
        ("widgets/widget.cc", WIDGET_SOURCE),
    ])?;
    let header = root.join("widgets/widget.h");

    let outcome = quiet_processor(SyncOptions::default()).sync_file(&root.join("widgets/widget.cc"), None, None)?;

    assert!(outcome.written);
    assert_eq!(outcome.class_name, "Widget");
    assert_eq!(outcome.added, vec!["int Area() const;"]);
    assert_eq!(outcome.deleted, Vec::<String>::new());
    assert_eq!(outcome.updated.len(), 1);
    assert_eq!(outcome.updated[0].before, "virtual void Draw(Canvas* canvas) const;");
    assert_eq!(outcome.updated[0].after, "virtual void Draw(Canvas* canvas, int layer) const;");
    assert_eq!(outcome.unchanged, 3);

    assert_eq!(fs::read_to_string(&header)?, WIDGET_SYNCED);
    assert_eq!(fs::read_to_string(root.join("widgets/widget.h.before_cpp_refactor.h"))?, WIDGET_HEADER);
    assert!(!root.join("widgets/widget.h.modified_by_cpp_refactor.h").exists());
    Ok(())
}

#[test]
fn second_run_is_a_no_op() -> Result<()> {
    let (_dir, root) = google3_tree(&[
        ("widgets/widget.h", WIDGET_HEADER),
        ("widgets/widget.cc", WIDGET_SOURCE),
    ])?;
    let source = root.join("widgets/widget.cc");
    let options = SyncOptions { backup: false, ..SyncOptions::default() };
    let processor = quiet_processor(options);

    processor.sync_file(&source, None, None)?;
    let again = processor.sync_file(&source, None, None)?;

    assert!(!again.written);
    assert!(!again.has_changes());
    assert!(again.added.is_empty() && again.deleted.is_empty() && again.updated.is_empty());
    assert_eq!(fs::read_to_string(root.join("widgets/widget.h"))?, WIDGET_SYNCED);
    assert!(!root.join("widgets/widget.h.before_cpp_refactor.h").exists());
    Ok(())
}

#[test]
fn dry_run_writes_nothing() -> Result<()> {
    let (_dir, root) = google3_tree(&[
        ("widgets/widget.h", WIDGET_HEADER),
        ("widgets/widget.cc", WIDGET_SOURCE),
    ])?;
    let options = SyncOptions { dry_run: true, ..SyncOptions::default() };

    let outcome = quiet_processor(options).sync_file(&root.join("widgets/widget.cc"), None, None)?;

    assert!(!outcome.written);
    assert!(outcome.has_changes());
    assert_eq!(fs::read_to_string(root.join("widgets/widget.h"))?, WIDGET_HEADER);
    assert!(!root.join("widgets/widget.h.before_cpp_refactor.h").exists());
    Ok(())
}

#[test]
fn explicit_header_and_class() -> Result<()> {
    let dir = tempdir()?;
    let header = dir.path().join("shapes.h");
    let source = dir.path().join("circle.cc");
    fs::write(&header, "class Square {\n public:\n  int Side();\n};\n\nclass Circle {\n public:\n  double Radius();\n};\n")?;
    fs::write(&source, "double Circle::Radius() const { return r_; }\nint Square::Side() { return 1; }\n")?;

    let outcome = quiet_processor(SyncOptions::default()).sync_file(&source, Some(&header), Some("Circle"))?;

    assert_eq!(outcome.class_name, "Circle");
    assert_eq!(
        fs::read_to_string(&header)?,
        "class Square {\n public:\n  int Side();\n};\n\nclass Circle {\n public:\n  double Radius() const;\n};\n"
    );
    Ok(())
}

#[test]
fn include_roots_resolve_headers_outside_google3() -> Result<()> {
    let dir = tempdir()?;
    let include_root = dir.path().join("include");
    fs::create_dir_all(include_root.join("lib"))?;
    fs::create_dir_all(dir.path().join("src"))?;
    fs::write(include_root.join("lib/timer.h"), "class Timer {\n public:\n  void Start();\n};\n")?;
    let source = dir.path().join("src/timer.cc");
    fs::write(&source, "#include \"lib/timer.h\"\n\nvoid Timer::Start() {}\n")?;

    let options = SyncOptions { include_roots: vec![include_root.clone()], ..SyncOptions::default() };
    let processor = quiet_processor(options);
    let header = processor.resolve_header(&source, &[fs::read_to_string(&source)?])?;
    assert_eq!(header.canonicalize()?, include_root.join("lib/timer.h").canonicalize()?);

    let missing = quiet_processor(SyncOptions::default()).sync_file(&source, None, None);
    assert!(missing.is_err());
    Ok(())
}

#[test]
fn source_without_member_definitions_fails() -> Result<()> {
    let dir = tempdir()?;
    let header = dir.path().join("a.h");
    let source = dir.path().join("a.cc");
    fs::write(&header, "class A {\n public:\n  void f();\n};\n")?;
    fs::write(&source, "#include \"a.h\"\nvoid f() {}\n")?;

    let err = quiet_processor(SyncOptions::default())
        .sync_file(&source, Some(&header), Some("A"))
        .unwrap_err();
    assert!(format!("{:#}", err).contains("A::"));
    assert_eq!(fs::read_to_string(&header)?, "class A {\n public:\n  void f();\n};\n");
    Ok(())
}

#[test]
fn header_edited_after_planning_is_not_overwritten() -> Result<()> {
    let dir = tempdir()?;
    let header = dir.path().join("a.h");
    let source = dir.path().join("a.cc");
    fs::write(&header, "class A {\n public:\n  void f();\n};\n")?;
    fs::write(&source, "void A::f(int x) {}\n")?;

    let processor = quiet_processor(SyncOptions::default());
    let plan = processor.plan(&source, Some(&header), None)?;
    fs::write(&header, "class A {\n public:\n  void f();\n  void g();\n};\n")?;

    assert!(processor.apply(plan).is_err());
    assert!(!dir.path().join("a.h.before_cpp_refactor.h").exists());
    Ok(())
}

fn write_all(root: &Path, files: &[(&str, &str)]) -> Result<()> {
    for (relative, content) in files {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap_or(root))?;
        fs::write(path, content)?;
    }
    Ok(())
}

#[test]
fn batch_plans_every_source() -> Result<()> {
    let (_dir, root) = google3_tree(&[
        ("widgets/widget.h", WIDGET_HEADER),
        ("widgets/widget.cc", WIDGET_SOURCE),
    ])?;
    write_all(&root, &[
        ("gadgets/gadget.h", "class Gadget {\n public:\n  void Spin(int turns);\n};\n"),
        ("gadgets/gadget.cc", "#include \"gadgets/gadget.h\"\n\nvoid Gadget::Spin(int turns) {}\n"),
        ("tools/main.cc", "int main() { return 0; }\n"),
        ("widgets/README.md", "not a source\n"),
    ])?;

    let options = SyncOptions { backup: false, parallel_threads: Some(2), ..SyncOptions::default() };
    let report = quiet_processor(options).sync_directory(&root)?;

    assert_eq!(report.stats.total_files, 3);
    assert_eq!(report.stats.written_headers, 1);
    assert_eq!(report.stats.in_sync_headers, 1);
    assert_eq!(report.stats.error_files, 1);
    assert_eq!(report.stats.added_declarations, 1);
    assert_eq!(report.failures[0].source, root.join("tools/main.cc"));
    assert_eq!(fs::read_to_string(root.join("widgets/widget.h"))?, WIDGET_SYNCED);

    let json = serde_json::to_value(&report)?;
    assert_eq!(json["outcomes"].as_array().map(Vec::len), Some(2));
    Ok(())
}

#[test]
fn batch_respects_max_files_and_dry_run() -> Result<()> {
    let source = WIDGET_SOURCE.replace("widgets/widget.h", "a/widget.h");
    let (_dir, root) = google3_tree(&[
        ("a/widget.h", WIDGET_HEADER),
        ("a/widget.cc", source.as_str()),
        ("b/other.cc", "int x;\n"),
    ])?;

    let options = SyncOptions { dry_run: true, max_files: Some(1), ..SyncOptions::default() };
    let report = quiet_processor(options).sync_directory(&root)?;

    assert_eq!(report.stats.total_files, 1);
    assert_eq!(report.stats.pending_headers, 1);
    assert_eq!(fs::read_to_string(root.join("a/widget.h"))?, WIDGET_HEADER);
    Ok(())
}
