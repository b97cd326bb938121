//! End-to-end tests for the `deck-build` binary.

use deck_pptx::PptxReader;
use std::fs::{self, File};
use std::path::Path;
use std::process::{Command, Output};

fn write_slide(dir: &Path, name: &str, heading: &str) {
    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head><style>body {{ width: 720pt; height: 405pt; background: #1b2a41; }} h1 {{ color: #ffffff; }}</style></head>
<body>
  <h1>{}</h1>
  <ul><li>First point</li><li>Second point</li></ul>
</body>
</html>"#,
        heading
    );
    fs::write(dir.join(name), html).unwrap();
}

fn write_config(dir: &Path, slides: &[&str]) {
    let list: Vec<String> = slides.iter().map(|s| format!("\"{}\"", s)).collect();
    let json = format!(
        r#"{{
  "layout": "LAYOUT_16x9",
  "author": "Test Author",
  "title": "Test Deck",
  "subject": "Testing",
  "slides_dir": "slides",
  "output": "Deck.pptx",
  "slides": [{}]
}}"#,
        list.join(", ")
    );
    fs::write(dir.join("deck.json"), json).unwrap();
}

fn run_in(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_deck-build"))
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap()
}

#[test]
fn builds_slides_in_manifest_order() {
    let dir = tempfile::tempdir().unwrap();
    let slides = dir.path().join("slides");
    fs::create_dir(&slides).unwrap();
    write_slide(&slides, "b.html", "Second");
    write_slide(&slides, "a.html", "First");
    write_config(dir.path(), &["a.html", "b.html"]);

    let output = run_in(dir.path(), &[]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let first = stdout.find("Converting slide 1/2: a.html...").unwrap();
    let second = stdout.find("Converting slide 2/2: b.html...").unwrap();
    assert!(first < second);
    assert!(stdout.contains("Presentation created successfully:"));
    assert!(stdout.contains("Total slides: 2"));

    let deck = dir.path().join("Deck.pptx");
    let summary = PptxReader::new().read(File::open(&deck).unwrap()).unwrap();
    assert_eq!(summary.title, "Test Deck");
    assert_eq!(summary.author, "Test Author");
    assert_eq!(summary.slides.len(), 2);
    assert_eq!(summary.slides[0].lines[0], "First");
    assert_eq!(summary.slides[1].lines[0], "Second");
    assert_eq!(summary.slides[0].lines[1..], ["First point", "Second point"]);
}

#[test]
fn missing_slide_aborts_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let slides = dir.path().join("slides");
    fs::create_dir(&slides).unwrap();
    write_slide(&slides, "a.html", "Only");
    write_config(dir.path(), &["a.html", "missing.html", "a.html"]);

    let output = run_in(dir.path(), &[]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stdout.contains("Converting slide 2/3: missing.html..."));
    assert!(!stdout.contains("Converting slide 3/3"));
    assert!(stderr.contains("Error:"));
    assert!(stderr.contains("missing.html"));
    assert!(!dir.path().join("Deck.pptx").exists());
}

#[test]
fn empty_manifest_writes_empty_deck() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("slides")).unwrap();
    write_config(dir.path(), &[]);

    let output = run_in(dir.path(), &[]);

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Total slides: 0"));
    let summary = PptxReader::new()
        .read(File::open(dir.path().join("Deck.pptx")).unwrap())
        .unwrap();
    assert!(summary.slides.is_empty());
}

#[test]
fn rebuild_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let slides = dir.path().join("slides");
    fs::create_dir(&slides).unwrap();
    write_slide(&slides, "a.html", "Same");
    write_config(dir.path(), &["a.html"]);

    assert!(run_in(dir.path(), &[]).status.success());
    let first = fs::read(dir.path().join("Deck.pptx")).unwrap();
    assert!(run_in(dir.path(), &[]).status.success());
    let second = fs::read(dir.path().join("Deck.pptx")).unwrap();

    assert_eq!(first, second);
}

#[test]
fn config_and_output_flags() {
    let dir = tempfile::tempdir().unwrap();
    let project = dir.path().join("project");
    fs::create_dir_all(project.join("slides")).unwrap();
    write_slide(&project.join("slides"), "a.html", "Flagged");
    write_config(&project, &["a.html"]);

    let config = project.join("deck.json");
    let out = dir.path().join("out").join("custom.pptx");
    let output = run_in(
        dir.path(),
        &["--config", config.to_str().unwrap(), "--output", out.to_str().unwrap()],
    );

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(out.is_file());
    assert!(!project.join("Deck.pptx").exists());
}

#[test]
fn builtin_deck_requires_slides_directory() {
    let dir = tempfile::tempdir().unwrap();

    let output = run_in(dir.path(), &[]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("slides"));
    assert!(!dir.path().join("Revit-MCP-Presentation.pptx").exists());
}
