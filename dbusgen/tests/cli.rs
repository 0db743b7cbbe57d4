//! End-to-end tests driving the `dbusgen` binary.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

const FROBNICATOR: &str = r#"<node>
  <interface name="org.project.Bar.Frobnicator">
    <method name="RandomMethod"/>
  </interface>
</node>
"#;

fn dbusgen(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_dbusgen"))
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("failed to run dbusgen")
}

fn write_input(dir: &Path, name: &str, contents: &str) {
    std::fs::write(dir.join(name), contents).unwrap();
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_no_arguments_fails() {
    let dir = TempDir::new().unwrap();
    let output = dbusgen(dir.path(), &[]);
    assert!(!output.status.success());
}

#[test]
fn test_header_from_empty_file() {
    let dir = TempDir::new().unwrap();
    write_input(dir.path(), "empty.xml", "");

    let output = dbusgen(dir.path(), &["--header", "--output", "stdout", "empty.xml"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stderr(&output), "");

    let header = std::fs::read_to_string(dir.path().join("stdout")).unwrap();
    assert!(header.contains("#ifndef __STDOUT__"));
    assert!(header.contains("G_BEGIN_DECLS\n\n\nG_END_DECLS"));
}

#[test]
fn test_body_names_header() {
    let dir = TempDir::new().unwrap();
    write_input(dir.path(), "frob.xml", FROBNICATOR);

    let output = dbusgen(dir.path(), &["--body", "--output", "frob.c", "frob.xml"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let body = std::fs::read_to_string(dir.path().join("frob.c")).unwrap();
    assert!(body.contains("#include \"frob.h\""));
    assert!(body.contains("org_project_bar_frobnicator_call_random_method"));
}

#[test]
fn test_docbook_and_rst_files() {
    let dir = TempDir::new().unwrap();
    write_input(dir.path(), "frob.xml", FROBNICATOR);

    let output = dbusgen(dir.path(), &["--generate-docbook", "test", "frob.xml"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(output.stdout.is_empty());
    let xml = std::fs::read_to_string(dir.path().join("test-org.project.Bar.Frobnicator.xml")).unwrap();
    assert!(!xml.is_empty());

    let output = dbusgen(
        dir.path(),
        &["--generate-rst", "test", "--output-directory", "docs", "frob.xml"],
    );
    assert!(output.status.success(), "{}", stderr(&output));
    let rst = std::fs::read_to_string(
        dir.path().join("docs").join("test-org.project.Bar.Frobnicator.rst"),
    )
    .unwrap();
    assert!(!rst.is_empty());
}

#[test]
fn test_invalid_version_fails() {
    let dir = TempDir::new().unwrap();
    write_input(dir.path(), "empty.xml", "");

    for version in ["hello mum", "2.6"] {
        let output = dbusgen(
            dir.path(),
            &["--body", "--output", "out.c", "--glib-min-required", version, "empty.xml"],
        );
        assert!(!output.status.success(), "{version} accepted");
        assert!(!dir.path().join("out.c").exists());
    }
}

#[test]
fn test_error_leaves_no_output() {
    let dir = TempDir::new().unwrap();
    write_input(dir.path(), "good.xml", FROBNICATOR);
    write_input(dir.path(), "bad.xml", "<node><interface name=\"a.B\"></node>");

    let output = dbusgen(
        dir.path(),
        &["--header", "--output", "out.h", "good.xml", "bad.xml"],
    );
    assert!(!output.status.success());
    assert!(stderr(&output).starts_with("dbusgen: "));
    assert!(!dir.path().join("out.h").exists());
}

#[test]
fn test_documents_written_all_or_none() {
    let dir = TempDir::new().unwrap();
    let two = r#"<node>
      <interface name="com.acme.Coyote"/>
      <interface name="org.project.Bar.Frobnicator"/>
    </node>"#;
    write_input(dir.path(), "two.xml", two);
    std::fs::create_dir(dir.path().join("test-org.project.Bar.Frobnicator.rst")).unwrap();

    let output = dbusgen(dir.path(), &["--generate-rst", "test", "two.xml"]);
    assert!(!output.status.success());
    assert!(!dir.path().join("test-com.acme.Coyote.rst").exists());

    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(leftovers.len(), 2, "{leftovers:?}");
}

#[test]
fn test_missing_input_reported() {
    let dir = TempDir::new().unwrap();
    let output = dbusgen(dir.path(), &["--header", "--output", "out.h", "missing.xml"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("missing.xml"));
}

#[test]
fn test_conflicting_modes_fail() {
    let dir = TempDir::new().unwrap();
    write_input(dir.path(), "frob.xml", FROBNICATOR);
    let output = dbusgen(
        dir.path(),
        &["--header", "--body", "--output", "out", "frob.xml"],
    );
    assert!(!output.status.success());
    assert!(stderr(&output).contains("exactly one output mode"));
}
