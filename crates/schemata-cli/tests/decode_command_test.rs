use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn cargo_bin() -> PathBuf {
    if let Ok(path) = env::var("CARGO_BIN_EXE_schemata") {
        return PathBuf::from(path);
    }

    let target_dir = env::var("CARGO_TARGET_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| repo_root().join("target"));
    let executable_name = format!("schemata{}", std::env::consts::EXE_SUFFIX);
    let fallback = target_dir.join("debug").join(executable_name);

    if fallback.exists() {
        return fallback;
    }

    panic!(
        "CARGO_BIN_EXE_schemata is not set and fallback binary was not found at {}",
        fallback.display()
    );
}

fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

fn testdata_path(path: &str) -> PathBuf {
    repo_root().join("testdata").join(path)
}

fn unique_temp_path(name: &str, extension: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time should be after UNIX_EPOCH")
        .as_nanos();
    env::temp_dir().join(format!(
        "schemata-cli-{name}-{}-{nanos}.{extension}",
        std::process::id()
    ))
}

struct TempFile {
    path: PathBuf,
}

impl TempFile {
    fn create(name: &str, extension: &str, content: &str) -> Self {
        let path = unique_temp_path(name, extension);
        fs::write(&path, content).expect("temporary file should be created");
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

fn run_decode(input: &Path, schema: &Path, extra: &[&str]) -> Output {
    Command::new(cargo_bin())
        .args([
            "decode",
            input.to_string_lossy().as_ref(),
            "--schema",
            schema.to_string_lossy().as_ref(),
        ])
        .args(extra)
        .output()
        .expect("schemata decode should execute")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[test]
fn decode_valid_person_prints_domain_value() {
    let output = run_decode(
        &testdata_path("inputs/person_valid.json"),
        &testdata_path("schemas/person.yaml"),
        &[],
    );

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    let json = stdout_json(&output);
    assert_eq!(json["name"], "Ada");
    assert_eq!(json["age"], 36.0);
    assert_eq!(json["joined"], "2024-01-02T03:04:05.000Z");
}

#[test]
fn decode_invalid_person_prints_first_error_tree() {
    let output = run_decode(
        &testdata_path("inputs/person_invalid.json"),
        &testdata_path("schemas/person.yaml"),
        &[],
    );

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).is_empty());
    assert_eq!(
        stderr(&output).trim_end(),
        "error(s) found\n└─ [\"name\"]\n   └─ Expected a string at least 1 character(s) long, actual \"\""
    );
}

#[test]
fn decode_invalid_person_flat_all_errors() {
    let output = run_decode(
        &testdata_path("inputs/person_invalid.json"),
        &testdata_path("schemas/person.yaml"),
        &["--all-errors", "--format", "flat"],
    );

    assert_eq!(output.status.code(), Some(1));
    let lines: Vec<String> = stderr(&output).lines().map(ToString::to_string).collect();
    assert_eq!(
        lines,
        vec![
            "/name Expected a string at least 1 character(s) long, actual \"\"",
            "/age Expected Age, actual 1.5",
            "/email must be an email address",
            "/tags/1 Expected string, actual 1",
        ]
    );
}

#[test]
fn decode_recursive_document_collapses_error_path() {
    let output = run_decode(
        &testdata_path("inputs/category.json"),
        &testdata_path("schemas/category.yaml"),
        &[],
    );

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        stderr(&output).trim_end(),
        "error(s) found\n└─ [\"subcategories\"][1][\"subcategories\"][0][\"name\"]\n   └─ Expected string, actual 1"
    );
}

#[test]
fn decode_named_definition_with_root_flag() {
    let input = TempFile::create("shape", "json", r#"{"kind": "square", "sideLength": 2}"#);
    let output = run_decode(
        input.path(),
        &testdata_path("schemas/category.yaml"),
        &["--root", "Shape"],
    );

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert_eq!(stdout_json(&output)["sideLength"], 2.0);

    let input = TempFile::create("shape-bad", "json", r#"{"kind": "triangle"}"#);
    let output = run_decode(
        input.path(),
        &testdata_path("schemas/category.yaml"),
        &["--root", "Shape", "--format", "flat"],
    );
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        stderr(&output).trim_end(),
        "/kind Expected \"circle\" or \"square\", actual \"triangle\""
    );
}

#[test]
fn decode_excess_property_policies() {
    let input = TempFile::create("price", "json", r#"{"amount": "1.5", "label": " x ", "extra": true}"#);
    let schema = testdata_path("schemas/price.json");

    let output = run_decode(input.path(), &schema, &[]);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert_eq!(
        stdout_json(&output),
        serde_json::json!({"amount": 1.5, "label": "x"})
    );

    let output = run_decode(input.path(), &schema, &["--on-excess-property", "preserve"]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout_json(&output)["extra"], true);

    let output = run_decode(input.path(), &schema, &["--on-excess-property", "error"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("[\"extra\"]"));
    assert!(stderr(&output).contains("is unexpected"));
}

#[test]
fn decode_options_from_config_file() {
    let input = TempFile::create("price-config", "json", r#"{"amount": "x", "label": 1, "extra": 1}"#);
    let output = run_decode(
        input.path(),
        &testdata_path("schemas/price.json"),
        &[
            "--config",
            testdata_path("options.yaml").to_string_lossy().as_ref(),
            "--format",
            "flat",
        ],
    );

    assert_eq!(output.status.code(), Some(1));
    let stderr = stderr(&output);
    assert_eq!(stderr.lines().count(), 3, "stderr: {stderr}");
    assert!(stderr.contains("/extra is unexpected"));
    assert!(stderr.contains("/amount Expected string <-> number, actual \"x\""));
    assert!(stderr.contains("/label Expected string, actual 1"));
}

#[test]
fn decode_missing_schema_exits_with_2() {
    let input = TempFile::create("input", "json", "{}");
    let output = run_decode(input.path(), Path::new("/nonexistent/schema.yaml"), &[]);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("Failed to load schema"));
}

#[test]
fn decode_invalid_json_input_exits_with_2() {
    let input = TempFile::create("broken", "json", "{not json");
    let output = run_decode(input.path(), &testdata_path("schemas/price.json"), &[]);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("is not valid JSON"));
}

#[test]
fn decode_unknown_root_exits_with_2() {
    let input = TempFile::create("input", "json", "{}");
    let output = run_decode(
        input.path(),
        &testdata_path("schemas/category.yaml"),
        &["--root", "Missing"],
    );

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("No definition named Missing"));
}
