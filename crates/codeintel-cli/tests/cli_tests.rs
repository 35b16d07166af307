//! Integration tests for the codeintel binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn codeintel_cmd(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("codeintel").unwrap();
    cmd.env("CODEINTEL_DB", home.path().join("index.sqlite"))
        .env("CODEINTEL_CONFIG", home.path().join("config.yml"))
        .env_remove("RUST_LOG");
    cmd
}

fn write_files(root: &Path, files: &[(&str, &str)]) {
    for (path, content) in files {
        let full_path = root.join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full_path, content).unwrap();
    }
}

const GREETER: &str = "import os\n\n\ndef greet(name):\n    return os.path.join(\"hi\", name)\n\n\nclass Greeter:\n    def run(self):\n        return greet(\"x\")\n";

#[test]
fn test_languages_lists_registered_grammars() {
    let home = TempDir::new().unwrap();

    codeintel_cmd(&home)
        .arg("languages")
        .assert()
        .success()
        .stdout(predicate::str::contains("python"))
        .stdout(predicate::str::contains("rust"))
        .stdout(predicate::str::contains("py, pyi, pyw"));
}

#[test]
fn test_languages_json() {
    let home = TempDir::new().unwrap();

    let output = codeintel_cmd(&home)
        .args(["--format", "json", "languages"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let languages = parsed.as_array().unwrap();
    assert!(languages
        .iter()
        .any(|l| l["language"] == "go" && l["extensions"][0] == "go"));
}

#[test]
fn test_classify_license_is_governance() {
    let home = TempDir::new().unwrap();
    let repo = TempDir::new().unwrap();
    write_files(
        repo.path(),
        &[
            ("LICENSE", "MIT License\n\nPermission is hereby granted"),
            ("main.py", "print('hi')\n"),
        ],
    );

    codeintel_cmd(&home)
        .arg("classify")
        .arg(repo.path().join("LICENSE"))
        .arg(repo.path().join("main.py"))
        .assert()
        .success()
        .stdout(predicate::str::contains("GOVERNANCE"))
        .stdout(predicate::str::contains("PRACTICE"));
}

#[test]
fn test_classify_uses_directory_rules() {
    let home = TempDir::new().unwrap();
    let repo = TempDir::new().unwrap();
    write_files(
        repo.path(),
        &[
            ("papers/notes.md", "# Notes\n\nSome thoughts.\n"),
            ("notes.md", "# Notes\n\nSome thoughts.\n"),
        ],
    );

    let output = codeintel_cmd(&home)
        .current_dir(repo.path())
        .args(["--format", "json", "classify", "papers/notes.md", "notes.md"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed[0]["classification"], "THEORY");
    assert_eq!(parsed[1]["classification"], "PRACTICE");
}

#[test]
fn test_classify_missing_file_fails() {
    let home = TempDir::new().unwrap();

    codeintel_cmd(&home)
        .args(["classify", "/nonexistent/codeintel/file.py"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot read"));
}

#[test]
fn test_chunks_json_for_python() {
    let home = TempDir::new().unwrap();
    let repo = TempDir::new().unwrap();
    write_files(repo.path(), &[("greeter.py", GREETER)]);

    let output = codeintel_cmd(&home)
        .args(["--format", "json", "chunks"])
        .arg(repo.path().join("greeter.py"))
        .output()
        .unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let chunks = parsed.as_array().unwrap();
    assert!(!chunks.is_empty());
    assert!(chunks.iter().any(|c| c["function_name"] == "greet"));
    assert!(chunks.iter().all(|c| c.get("content").is_none()));
}

#[test]
fn test_chunks_unknown_language_uses_windows() {
    let home = TempDir::new().unwrap();
    let repo = TempDir::new().unwrap();
    let body: String = (0..10).map(|i| format!("row {}\n", i)).collect();
    write_files(repo.path(), &[("data.xyz", &body)]);

    codeintel_cmd(&home)
        .arg("chunks")
        .arg(repo.path().join("data.xyz"))
        .assert()
        .success()
        .stdout(predicate::str::contains("text"))
        .stdout(predicate::str::contains("[fallback]"));
}

#[test]
fn test_graph_reports_definitions() {
    let home = TempDir::new().unwrap();
    let repo = TempDir::new().unwrap();
    write_files(repo.path(), &[("greeter.py", GREETER)]);

    codeintel_cmd(&home)
        .arg("graph")
        .arg(repo.path().join("greeter.py"))
        .assert()
        .success()
        .stdout(predicate::str::contains("DEFINES"))
        .stdout(predicate::str::contains("IMPORTS"))
        .stdout(predicate::str::contains("greet"));
}

#[test]
fn test_ingest_local_repository() {
    let home = TempDir::new().unwrap();
    let repo = TempDir::new().unwrap();
    write_files(
        repo.path(),
        &[
            ("app/greeter.py", GREETER),
            ("src/lib.rs", "pub fn hello() -> u32 {\n    1\n}\n"),
            ("LICENSE", "MIT License\n"),
        ],
    );

    codeintel_cmd(&home)
        .args(["ingest", "--quiet"])
        .arg(repo.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("COMPLETED"))
        .stdout(predicate::str::contains("3/3"));

    assert!(home.path().join("index.sqlite").exists());
}

#[test]
fn test_ingest_json_summary() {
    let home = TempDir::new().unwrap();
    let repo = TempDir::new().unwrap();
    write_files(repo.path(), &[("main.py", "print('hi')\n")]);

    let output = codeintel_cmd(&home)
        .args(["--format", "json", "ingest"])
        .arg(repo.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["status"], "COMPLETED");
    assert_eq!(parsed["files_processed"], 1);
}

#[test]
fn test_ingest_missing_source_exits_with_source_code() {
    let home = TempDir::new().unwrap();

    codeintel_cmd(&home)
        .args(["ingest", "--quiet", "/nonexistent/codeintel/repo"])
        .assert()
        .code(5)
        .stdout(predicate::str::contains("FAILED"))
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_ingest_requires_source() {
    let home = TempDir::new().unwrap();

    codeintel_cmd(&home).arg("ingest").assert().failure();
}
