use std::path::Path;

use assert_cmd::Command;
use git2::{Repository, Signature};
use predicates::prelude::*;
use tempfile::tempdir;

fn init_upstream(path: &Path, name: &str, content: &str) {
    let repo = Repository::init(path).expect("Failed to init git repo");
    std::fs::write(path.join(name), content).unwrap();
    let mut index = repo.index().unwrap();
    index.add_path(Path::new(name)).unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let sig = Signature::now("Test", "test@example.com").unwrap();
    repo.commit(Some("HEAD"), &sig, &sig, "Initial commit", &tree, &[])
        .expect("Failed to create initial commit");
}

fn gopkgdoc() -> Command {
    let mut cmd = Command::cargo_bin("gopkgdoc").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_json_output() {
    let upstream = tempdir().unwrap();
    let scratch = tempdir().unwrap();
    init_upstream(
        upstream.path(),
        "gears.go",
        "// Package gears turns.\npackage gears\n\n// Turn turns.\nfunc Turn(n int) error { return nil }\n",
    );

    gopkgdoc()
        .arg("example.com/gears")
        .arg(upstream.path())
        .arg("--json")
        .arg("--backend")
        .arg("libgit2")
        .arg("--scratch-dir")
        .arg(scratch.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"ok\": true"))
        .stdout(predicate::str::contains("\"name\": \"gears\""))
        .stdout(predicate::str::contains("func Turn(n int) error"));
}

#[test]
fn test_text_summary_for_command() {
    let upstream = tempdir().unwrap();
    let scratch = tempdir().unwrap();
    init_upstream(upstream.path(), "main.go", "package main\n\nfunc main() {}\n");

    gopkgdoc()
        .arg("example.com/tools/spinner")
        .arg(upstream.path())
        .args(["--backend", "libgit2"])
        .arg("--scratch-dir")
        .arg(scratch.path())
        .assert()
        .success()
        .stdout(predicate::str::starts_with("command spinner // import \"example.com/tools/spinner\""))
        .stdout(predicate::str::contains("files: main.go"));
}

#[test]
fn test_invalid_import_path_exit_code() {
    let scratch = tempdir().unwrap();
    gopkgdoc()
        .args(["../escape", "unused", "--json", "--backend", "libgit2"])
        .arg("--scratch-dir")
        .arg(scratch.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("\"code\": \"invalid_args\""));
}

#[test]
fn test_clone_failure_exit_code() {
    let scratch = tempdir().unwrap();
    gopkgdoc()
        .arg("example.com/missing")
        .arg(scratch.path().join("no-such-upstream"))
        .args(["--backend", "libgit2"])
        .arg("--scratch-dir")
        .arg(scratch.path().join("copies"))
        .assert()
        .code(4)
        .stderr(predicate::str::contains("error: fetch failed"));
}

#[test]
fn test_missing_config_file() {
    let scratch = tempdir().unwrap();
    gopkgdoc()
        .args(["example.com/x", "unused", "--config"])
        .arg(scratch.path().join("absent.toml"))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("config file not found"));
}
