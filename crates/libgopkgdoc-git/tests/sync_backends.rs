//! Synchronizer behaviour against real repositories
//!
//! Upstream repositories are created on disk with git2 and cloned through
//! each backend. Tests for the command backend are skipped when no `git`
//! executable is installed.

use std::path::Path;
use std::process::Command;
use std::time::Duration;

use git2::{Repository, Signature};
use libgopkgdoc_git::{GitCommand, GitError, LibGit, Synchronizer, Vcs, DEFAULT_COOLDOWN};
use tempfile::tempdir;

fn commit_file(repo: &Repository, name: &str, content: &str, message: &str) {
    let workdir = repo.workdir().expect("upstream has a workdir");
    std::fs::write(workdir.join(name), content).unwrap();

    let mut index = repo.index().unwrap();
    index.add_path(Path::new(name)).unwrap();
    index.write().unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();

    let sig = Signature::now("Test", "test@example.com").unwrap();
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .expect("Failed to create commit");
}

fn init_upstream(path: &Path) -> Repository {
    let repo = Repository::init(path).expect("Failed to init git repo");
    commit_file(&repo, "widgets.go", "package widgets\n\nfunc A() {}\n", "Initial commit");
    repo
}

fn git_available() -> bool {
    Command::new("git").arg("--version").output().is_ok_and(|o| o.status.success())
}

fn backends() -> Vec<(&'static str, Box<dyn Vcs + Send + Sync>)> {
    let mut backends: Vec<(&'static str, Box<dyn Vcs + Send + Sync>)> = vec![("libgit2", Box::new(LibGit::new()))];
    if git_available() {
        backends.push(("command", Box::new(GitCommand::new())));
    }
    backends
}

#[test]
fn test_fetch_then_fetch_is_idempotent() {
    for (name, vcs) in backends() {
        let upstream_dir = tempdir().unwrap();
        let scratch = tempdir().unwrap();
        init_upstream(upstream_dir.path());
        let remote = upstream_dir.path().to_string_lossy().into_owned();

        let sync = Synchronizer::new(scratch.path(), DEFAULT_COOLDOWN, vcs);
        let first = sync.sync("example.com/widgets", &remote).unwrap();
        assert!(first.changed, "{name}: first sync clones");
        assert!(first.local_path.join("widgets.go").exists(), "{name}");

        let second = sync.sync("example.com/widgets", &remote).unwrap();
        assert!(!second.changed, "{name}: second sync within cooldown");
        assert_eq!(first.local_path, second.local_path);
    }
}

#[test]
fn test_refresh_reports_upstream_changes() {
    for (name, vcs) in backends() {
        let upstream_dir = tempdir().unwrap();
        let scratch = tempdir().unwrap();
        let upstream = init_upstream(upstream_dir.path());
        let remote = upstream_dir.path().to_string_lossy().into_owned();

        let sync = Synchronizer::new(scratch.path(), Duration::ZERO, vcs);
        let cloned = sync.sync("example.com/widgets", &remote).unwrap();
        assert!(cloned.changed, "{name}");

        std::thread::sleep(Duration::from_millis(5));
        let unchanged = sync.sync("example.com/widgets", &remote).unwrap();
        assert!(!unchanged.changed, "{name}: nothing new upstream");

        commit_file(&upstream, "more.go", "package widgets\n\nfunc B() {}\n", "Add B");
        std::thread::sleep(Duration::from_millis(5));
        let updated = sync.sync("example.com/widgets", &remote).unwrap();
        assert!(updated.changed, "{name}: upstream commit pulled");
        assert!(updated.local_path.join("more.go").exists(), "{name}");
    }
}

#[test]
fn test_clone_failure_is_an_error() {
    for (name, vcs) in backends() {
        let scratch = tempdir().unwrap();
        let missing = scratch.path().join("no-such-upstream");
        let sync = Synchronizer::new(scratch.path().join("copies"), DEFAULT_COOLDOWN, vcs);

        let err = sync
            .sync("example.com/missing", &missing.to_string_lossy())
            .unwrap_err();
        match (name, &err) {
            ("libgit2", GitError::Git(_)) | ("command", GitError::CommandFailed { .. }) => {}
            _ => panic!("{name}: unexpected error {err:?}"),
        }
    }
}

#[test]
fn test_invalid_import_path_touches_nothing() {
    let scratch = tempdir().unwrap();
    let sync = Synchronizer::new(scratch.path(), DEFAULT_COOLDOWN, Box::new(LibGit::new()));
    let err = sync.sync("../outside", "unused").unwrap_err();
    assert!(matches!(err, GitError::InvalidImportPath(_)));
    assert_eq!(err.error_code(), "invalid_args");
}
