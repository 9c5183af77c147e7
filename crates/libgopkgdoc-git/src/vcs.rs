//! Version-control backends used to fetch and refresh working copies

use std::path::Path;
use std::process::{Command, Output};

use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::Repository;
use tracing::debug;

use crate::error::GitError;

/// Messages `git pull` prints when there was nothing to merge
const UP_TO_DATE_MESSAGES: [&str; 2] = ["Already up to date.", "Already up-to-date."];

/// Operations the synchronizer needs from a version-control system
pub trait Vcs {
    /// Name of the metadata directory whose presence marks a working copy
    fn metadata_dir(&self) -> &str;

    /// Create a working copy of `remote` at `dir`
    fn fetch(&self, remote: &str, dir: &Path) -> Result<(), GitError>;

    /// Bring the working copy at `dir` up to date. Returns whether anything
    /// changed; `false` only when the backend is sure nothing did.
    fn refresh(&self, dir: &Path) -> Result<bool, GitError>;
}

/// Backend running the `git` executable
#[derive(Debug, Clone)]
pub struct GitCommand {
    program: String,
}

impl Default for GitCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl GitCommand {
    pub fn new() -> Self {
        Self::with_program("git")
    }

    /// Use a specific executable instead of `git` from `PATH`
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Whether `git pull` output says there was nothing new
    pub fn is_up_to_date(stdout: &str) -> bool {
        let stdout = stdout.trim();
        UP_TO_DATE_MESSAGES.contains(&stdout)
    }

    fn run(&self, args: &[&str], dir: Option<&Path>) -> Result<Output, GitError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(args).env("LC_ALL", "C");
        if let Some(dir) = dir {
            cmd.current_dir(dir);
        }

        let output = cmd.output().map_err(|source| GitError::ToolUnavailable {
            tool: self.program.clone(),
            source,
        })?;
        if !output.status.success() {
            return Err(GitError::CommandFailed {
                command: format!("{} {}", self.program, args.join(" ")),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output)
    }
}

impl Vcs for GitCommand {
    fn metadata_dir(&self) -> &str {
        ".git"
    }

    fn fetch(&self, remote: &str, dir: &Path) -> Result<(), GitError> {
        let dir_arg = dir.to_string_lossy();
        self.run(&["clone", "--quiet", remote, &dir_arg], None)?;
        Ok(())
    }

    fn refresh(&self, dir: &Path) -> Result<bool, GitError> {
        let output = self.run(&["pull", "--ff-only"], Some(dir))?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        debug!(dir = %dir.display(), output = %stdout.trim(), "git pull finished");
        Ok(!Self::is_up_to_date(&stdout))
    }
}

/// Backend using libgit2 in-process
#[derive(Debug, Clone, Copy, Default)]
pub struct LibGit;

impl LibGit {
    pub fn new() -> Self {
        Self
    }
}

impl Vcs for LibGit {
    fn metadata_dir(&self) -> &str {
        ".git"
    }

    fn fetch(&self, remote: &str, dir: &Path) -> Result<(), GitError> {
        RepoBuilder::new().clone(remote, dir)?;
        Ok(())
    }

    fn refresh(&self, dir: &Path) -> Result<bool, GitError> {
        let repo = Repository::open(dir)?;
        let mut remote = repo.find_remote("origin")?;
        remote.fetch::<&str>(&[], None, None)?;

        let head = repo.head()?;
        if !head.is_branch() {
            return Err(git2::Error::from_str("HEAD is not on a branch").into());
        }
        let branch = head
            .shorthand()
            .ok_or_else(|| git2::Error::from_str("branch name is not valid UTF-8"))?
            .to_string();
        let old = head
            .target()
            .ok_or_else(|| git2::Error::from_str("HEAD has no target"))?;
        let new = repo.refname_to_id(&format!("refs/remotes/origin/{}", branch))?;
        if old == new {
            return Ok(false);
        }
        if !repo.graph_descendant_of(new, old)? {
            return Err(git2::Error::from_str("not possible to fast-forward").into());
        }

        let commit = repo.find_commit(new)?;
        repo.checkout_tree(commit.as_object(), Some(CheckoutBuilder::new().force()))?;
        let mut head = repo.head()?;
        head.set_target(new, "fast-forward")?;
        debug!(dir = %dir.display(), from = %old, to = %new, "fast-forwarded");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_up_to_date_messages() {
        assert!(GitCommand::is_up_to_date("Already up to date.\n"));
        assert!(GitCommand::is_up_to_date("  Already up-to-date.  "));
        assert!(!GitCommand::is_up_to_date("Updating 1a2b3c..4d5e6f\nFast-forward\n"));
        assert!(!GitCommand::is_up_to_date(""));
    }

    #[test]
    fn test_missing_tool_is_reported() {
        let dir = tempdir().unwrap();
        let vcs = GitCommand::with_program("gopkgdoc-no-such-tool");
        let err = vcs.fetch("https://example.invalid/x.git", &dir.path().join("x")).unwrap_err();
        assert!(matches!(err, GitError::ToolUnavailable { .. }));
    }

    #[test]
    fn test_libgit_refresh_requires_repository() {
        let dir = tempdir().unwrap();
        assert!(matches!(LibGit::new().refresh(dir.path()), Err(GitError::Git(_))));
    }
}
