use libgopkgdoc_core::CoreError;
use libgopkgdoc_git::GitError;
use thiserror::Error;

/// Errors returned when loading documentation
#[derive(Debug, Error)]
pub enum DocsError {
    /// The working copy could not be fetched or refreshed
    #[error("fetch failed: {0}")]
    Fetch(#[from] GitError),

    /// Sources could not be parsed into a package
    #[error(transparent)]
    Build(#[from] CoreError),

    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),
}

impl DocsError {
    /// Get the error code for JSON output
    pub fn error_code(&self) -> &'static str {
        match self {
            DocsError::Fetch(e) => e.error_code(),
            DocsError::Build(e) => e.error_code(),
            DocsError::InvalidArgs(_) => "invalid_args",
        }
    }

    /// Get the exit code for the CLI
    pub fn exit_code(&self) -> i32 {
        match self {
            DocsError::InvalidArgs(_) => 2,
            DocsError::Fetch(GitError::InvalidImportPath(_)) => 2,
            DocsError::Fetch(GitError::ToolUnavailable { .. }) => 6,
            DocsError::Fetch(_) => 4,
            DocsError::Build(CoreError::PackageNotFound(_)) => 3,
            DocsError::Build(CoreError::TomlParse(_)) => 2,
            DocsError::Build(CoreError::Io(_)) => 5,
            DocsError::Build(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        let err = DocsError::from(GitError::InvalidImportPath("../x".into()));
        assert_eq!(err.error_code(), "invalid_args");
        assert_eq!(err.exit_code(), 2);

        let err = DocsError::from(CoreError::PackageNotFound("example.com/x".into()));
        assert_eq!(err.error_code(), "package_not_found");
        assert_eq!(err.exit_code(), 3);
        assert_eq!(err.to_string(), "package example.com/x not found");

        let err = DocsError::from(GitError::CommandFailed {
            command: "git clone".into(),
            status: "exit status: 128".into(),
            stderr: "fatal: repository not found".into(),
        });
        assert_eq!(err.exit_code(), 4);
        assert!(err.to_string().starts_with("fetch failed: git clone exited with"));
    }
}
