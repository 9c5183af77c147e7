use thiserror::Error;

/// Errors that can occur while fetching or refreshing a working copy
#[derive(Debug, Error)]
pub enum GitError {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{command} exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("{tool} could not be run: {source}")]
    ToolUnavailable {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid import path: {0}")]
    InvalidImportPath(String),
}

impl GitError {
    /// Short machine-readable code for JSON output
    pub fn error_code(&self) -> &'static str {
        match self {
            GitError::Git(_) => "git_error",
            GitError::Io(_) => "io_error",
            GitError::CommandFailed { .. } => "fetch_failed",
            GitError::ToolUnavailable { .. } => "tool_unavailable",
            GitError::InvalidImportPath(_) => "invalid_args",
        }
    }
}
