use thiserror::Error;

/// Errors that can occur while parsing sources and building documentation
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("package {0} not found")]
    PackageNotFound(String),

    #[error("failed to load Go grammar: {0}")]
    Language(#[from] tree_sitter::LanguageError),

    #[error("invalid syntax query: {0}")]
    Query(#[from] tree_sitter::QueryError),

    #[error("failed to print declaration: {0}")]
    Print(String),

    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl CoreError {
    /// Short machine-readable code for JSON output
    pub fn error_code(&self) -> &'static str {
        match self {
            CoreError::PackageNotFound(_) => "package_not_found",
            CoreError::Language(_) => "internal_error",
            CoreError::Query(_) => "internal_error",
            CoreError::Print(_) => "internal_error",
            CoreError::Pattern(_) => "invalid_args",
            CoreError::Io(_) => "io_error",
            CoreError::TomlParse(_) => "invalid_config",
            CoreError::TomlSerialize(_) => "internal_error",
        }
    }
}
