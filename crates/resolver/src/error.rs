use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Config validation error (empty path, bad zone label, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
    /// Missing required column in an input CSV.
    #[error("{source_name}: missing column '{column}'")]
    MissingColumn { source_name: String, column: String },
    /// Malformed CSV record.
    #[error("{source_name}: {message}")]
    Csv { source_name: String, message: String },
    /// IO error (file read, etc.).
    #[error("IO error: {0}")]
    Io(String),
}
