//! Error taxonomy for the analysis pipeline.
//!
//! Only call-level misuse (`EngineDisabled`, `InvalidConfig`) is ever returned
//! from the engine as an `Err`. Per-file problems are converted into
//! [`ResultError`] records on an otherwise complete `AnalysisResult`, and
//! plugin failures are downgraded at the registry boundary.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while analyzing files.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("no parser claims {path}")]
    UnsupportedLanguage { path: String },
    #[error("failed to parse {path} as {language}: {message}")]
    ParseFailure {
        path: String,
        language: String,
        message: String,
    },
    #[error("extractor '{name}' failed: {message}")]
    ExtractorFailure { name: String, message: String },
    #[error("interpreter '{name}' failed: {message}")]
    InterpreterFailure { name: String, message: String },
    #[error("analysis engine is disabled")]
    EngineDisabled,
    #[error("cache corruption detected in {} entries", entries.len())]
    CacheCorruption { entries: Vec<String> },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("analysis of {path} timed out after {millis}ms")]
    Timeout { path: String, millis: u128 },
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to load configuration: {0}")]
    Config(#[from] serde_yaml::Error),
}

impl AnalysisError {
    /// The serializable kind recorded on results.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalysisError::UnsupportedLanguage { .. } => ErrorKind::UnsupportedLanguage,
            AnalysisError::ParseFailure { .. } => ErrorKind::ParseFailure,
            AnalysisError::ExtractorFailure { .. } => ErrorKind::ExtractorFailure,
            AnalysisError::InterpreterFailure { .. } => ErrorKind::InterpreterFailure,
            AnalysisError::EngineDisabled => ErrorKind::EngineDisabled,
            AnalysisError::CacheCorruption { .. } => ErrorKind::CacheCorruption,
            AnalysisError::InvalidConfig(_) | AnalysisError::Config(_) => ErrorKind::InvalidConfig,
            AnalysisError::Timeout { .. } => ErrorKind::Timeout,
            AnalysisError::Io { .. } => ErrorKind::ReadFailure,
        }
    }

    /// Whether this error is a per-file problem rather than call-level misuse.
    pub fn is_per_file(&self) -> bool {
        !matches!(
            self,
            AnalysisError::EngineDisabled
                | AnalysisError::InvalidConfig(_)
                | AnalysisError::Config(_)
        )
    }
}

/// Error categories surfaced on `AnalysisResult::errors`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnsupportedLanguage,
    ParseFailure,
    ReadFailure,
    ExtractorFailure,
    InterpreterFailure,
    EngineDisabled,
    CacheCorruption,
    InvalidConfig,
    Timeout,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UnsupportedLanguage => "unsupported_language",
            ErrorKind::ParseFailure => "parse_failure",
            ErrorKind::ReadFailure => "read_failure",
            ErrorKind::ExtractorFailure => "extractor_failure",
            ErrorKind::InterpreterFailure => "interpreter_failure",
            ErrorKind::EngineDisabled => "engine_disabled",
            ErrorKind::CacheCorruption => "cache_corruption",
            ErrorKind::InvalidConfig => "invalid_config",
            ErrorKind::Timeout => "timeout",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A per-file error recorded on a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&AnalysisError> for ResultError {
    fn from(err: &AnalysisError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl From<AnalysisError> for ResultError {
    fn from(err: AnalysisError) -> Self {
        ResultError::from(&err)
    }
}
