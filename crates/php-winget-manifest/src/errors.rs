//! Error types for every stage of the manifest pipeline
//!
//! Each stage has its own error; `GenerateError` wraps them for callers that
//! drive the whole pipeline and need a process exit code.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Exit code used for malformed release lines
pub const EXIT_BAD_VERSION: i32 = 2;

/// Exit code used for an unknown thread-safety token
pub const EXIT_BAD_VARIANT: i32 = 1;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("PHP Version must match N.N format, got '{0}'")]
    VersionFormat(String),

    #[error("Thread-safety variant must be 'ts' or 'nts', got '{0}'")]
    Variant(String),
}

impl ArgumentError {
    pub fn exit_code(&self) -> i32 {
        match self {
            ArgumentError::VersionFormat(_) => EXIT_BAD_VERSION,
            ArgumentError::Variant(_) => EXIT_BAD_VARIANT,
        }
    }
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Request to {url} failed: {source}")]
    Request { url: String, source: reqwest::Error },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("{0} returned no content")]
    Empty(String),

    #[error("Failed to read {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
}

/// A required field could not be located in the release index
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unable to parse {field}: {reason}")]
pub struct ParseError {
    pub field: String,
    pub reason: String,
}

impl ParseError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ParseError {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn missing(field: impl Into<String>) -> Self {
        Self::new(field, "not found in release index")
    }
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to read template {}: {source}", path.display())]
    Template { path: PathBuf, source: io::Error },

    #[error("Placeholder {placeholder} has no value")]
    EmptyValue { placeholder: String },

    #[error("Placeholder {placeholder} left unresolved in {template}")]
    Unresolved {
        template: String,
        placeholder: String,
    },
}

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("Unable to write to file {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("Unable to write to file: {}", path.display())]
    Missing { path: PathBuf },
}

#[derive(Error, Debug)]
#[error("Directory \"{}\" was not created: {source}", path.display())]
pub struct DirectoryError {
    pub path: PathBuf,
    pub source: io::Error,
}

#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("Failed to download {arch} artifact: {source}")]
    Download {
        arch: &'static str,
        source: FetchError,
    },

    #[error("Downloaded {arch} artifact suspiciously small ({size} bytes), giving up")]
    TooSmall { arch: &'static str, size: usize },

    #[error("{arch} artifact hash mismatch: index says {expected}, download is {actual}")]
    Mismatch {
        arch: &'static str,
        expected: String,
        actual: String,
    },
}

#[derive(Error, Debug)]
#[error("Failed to update {}: {source}", path.display())]
pub struct ReportError {
    pub path: PathBuf,
    pub source: io::Error,
}

/// Any failure of a full pipeline run
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error(transparent)]
    Argument(#[from] ArgumentError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    Verify(#[from] VerifyError),

    #[error(transparent)]
    Report(#[from] ReportError),
}

impl GenerateError {
    /// Explicit exit code for this failure, if it carries one.
    /// Callers fall back to 255 otherwise.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            GenerateError::Argument(e) => Some(e.exit_code()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, GenerateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_names_field() {
        let err = ParseError::missing("x64");
        assert_eq!(err.field, "x64");
        assert_eq!(
            err.to_string(),
            "Unable to parse x64: not found in release index"
        );
    }

    #[test]
    fn test_exit_codes() {
        let bad_version = GenerateError::from(ArgumentError::VersionFormat("8".to_string()));
        assert_eq!(bad_version.exit_code(), Some(2));

        let bad_variant = GenerateError::from(ArgumentError::Variant("zts".to_string()));
        assert_eq!(bad_variant.exit_code(), Some(1));

        let parse = GenerateError::from(ParseError::missing("release date"));
        assert_eq!(parse.exit_code(), None);
    }
}
