//! Errors surfaced by the `generate` binary and their exit codes

use php_winget_config::ConfigError;
use php_winget_manifest::{ArgumentError, GenerateError, ReportError};
use std::io;
use thiserror::Error;

/// Exit code for failures that carry no code of their own
pub const FALLBACK_EXIT_CODE: i32 = 255;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Argument(#[from] ArgumentError),

    #[error(transparent)]
    Generate(#[from] GenerateError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("Failed to write to stdout: {0}")]
    Output(#[from] io::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Argument(e) => e.exit_code(),
            CliError::Generate(e) => e.exit_code().unwrap_or(FALLBACK_EXIT_CODE),
            _ => FALLBACK_EXIT_CODE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use php_winget_manifest::ParseError;

    #[test]
    fn test_argument_exit_codes() {
        let err = CliError::from(ArgumentError::VersionFormat("8.34".to_string()));
        assert_eq!(err.exit_code(), 2);
        assert_eq!(
            err.to_string(),
            "PHP Version must match N.N format, got '8.34'"
        );

        let err = CliError::from(ArgumentError::Variant("zts".to_string()));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_pipeline_failures_fall_back() {
        let err = CliError::from(GenerateError::from(ParseError::missing("x64")));
        assert_eq!(err.exit_code(), FALLBACK_EXIT_CODE);

        let err = CliError::from(io::Error::new(io::ErrorKind::BrokenPipe, "closed"));
        assert_eq!(err.exit_code(), FALLBACK_EXIT_CODE);
    }
}
