//! Telling the caller whether this run discovered a new version
//!
//! A version counts as new when its manifest directory did not exist before
//! the run. The result is a plain value: the caller decides whether to print
//! it, hand it to a CI step through an env file, or drop it in a sentinel file.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use tracing::debug;

use crate::errors::ReportError;
use crate::layout::OutputLayout;

/// Env value exported when no new version was found
pub const NO_NEW_VERSION: &str = "0";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewVersion {
    version: Option<String>,
}

impl NewVersion {
    pub fn none() -> Self {
        NewVersion { version: None }
    }

    pub fn found(version: impl Into<String>) -> Self {
        NewVersion {
            version: Some(version.into()),
        }
    }

    /// Must be called before the layout directory is created
    pub fn detect(layout: &OutputLayout, full_version: &str) -> Self {
        if layout.exists() {
            debug!("{} already generated", layout.manifest_dir().display());
            Self::none()
        } else {
            Self::found(full_version)
        }
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn is_new(&self) -> bool {
        self.version.is_some()
    }

    /// Write the version and a newline, or nothing
    pub fn print_to(&self, out: &mut impl Write) -> io::Result<()> {
        match &self.version {
            Some(version) => writeln!(out, "{}", version),
            None => Ok(()),
        }
    }

    /// `(name, value)` pair for an environment export; the value is the
    /// version or `"0"`
    pub fn env_pair(&self, name: &str) -> (String, String) {
        (
            name.to_string(),
            self.version
                .clone()
                .unwrap_or_else(|| NO_NEW_VERSION.to_string()),
        )
    }

    /// Append `NAME=value` to an env file such as the one `$GITHUB_ENV`
    /// points at
    pub fn export_env(&self, name: &str, env_file: &Path) -> Result<(), ReportError> {
        let (name, value) = self.env_pair(name);
        let to_report_error = |source: io::Error| ReportError {
            path: env_file.to_path_buf(),
            source,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(env_file)
            .map_err(to_report_error)?;
        writeln!(file, "{}={}", name, value).map_err(to_report_error)?;

        debug!("Exported {}={} to {}", name, value, env_file.display());
        Ok(())
    }

    /// Replace the sentinel file: any previous one is removed, and a new one
    /// holding the version is written only when there is a new version.
    pub fn write_sentinel(&self, path: &Path) -> Result<(), ReportError> {
        let to_report_error = |source: io::Error| ReportError {
            path: path.to_path_buf(),
            source,
        };

        match fs::remove_file(path) {
            Ok(()) => debug!("Removed previous sentinel {}", path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(to_report_error(e)),
        }

        if let Some(version) = &self.version {
            fs::write(path, version).map_err(to_report_error)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_print() {
        let mut out = Vec::new();
        assert!(NewVersion::found("8.3.14").print_to(&mut out).is_ok());
        assert_eq!(out, b"8.3.14\n");

        let mut out = Vec::new();
        assert!(NewVersion::none().print_to(&mut out).is_ok());
        assert!(out.is_empty());
    }

    #[test]
    fn test_env_pair_sentinel_value() {
        assert_eq!(
            NewVersion::none().env_pair("PHP_WINGET_NEW_VERSION"),
            ("PHP_WINGET_NEW_VERSION".to_string(), "0".to_string())
        );
        assert_eq!(NewVersion::found("8.4.1").env_pair("X").1, "8.4.1");
    }

    #[test]
    fn test_export_env_appends() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let env_file = temp_dir.path().join("github_env");
        assert!(fs::write(&env_file, "EXISTING=1\n").is_ok());

        assert!(NewVersion::found("8.3.14")
            .export_env("PHP_WINGET_NEW_VERSION", &env_file)
            .is_ok());
        assert_eq!(
            fs::read_to_string(&env_file).unwrap_or_default(),
            "EXISTING=1\nPHP_WINGET_NEW_VERSION=8.3.14\n"
        );
    }

    #[test]
    fn test_sentinel_replaced_and_removed() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let sentinel = temp_dir.path().join(".new-version");
        assert!(fs::write(&sentinel, "8.3.13-and-some-longer-stale-content").is_ok());

        assert!(NewVersion::found("8.3.14").write_sentinel(&sentinel).is_ok());
        assert_eq!(fs::read_to_string(&sentinel).unwrap_or_default(), "8.3.14");

        assert!(NewVersion::none().write_sentinel(&sentinel).is_ok());
        assert!(!sentinel.exists());

        // nothing to remove and nothing to write
        assert!(NewVersion::none().write_sentinel(&sentinel).is_ok());
    }

    #[test]
    fn test_detect_uses_existing_directory() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let Ok(query) = crate::ReleaseQuery::parse("8.3", None) else {
            return;
        };
        let layout = OutputLayout::new(temp_dir.path(), temp_dir.path(), &query, "8.3.14");

        assert_eq!(NewVersion::detect(&layout, "8.3.14").version(), Some("8.3.14"));
        assert!(layout.ensure().is_ok());
        assert!(!NewVersion::detect(&layout, "8.3.14").is_new());
    }
}
