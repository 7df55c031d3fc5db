//! Where rendered files land on disk

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::errors::DirectoryError;
use crate::query::{ReleaseQuery, ThreadSafety};

/// Version-scoped manifest directory plus the fixed auxiliary directory.
///
/// The manifest directory mirrors the winget-pkgs tree for the package
/// identifier: `<root>/[NTS/]<major>/<minor>/<full version>/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    manifest_dir: PathBuf,
    aux_dir: PathBuf,
}

impl OutputLayout {
    pub fn new(output_root: &Path, aux_dir: &Path, query: &ReleaseQuery, full_version: &str) -> Self {
        let mut manifest_dir = output_root.to_path_buf();
        if query.thread_safety() == ThreadSafety::Nts {
            manifest_dir.push("NTS");
        }
        manifest_dir.push(query.major().to_string());
        manifest_dir.push(query.minor().to_string());
        manifest_dir.push(full_version);

        OutputLayout {
            manifest_dir,
            aux_dir: aux_dir.to_path_buf(),
        }
    }

    pub fn manifest_dir(&self) -> &Path {
        &self.manifest_dir
    }

    pub fn aux_dir(&self) -> &Path {
        &self.aux_dir
    }

    pub fn exists(&self) -> bool {
        self.manifest_dir.is_dir()
    }

    /// Create both directories. Already existing directories are fine.
    pub fn ensure(&self) -> Result<(), DirectoryError> {
        for dir in [&self.manifest_dir, &self.aux_dir] {
            debug!("Ensuring directory {}", dir.display());
            fs::create_dir_all(dir).map_err(|source| DirectoryError {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }
}
