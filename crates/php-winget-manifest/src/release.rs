//! Extracted release metadata

use chrono::NaiveDate;

use crate::errors::ParseError;
use crate::query::Arch;

/// One downloadable archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactInfo {
    url: String,
    sha256: String,
}

impl ArtifactInfo {
    /// Validate and normalize an artifact. The digest is lowercased; the URL
    /// must be absolute HTTPS.
    pub fn new(arch: Arch, url: &str, sha256: &str) -> Result<Self, ParseError> {
        if !url.starts_with("https://") {
            return Err(ParseError::new(
                arch.as_str(),
                format!("download URL '{}' is not an https:// URL", url),
            ));
        }

        let sha256 = sha256.trim().to_ascii_lowercase();
        if sha256.len() != 64 || !sha256.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ParseError::new(
                arch.as_str(),
                format!("'{}' is not a SHA-256 digest", sha256),
            ));
        }

        Ok(ArtifactInfo {
            url: url.to_string(),
            sha256,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn sha256(&self) -> &str {
        &self.sha256
    }
}

/// Everything the renderer needs to know about one release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInfo {
    pub full_version: String,
    pub release_date: NaiveDate,
    pub x86: ArtifactInfo,
    pub x64: ArtifactInfo,
}

impl ReleaseInfo {
    pub fn artifact(&self, arch: Arch) -> &ArtifactInfo {
        match arch {
            Arch::X86 => &self.x86,
            Arch::X64 => &self.x64,
        }
    }

    /// Release date as `YYYY-MM-DD`
    pub fn release_date_string(&self) -> String {
        self.release_date.format("%Y-%m-%d").to_string()
    }
}

/// Join an index-relative artifact path onto the download base
pub(crate) fn resolve_download_url(base: &str, path: &str) -> String {
    if path.starts_with("https://") || path.starts_with("http://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// The full version must belong to the requested release line and be usable
/// as a single directory name
pub(crate) fn check_full_version(line: &str, full_version: &str) -> Result<(), ParseError> {
    let full_version = full_version.trim();
    let belongs = full_version
        .strip_prefix(line)
        .and_then(|rest| rest.strip_prefix('.'))
        .is_some_and(|patch| {
            patch.starts_with(|c: char| c.is_ascii_digit())
                && !patch.contains("..")
                && patch
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
        });

    if belongs {
        Ok(())
    } else {
        Err(ParseError::new(
            "full version",
            format!("'{}' does not belong to release line {}", full_version, line),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIGEST: &str = "2388d029df97d563b0c8bb1163e176bce2a5c67c3a9ad4bf330e209f32cfdec9";

    #[test]
    fn test_digest_is_lowercased() {
        let artifact = ArtifactInfo::new(
            Arch::X64,
            "https://windows.php.net/downloads/releases/php-8.3.14-Win32-vs16-x64.zip",
            &DIGEST.to_ascii_uppercase(),
        );
        assert!(artifact.is_ok_and(|a| a.sha256() == DIGEST));
    }

    #[test]
    fn test_rejects_short_digest_and_plain_http() {
        let short = ArtifactInfo::new(Arch::X86, "https://example.test/a.zip", "abc123");
        assert!(short.is_err_and(|e| e.field == "x86"));

        let http = ArtifactInfo::new(Arch::X64, "http://example.test/a.zip", DIGEST);
        assert!(http.is_err_and(|e| e.field == "x64"));
    }

    #[test]
    fn test_resolve_download_url() {
        let base = "https://windows.php.net/downloads/releases/";
        assert_eq!(
            resolve_download_url(base, "php-8.3.14-Win32-vs16-x64.zip"),
            "https://windows.php.net/downloads/releases/php-8.3.14-Win32-vs16-x64.zip"
        );
        assert_eq!(
            resolve_download_url("https://windows.php.net/downloads/releases", "/archives/x.zip"),
            "https://windows.php.net/downloads/releases/archives/x.zip"
        );
    }

    #[test]
    fn test_full_version_must_match_line() {
        assert!(check_full_version("8.3", "8.3.14").is_ok());
        assert!(check_full_version("8.3", "8.3.0RC1").is_ok());
        assert!(check_full_version("8.3", "8.31.0").is_err());
        assert!(check_full_version("8.3", "8.2.9").is_err());
        assert!(check_full_version("8.3", "8.3").is_err());
    }

    #[test]
    fn test_full_version_is_a_safe_path_component() {
        assert!(check_full_version("8.3", "8.3.0-dev").is_ok());
        for hostile in ["8.3.1/../../x", "8.3.1\\..\\x", "8.3.1..", "8.3.1 x", "8.3.1/x"] {
            assert!(
                check_full_version("8.3", hostile).is_err_and(|e| e.field == "full version"),
                "{hostile:?} should be rejected"
            );
        }
    }
}
