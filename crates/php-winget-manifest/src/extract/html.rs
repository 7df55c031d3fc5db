use chrono::NaiveDate;
use regex::Regex;

use super::{ExtractOptions, IndexParser};
use crate::errors::ParseError;
use crate::query::{Arch, ReleaseQuery, ThreadSafety};
use crate::release::{check_full_version, resolve_download_url, ArtifactInfo, ReleaseInfo};

/// Scraper for the windows.php.net download page.
///
/// The page has one `<h3>` heading per release line, an `<h4>` heading per
/// build carrying the build time, and a `Zip` link per build followed by its
/// `sha256:` digest.
pub struct HtmlPageParser;

fn compile(field: &str, pattern: &str) -> Result<Regex, ParseError> {
    Regex::new(pattern).map_err(|e| ParseError::new(field, format!("bad pattern: {}", e)))
}

impl HtmlPageParser {
    fn full_version(document: &str, line: &str) -> Result<String, ParseError> {
        let pattern = format!(
            r#"(?s)<h3 id="php-{line}"[^>]*>\s*PHP {line} \((?P<version>[^)<]+)\)\s*</h3>"#
        );
        let version = compile("version", &pattern)?
            .captures(document)
            .and_then(|caps| caps.name("version"))
            .map(|m| m.as_str().trim().to_string())
            .ok_or_else(|| {
                ParseError::new("version", format!("{} not found on download page", line))
            })?;
        Ok(version)
    }

    /// Build time of the first build heading of the release line
    fn release_date(document: &str, line: &str) -> Result<NaiveDate, ParseError> {
        let pattern = format!(
            r#"<h4 id="php-{line}-[^"]*"[^>]*>[^<]*?\((?P<date>20[0-9]{{2}}-[A-Za-z]{{3}}-[0-9]{{2}})[^)]*\)\s*</h4>"#
        );
        let raw = compile("release date", &pattern)?
            .captures(document)
            .and_then(|caps| caps.name("date"))
            .ok_or_else(|| ParseError::missing("release date"))?;

        NaiveDate::parse_from_str(raw.as_str(), "%Y-%b-%d").map_err(|e| {
            ParseError::new("release date", format!("'{}': {}", raw.as_str(), e))
        })
    }

    fn artifact(
        document: &str,
        line: &str,
        thread_safety: ThreadSafety,
        arch: Arch,
        options: &ExtractOptions,
    ) -> Result<ArtifactInfo, ParseError> {
        let toolsets = options
            .toolsets
            .iter()
            .map(|t| regex::escape(t))
            .collect::<Vec<_>>()
            .join("|");
        let variant = match thread_safety {
            ThreadSafety::Ts => "",
            ThreadSafety::Nts => "nts-",
        };
        let pattern = format!(
            r#"(?s)<a href="/downloads/releases/(?P<file>php-{line}\.[0-9]+-{variant}Win32-(?i:{toolsets})-{arch}\.zip)">Zip</a>.*?<span class="md5sum">sha256:\s*(?P<sha256>[0-9A-Fa-f]{{64}})</span>"#,
            arch = arch.as_str(),
        );

        let caps = compile(arch.as_str(), &pattern)?
            .captures(document)
            .ok_or_else(|| {
                ParseError::new(
                    arch.as_str(),
                    format!("no {} zip and sha256 on download page", thread_safety),
                )
            })?;
        let (Some(file), Some(sha256)) = (caps.name("file"), caps.name("sha256")) else {
            return Err(ParseError::missing(arch.as_str()));
        };

        ArtifactInfo::new(
            arch,
            &resolve_download_url(&options.download_base, file.as_str()),
            sha256.as_str(),
        )
    }
}

impl IndexParser for HtmlPageParser {
    fn name(&self) -> &'static str {
        "html"
    }

    fn supports(&self, document: &str) -> bool {
        let head = document.chars().take(4096).collect::<String>().to_ascii_lowercase();
        head.contains("<html") || head.contains("<!doctype html") || document.contains("<h3")
    }

    fn extract(
        &self,
        document: &str,
        query: &ReleaseQuery,
        options: &ExtractOptions,
    ) -> Result<ReleaseInfo, ParseError> {
        let line = regex::escape(query.version());

        let full_version = Self::full_version(document, &line)?;
        check_full_version(query.version(), &full_version)?;
        let release_date = Self::release_date(document, &line)?;
        let x64 = Self::artifact(document, &line, query.thread_safety(), Arch::X64, options)?;
        let x86 = Self::artifact(document, &line, query.thread_safety(), Arch::X86, options)?;

        Ok(ReleaseInfo {
            full_version,
            release_date,
            x86,
            x64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = include_str!("../../tests/fixtures/windows-download.html");

    fn query(version: &str, variant: Option<&str>) -> ReleaseQuery {
        match ReleaseQuery::parse(version, variant) {
            Ok(q) => q,
            Err(e) => panic!("bad test query: {e}"),
        }
    }

    #[test]
    fn test_extracts_release_from_download_page() {
        let info = HtmlPageParser.extract(FIXTURE, &query("8.3", None), &ExtractOptions::default());
        let Ok(info) = info else {
            panic!("extraction failed: {:?}", info.err());
        };
        assert_eq!(info.full_version, "8.3.14");
        assert_eq!(info.release_date_string(), "2024-11-21");
        assert_eq!(
            info.x64.url(),
            "https://windows.php.net/downloads/releases/php-8.3.14-Win32-vs16-x64.zip"
        );
        assert_eq!(
            info.x64.sha256(),
            "2388d029df97d563b0c8bb1163e176bce2a5c67c3a9ad4bf330e209f32cfdec9"
        );
        assert_eq!(
            info.x86.url(),
            "https://windows.php.net/downloads/releases/php-8.3.14-Win32-vs16-x86.zip"
        );
        assert_eq!(
            info.x86.sha256(),
            "38ce9aee28e87707b45824a4eae5d5fdf58f2f3533221701a13ace58c10fda82"
        );
    }

    #[test]
    fn test_nts_links_selected() {
        let info = HtmlPageParser.extract(FIXTURE, &query("8.3", Some("nts")), &ExtractOptions::default());
        assert!(info.is_ok_and(|i| i.x64.url().ends_with("php-8.3.14-nts-Win32-vs16-x64.zip")
            && i.x86.sha256() == "872256ac7ad378a8b8d0727ff1f29663cc4dc41c5a4e4766c9ee747ab931c0bf"));
    }

    #[test]
    fn test_uppercase_toolset_tag_on_older_line() {
        let info = HtmlPageParser.extract(FIXTURE, &query("7.4", None), &ExtractOptions::default());
        let Ok(info) = info else {
            panic!("extraction failed: {:?}", info.err());
        };
        assert_eq!(info.full_version, "7.4.33");
        assert_eq!(info.release_date_string(), "2022-11-03");
        assert!(info.x86.url().ends_with("php-7.4.33-Win32-vc15-x86.zip"));
    }

    #[test]
    fn test_missing_line() {
        let result = HtmlPageParser.extract(FIXTURE, &query("8.1", None), &ExtractOptions::default());
        assert!(result.is_err_and(|e| e.field == "version"));
    }

    #[test]
    fn test_missing_x64_zip_names_architecture() {
        let document = FIXTURE.replace("php-8.3.14-Win32-vs16-x64.zip", "php-8.3.14-Win32-vs16-arm64.zip");
        let result = HtmlPageParser.extract(&document, &query("8.3", None), &ExtractOptions::default());
        assert!(result.is_err_and(|e| e.field == "x64"));
    }

    #[test]
    fn test_dots_in_line_are_literal() {
        // "8x3" must not satisfy the pattern built for "8.3"
        let document = FIXTURE.replace("php-8.3", "php-8x3").replace("PHP 8.3", "PHP 8x3");
        let result = HtmlPageParser.extract(&document, &query("8.3", None), &ExtractOptions::default());
        assert!(result.is_err_and(|e| e.field == "version"));
    }
}
