use chrono::{DateTime, NaiveDate};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::{ExtractOptions, IndexParser};
use crate::errors::ParseError;
use crate::query::{Arch, ReleaseQuery, ThreadSafety};
use crate::release::{check_full_version, resolve_download_url, ArtifactInfo, ReleaseInfo};

/// Reader for `releases.json`, keyed by release line:
///
/// ```json
/// { "8.3": { "version": "8.3.14",
///            "ts-vs16-x64": { "mtime": "...", "zip": { "path": "...", "sha256": "..." } } } }
/// ```
pub struct JsonIndexParser;

/// A `<ts|nts>-<toolset>-<arch>` key of a release line entry
#[derive(Debug, PartialEq, Eq)]
struct BuildKey<'a> {
    thread_safety: ThreadSafety,
    toolset: &'a str,
    arch: Arch,
}

impl<'a> BuildKey<'a> {
    fn parse(key: &'a str) -> Option<Self> {
        let mut parts = key.split('-');
        let (variant, toolset, arch) = (parts.next()?, parts.next()?, parts.next()?);
        if parts.next().is_some() {
            return None;
        }
        Some(BuildKey {
            thread_safety: variant.parse().ok()?,
            toolset,
            arch: Arch::from_tag(arch)?,
        })
    }
}

struct Candidate<'a> {
    key: &'a str,
    arch: Arch,
    build: &'a Map<String, Value>,
}

impl IndexParser for JsonIndexParser {
    fn name(&self) -> &'static str {
        "json"
    }

    fn supports(&self, document: &str) -> bool {
        document.trim_start().starts_with('{')
    }

    fn extract(
        &self,
        document: &str,
        query: &ReleaseQuery,
        options: &ExtractOptions,
    ) -> Result<ReleaseInfo, ParseError> {
        let root: Value = serde_json::from_str(document)
            .map_err(|e| ParseError::new("release index", e.to_string()))?;

        let line = root
            .get(query.version())
            .and_then(Value::as_object)
            .ok_or_else(|| {
                ParseError::new("version", format!("{} not found in release index", query.version()))
            })?;

        let full_version = line
            .get("version")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ParseError::missing("full version"))?;
        check_full_version(query.version(), full_version)?;

        let candidates: Vec<Candidate<'_>> = line
            .iter()
            .filter_map(|(key, value)| {
                let build = BuildKey::parse(key)?;
                if build.thread_safety != query.thread_safety()
                    || !options.accepts_toolset(build.toolset)
                {
                    return None;
                }
                Some(Candidate {
                    key: key.as_str(),
                    arch: build.arch,
                    build: value.as_object()?,
                })
            })
            .collect();
        debug!(
            "{} {} build entries match for {}",
            candidates.len(),
            query.thread_safety(),
            query.version()
        );

        let x64 = artifact_for(Arch::X64, &candidates, query, options)?;
        let x86 = artifact_for(Arch::X86, &candidates, query, options)?;
        let release_date = latest_mtime(&candidates).ok_or_else(|| ParseError::missing("release date"))?;

        Ok(ReleaseInfo {
            full_version: full_version.to_string(),
            release_date,
            x86,
            x64,
        })
    }
}

fn artifact_for(
    arch: Arch,
    candidates: &[Candidate<'_>],
    query: &ReleaseQuery,
    options: &ExtractOptions,
) -> Result<ArtifactInfo, ParseError> {
    let candidate = candidates.iter().find(|c| c.arch == arch).ok_or_else(|| {
        ParseError::new(
            arch.as_str(),
            format!(
                "no {} build with toolset {} in release index",
                query.thread_safety(),
                options.toolsets.join("/")
            ),
        )
    })?;

    let zip = candidate.build.get("zip").and_then(Value::as_object);
    let path = zip
        .and_then(|z| z.get("path"))
        .and_then(Value::as_str)
        .ok_or_else(|| ParseError::new(arch.as_str(), format!("{} has no zip path", candidate.key)))?;
    let sha256 = zip
        .and_then(|z| z.get("sha256"))
        .and_then(Value::as_str)
        .ok_or_else(|| ParseError::new(arch.as_str(), format!("{} has no sha256", candidate.key)))?;

    ArtifactInfo::new(arch, &resolve_download_url(&options.download_base, path), sha256)
}

/// Most recent build timestamp, as a calendar date in the timestamp's own
/// offset. The first entry wins when timestamps are equal.
fn latest_mtime(candidates: &[Candidate<'_>]) -> Option<NaiveDate> {
    let mut latest: Option<DateTime<chrono::FixedOffset>> = None;

    for candidate in candidates {
        let Some(raw) = candidate.build.get("mtime").and_then(Value::as_str) else {
            continue;
        };
        match DateTime::parse_from_rfc3339(raw) {
            Ok(mtime) => {
                if latest.map_or(true, |current| mtime > current) {
                    latest = Some(mtime);
                }
            }
            Err(e) => warn!("Ignoring unparsable mtime '{}' on {}: {}", raw, candidate.key, e),
        }
    }

    latest.map(|mtime| mtime.date_naive())
}
