//! Placeholder substitution into the manifest templates
//!
//! Templates are plain text with `%name%` tokens. Substitution is a literal,
//! single-pass replace: values are never re-scanned, and tokens that are not
//! part of the vocabulary are left exactly as written.

use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::errors::{RenderError, WriteError};
use crate::layout::OutputLayout;
use crate::query::ReleaseQuery;
use crate::release::ReleaseInfo;

/// Placeholders that may legitimately render as an empty string
const OPTIONAL_PLACEHOLDERS: &[&str] = &["%ts-suffix%", "%ts-id%"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateTarget {
    /// Written into the version-scoped manifest directory
    Manifest,
    /// Written into the fixed auxiliary directory, overwriting previous runs
    Auxiliary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateSpec {
    pub file_name: &'static str,
    pub target: TemplateTarget,
}

/// Every template a run renders, in write order
pub const TEMPLATES: &[TemplateSpec] = &[
    TemplateSpec {
        file_name: "PHP.PHP.(variant)(version).installer.yaml",
        target: TemplateTarget::Manifest,
    },
    TemplateSpec {
        file_name: "PHP.PHP.(variant)(version).locale.en-US.yaml",
        target: TemplateTarget::Manifest,
    },
    TemplateSpec {
        file_name: "PHP.PHP.(variant)(version).yaml",
        target: TemplateTarget::Manifest,
    },
    TemplateSpec {
        file_name: "commit-message.txt",
        target: TemplateTarget::Auxiliary,
    },
    TemplateSpec {
        file_name: "pr-description.md",
        target: TemplateTarget::Auxiliary,
    },
];

impl TemplateSpec {
    /// Output file name with the `(variant)` and `(version)` tokens filled in
    pub fn output_name(&self, query: &ReleaseQuery) -> String {
        self.file_name
            .replace("(variant)", query.thread_safety().id_segment())
            .replace("(version)", query.version())
    }

    pub fn output_path(&self, layout: &OutputLayout, query: &ReleaseQuery) -> PathBuf {
        let dir = match self.target {
            TemplateTarget::Manifest => layout.manifest_dir(),
            TemplateTarget::Auxiliary => layout.aux_dir(),
        };
        dir.join(self.output_name(query))
    }
}

/// Placeholder → value, derived from the query and the extracted release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderContext {
    values: Vec<(&'static str, String)>,
}

impl RenderContext {
    pub fn new(query: &ReleaseQuery, release: &ReleaseInfo) -> Self {
        let ts = query.thread_safety();
        let values = vec![
            ("%version%", query.version().to_string()),
            ("%versionmin%", query.version_min()),
            ("%major%", query.major().to_string()),
            ("%minor%", query.minor().to_string()),
            ("%fullversion%", release.full_version.clone()),
            ("%releasedate%", release.release_date_string()),
            ("%url-x64%", release.x64.url().to_string()),
            ("%hash-x64%", release.x64.sha256().to_string()),
            ("%url-x86%", release.x86.url().to_string()),
            ("%hash-x86%", release.x86.sha256().to_string()),
            ("%ts-label%", ts.label().to_string()),
            ("%ts-suffix%", ts.suffix().to_string()),
            ("%ts-id%", ts.id_segment().to_string()),
            ("%package-id%", query.package_id()),
        ];
        RenderContext { values }
    }

    pub fn get(&self, placeholder: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(name, _)| *name == placeholder)
            .map(|(_, value)| value.as_str())
    }

    pub fn placeholders(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.values.iter().map(|(name, _)| *name)
    }

    /// Every required placeholder must have a non-empty value
    pub fn validate(&self) -> Result<(), RenderError> {
        match self
            .values
            .iter()
            .find(|(name, value)| value.trim().is_empty() && !OPTIONAL_PLACEHOLDERS.contains(name))
        {
            Some((name, _)) => Err(RenderError::EmptyValue {
                placeholder: (*name).to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Substitute every known placeholder. Unknown `%tokens%` are returned
    /// alongside the text so callers can report them.
    pub fn render(&self, template: &str) -> (String, Vec<String>) {
        let mut rendered = String::with_capacity(template.len());
        let mut unknown: Vec<String> = Vec::new();
        let mut rest = template;

        while let Some(start) = rest.find('%') {
            rendered.push_str(&rest[..start]);
            let after = &rest[start + 1..];

            let Some(name_len) = token_name_len(after) else {
                rendered.push('%');
                rest = after;
                continue;
            };

            let token = &rest[start..start + name_len + 2];
            match self.get(token) {
                Some(value) => {
                    rendered.push_str(value);
                    rest = &rest[start + name_len + 2..];
                }
                None => {
                    if !unknown.iter().any(|u| u == token) {
                        unknown.push(token.to_string());
                    }
                    // the closing `%` may open the next placeholder
                    rendered.push('%');
                    rest = after;
                }
            }
        }
        rendered.push_str(rest);

        (rendered, unknown)
    }

    /// Fail if any known placeholder survived rendering
    fn check_resolved(&self, template: &str, rendered: &str) -> Result<(), RenderError> {
        match self.placeholders().find(|p| rendered.contains(p)) {
            Some(placeholder) => Err(RenderError::Unresolved {
                template: template.to_string(),
                placeholder: placeholder.to_string(),
            }),
            None => Ok(()),
        }
    }
}

/// Length of the token name if `text` starts with `name%`, where the name
/// starts alphanumeric and continues with alphanumerics, `-` or `_`.
fn token_name_len(text: &str) -> Option<usize> {
    let end = text.find('%')?;
    let name = &text[..end];
    let valid = name.starts_with(|c: char| c.is_ascii_alphanumeric())
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    valid.then_some(end)
}

/// One template rendered in memory, not yet on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    pub spec: TemplateSpec,
    pub contents: String,
}

pub struct Renderer {
    template_dir: PathBuf,
}

impl Renderer {
    pub fn new(template_dir: impl Into<PathBuf>) -> Self {
        Renderer {
            template_dir: template_dir.into(),
        }
    }

    /// Read and render every template. Nothing touches the output tree, so a
    /// missing template or bad value fails the run before any write.
    pub fn render_all(&self, context: &RenderContext) -> Result<Vec<RenderedFile>, RenderError> {
        context.validate()?;

        TEMPLATES
            .iter()
            .map(|spec| {
                let path = self.template_dir.join(spec.file_name);
                let template = fs::read_to_string(&path)
                    .map_err(|source| RenderError::Template { path, source })?;

                let (contents, unknown) = context.render(&template);
                for token in unknown {
                    warn!("Leaving unknown placeholder {} in {}", token, spec.file_name);
                }
                context.check_resolved(spec.file_name, &contents)?;

                Ok(RenderedFile {
                    spec: *spec,
                    contents,
                })
            })
            .collect()
    }
}

/// Write rendered files into the layout and confirm each one landed.
/// The layout directories must already exist.
pub fn write_rendered(
    files: &[RenderedFile],
    layout: &OutputLayout,
    query: &ReleaseQuery,
) -> Result<Vec<PathBuf>, WriteError> {
    let mut written = Vec::with_capacity(files.len());

    for file in files {
        let target = file.spec.output_path(layout, query);
        debug!("Writing {}", target.display());

        fs::write(&target, &file.contents).map_err(|source| WriteError::Io {
            path: target.clone(),
            source,
        })?;

        if !target.is_file() {
            return Err(WriteError::Missing { path: target });
        }
        written.push(target);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Arch;
    use crate::release::ArtifactInfo;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn query(variant: Option<&str>) -> ReleaseQuery {
        match ReleaseQuery::parse("8.3", variant) {
            Ok(q) => q,
            Err(e) => panic!("bad test query: {e}"),
        }
    }

    fn artifact(arch: Arch, name: &str, digit: char) -> ArtifactInfo {
        let url = format!("https://windows.php.net/downloads/releases/{name}");
        match ArtifactInfo::new(arch, &url, &digit.to_string().repeat(64)) {
            Ok(a) => a,
            Err(e) => panic!("bad test artifact: {e}"),
        }
    }

    fn release() -> ReleaseInfo {
        ReleaseInfo {
            full_version: "8.3.14".to_string(),
            release_date: NaiveDate::from_ymd_opt(2024, 11, 21).unwrap_or_default(),
            x86: artifact(Arch::X86, "php-8.3.14-Win32-vs16-x86.zip", 'a'),
            x64: artifact(Arch::X64, "php-8.3.14-Win32-vs16-x64.zip", 'b'),
        }
    }

    #[test]
    fn test_output_names() {
        let installer = TEMPLATES[0];
        assert_eq!(installer.output_name(&query(None)), "PHP.PHP.8.3.installer.yaml");
        assert_eq!(
            installer.output_name(&query(Some("nts"))),
            "PHP.PHP.NTS.8.3.installer.yaml"
        );
        assert_eq!(TEMPLATES[3].output_name(&query(None)), "commit-message.txt");
    }

    #[test]
    fn test_render_replaces_every_known_placeholder() {
        let context = RenderContext::new(&query(None), &release());
        let template: String = context
            .placeholders()
            .map(|p| format!("{p}\n"))
            .collect();

        let (rendered, unknown) = context.render(&template);
        assert!(unknown.is_empty());
        for placeholder in context.placeholders() {
            assert!(!rendered.contains(placeholder), "{placeholder} survived");
        }
        assert!(rendered.contains("8.3.14\n2024-11-21\n"));
        assert!(rendered.contains("PHP.PHP.8.3\n"));
    }

    #[test]
    fn test_render_leaves_other_text_verbatim() {
        let context = RenderContext::new(&query(Some("nts")), &release());
        let template = "Name: PHP %version%%ts-suffix% (100% %unknown% %%)\nId: %package-id%";
        let (rendered, unknown) = context.render(template);
        assert_eq!(
            rendered,
            "Name: PHP 8.3 NTS (100% %unknown% %%)\nId: PHP.PHP.NTS.8.3"
        );
        assert_eq!(unknown, vec!["%unknown%".to_string()]);
    }

    #[test]
    fn test_percent_escape_before_placeholder() {
        let context = RenderContext::new(&query(None), &release());
        let (rendered, unknown) = context.render("q=php%20%fullversion%&v=%version%");
        assert_eq!(rendered, "q=php%208.3.14&v=8.3");
        assert_eq!(unknown, vec!["%20%".to_string()]);
        assert!(context.check_resolved("t", &rendered).is_ok());
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let mut info = release();
        info.full_version = "8.3.14%version%".to_string();
        let context = RenderContext::new(&query(None), &info);
        let (rendered, _) = context.render("%fullversion%");
        assert_eq!(rendered, "8.3.14%version%");
        assert!(matches!(
            context.check_resolved("t", &rendered),
            Err(RenderError::Unresolved { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_empty_required_value() {
        let mut info = release();
        info.full_version = String::new();
        let context = RenderContext::new(&query(None), &info);
        assert!(matches!(
            context.validate(),
            Err(RenderError::EmptyValue { placeholder }) if placeholder == "%fullversion%"
        ));

        // thread-safe builds render an empty suffix, which is fine
        assert!(RenderContext::new(&query(None), &release()).validate().is_ok());
    }

    #[test]
    fn test_render_all_missing_template() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let context = RenderContext::new(&query(None), &release());
        let result = Renderer::new(temp_dir.path()).render_all(&context);
        assert!(matches!(result, Err(RenderError::Template { .. })));
    }

    #[test]
    fn test_render_all_and_write() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let templates = temp_dir.path().join("templates");
        assert!(fs::create_dir_all(&templates).is_ok());
        for spec in TEMPLATES {
            let body = format!("{}: %package-id% %fullversion% %url-x64%\n", spec.file_name);
            assert!(fs::write(templates.join(spec.file_name), body).is_ok());
        }

        let query = query(None);
        let context = RenderContext::new(&query, &release());
        let Ok(files) = Renderer::new(&templates).render_all(&context) else {
            panic!("rendering failed");
        };
        assert_eq!(files.len(), TEMPLATES.len());

        let layout = OutputLayout::new(
            &temp_dir.path().join("out"),
            &temp_dir.path().join("aux"),
            &query,
            "8.3.14",
        );
        assert!(layout.ensure().is_ok());
        let Ok(written) = write_rendered(&files, &layout, &query) else {
            panic!("writing failed");
        };

        assert_eq!(
            written[0],
            temp_dir.path().join("out/8/3/8.3.14/PHP.PHP.8.3.installer.yaml")
        );
        assert_eq!(written[4], temp_dir.path().join("aux/pr-description.md"));
        let installer = fs::read_to_string(&written[0]).unwrap_or_default();
        assert_eq!(
            installer,
            "PHP.PHP.(variant)(version).installer.yaml: PHP.PHP.8.3 8.3.14 https://windows.php.net/downloads/releases/php-8.3.14-Win32-vs16-x64.zip\n"
        );
    }

    #[test]
    fn test_write_into_missing_directory_fails() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let query = query(None);
        let layout = OutputLayout::new(
            &temp_dir.path().join("never-created"),
            temp_dir.path(),
            &query,
            "8.3.14",
        );
        let files = vec![RenderedFile {
            spec: TEMPLATES[0],
            contents: "x".to_string(),
        }];
        assert!(matches!(
            write_rendered(&files, &layout, &query),
            Err(WriteError::Io { .. })
        ));
    }
}
