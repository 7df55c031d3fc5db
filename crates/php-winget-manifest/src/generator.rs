//! The Fetch → Extract → Render → Persist pipeline for one release line

use std::path::PathBuf;
use tracing::{debug, info};

use crate::errors::Result;
use crate::extract::{extract_release, ExtractOptions};
use crate::layout::OutputLayout;
use crate::query::ReleaseQuery;
use crate::release::ReleaseInfo;
use crate::render::{write_rendered, RenderContext, Renderer};
use crate::report::NewVersion;
use crate::source::DocumentSource;
use crate::verify::ArtifactVerifier;

/// Filesystem and extraction settings for a run
#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    pub template_dir: PathBuf,
    pub output_root: PathBuf,
    pub aux_dir: PathBuf,
    pub extract: ExtractOptions,
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct GenerateOutcome {
    pub release: ReleaseInfo,
    pub layout: OutputLayout,
    /// Every file written, in template order
    pub written: Vec<PathBuf>,
    pub new_version: NewVersion,
}

pub struct Generator {
    source: Box<dyn DocumentSource>,
    settings: GeneratorSettings,
    verifier: Option<ArtifactVerifier>,
}

impl Generator {
    pub fn new(source: Box<dyn DocumentSource>, settings: GeneratorSettings) -> Self {
        Generator {
            source,
            settings,
            verifier: None,
        }
    }

    /// Download and hash every artifact before anything is rendered
    pub fn with_verifier(mut self, verifier: ArtifactVerifier) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Fetch and extract only
    pub fn resolve(&self, query: &ReleaseQuery) -> Result<ReleaseInfo> {
        debug!("Reading release index from {}", self.source.describe());
        let document = self.source.fetch()?;
        let release = extract_release(&document, query, &self.settings.extract)?;
        info!(
            "PHP {} resolves to {} released {}",
            query.version(),
            release.full_version,
            release.release_date_string()
        );
        Ok(release)
    }

    /// Run the whole pipeline.
    ///
    /// Everything that can fail without touching the disk (fetch, extract,
    /// verification, template rendering) happens before the output directory
    /// is created, so those failures leave no files behind.
    pub fn run(&self, query: &ReleaseQuery) -> Result<GenerateOutcome> {
        let release = self.resolve(query)?;

        if let Some(verifier) = &self.verifier {
            verifier.verify(&release)?;
        }

        let context = RenderContext::new(query, &release);
        let rendered = Renderer::new(&self.settings.template_dir).render_all(&context)?;

        let layout = OutputLayout::new(
            &self.settings.output_root,
            &self.settings.aux_dir,
            query,
            &release.full_version,
        );
        let new_version = NewVersion::detect(&layout, &release.full_version);
        layout.ensure()?;

        let written = write_rendered(&rendered, &layout, query)?;
        info!(
            "Wrote {} files for {} into {}",
            written.len(),
            query.package_id(),
            layout.manifest_dir().display()
        );

        Ok(GenerateOutcome {
            release,
            layout,
            written,
            new_version,
        })
    }
}
