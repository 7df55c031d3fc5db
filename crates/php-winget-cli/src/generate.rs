//! The `generate` command: settle settings, run the pipeline, report the
//! new version to whoever asked for it

use clap::Args;
use php_winget_config::Config;
use php_winget_manifest::{
    build_client, ArtifactVerifier, DocumentSource, ExtractOptions, FileSource, GenerateError,
    GenerateOutcome, Generator, GeneratorSettings, HttpOptions, HttpSource, NewVersion,
    ReleaseQuery,
};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::debug;

use crate::errors::CliError;
use crate::logger;

#[derive(Args, Debug, Clone, Default)]
pub struct GenerateOpts {
    /// Configuration file (default: $PHP_WINGET_CONFIG, then ./php-winget.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Read the release index from a saved file instead of downloading it
    #[arg(long, value_name = "PATH", conflicts_with = "index_url")]
    pub index_file: Option<PathBuf>,

    /// Release index URL (JSON index or the downloads page)
    #[arg(long, value_name = "URL")]
    pub index_url: Option<String>,

    /// Directory holding the manifest templates
    #[arg(long, value_name = "DIR")]
    pub templates: Option<PathBuf>,

    /// Root of the manifest tree
    #[arg(long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Directory for the commit message and PR description
    #[arg(long, value_name = "DIR")]
    pub aux_dir: Option<PathBuf>,

    /// Print the full version on stdout when it was not generated before
    #[arg(long)]
    pub print_new_version: bool,

    /// Append NAME=<version|0> to this env file
    #[arg(long, value_name = "PATH", env = "GITHUB_ENV", hide_env_values = true)]
    pub env_file: Option<PathBuf>,

    /// Write the new version to a sentinel file, removed when there is none
    #[arg(
        long,
        value_name = "PATH",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = ""
    )]
    pub sentinel: Option<PathBuf>,

    /// Download both zips and check them against the published SHA-256
    #[arg(long)]
    pub verify_hashes: bool,
}

impl GenerateOpts {
    /// Command-line values take precedence over the config file
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(url) = &self.index_url {
            config.index_url = Some(url.clone());
        }
        if let Some(dir) = &self.templates {
            config.template_dir = Some(dir.clone());
        }
        if let Some(dir) = &self.output {
            config.output_root = Some(dir.clone());
        }
        if let Some(dir) = &self.aux_dir {
            config.aux_dir = Some(dir.clone());
        }
    }

    /// `--sentinel` without a value falls back to the configured path
    pub fn sentinel_path(&self, config: &Config) -> Option<PathBuf> {
        self.sentinel.as_ref().map(|path| {
            if path.as_os_str().is_empty() {
                config.sentinel_path()
            } else {
                path.clone()
            }
        })
    }

    /// An empty `$GITHUB_ENV` counts as unset
    pub fn env_file(&self) -> Option<&PathBuf> {
        self.env_file
            .as_ref()
            .filter(|path| !path.as_os_str().is_empty())
    }
}

pub fn settings_from(config: &Config) -> GeneratorSettings {
    GeneratorSettings {
        template_dir: config.template_dir(),
        output_root: config.output_root(),
        aux_dir: config.aux_dir(),
        extract: ExtractOptions {
            toolsets: config.toolsets(),
            download_base: config.download_base(),
        },
    }
}

fn http_options(config: &Config) -> HttpOptions {
    HttpOptions {
        timeout: config.timeout(),
        max_redirects: config.max_redirects(),
        user_agent: config.user_agent().to_string(),
    }
}

fn build_generator(config: &Config, opts: &GenerateOpts) -> Result<Generator, GenerateError> {
    let http = http_options(config);

    let source: Box<dyn DocumentSource> = match &opts.index_file {
        Some(path) => Box::new(FileSource::new(path.clone())),
        None => Box::new(HttpSource::new(config.index_url(), &http)?),
    };
    let generator = Generator::new(source, settings_from(config));

    if opts.verify_hashes {
        let verifier = ArtifactVerifier::new(build_client(&http)?);
        Ok(generator.with_verifier(verifier))
    } else {
        Ok(generator)
    }
}

/// Run the pipeline for an already validated query and publish the result
pub fn handle_generate(query: &ReleaseQuery, opts: &GenerateOpts) -> Result<NewVersion, CliError> {
    let mut config = Config::load(opts.config.as_deref())?;
    opts.apply_to(&mut config);
    for (key, value) in config.values_iter() {
        debug!("{} = {}", key, value);
    }

    let generator = build_generator(&config, opts)?;

    logger::spinner_start(&format!("Generating manifests for {}", query.package_id()));
    let outcome = match generator.run(query) {
        Ok(outcome) => outcome,
        Err(e) => {
            logger::spinner_error(&format!("Failed to generate {}", query.package_id()));
            return Err(e.into());
        }
    };
    logger::spinner_success(&summary(query, &outcome));

    for path in &outcome.written {
        logger::debug(&format!("Wrote {}", path.display()));
    }

    publish(&outcome.new_version, &config, opts)?;
    Ok(outcome.new_version)
}

fn summary(query: &ReleaseQuery, outcome: &GenerateOutcome) -> String {
    let state = if outcome.new_version.is_new() {
        "new version"
    } else {
        "already generated"
    };
    format!(
        "{} {} ({}, released {})",
        query.package_id(),
        outcome.release.full_version,
        state,
        outcome.release.release_date_string()
    )
}

fn publish(new_version: &NewVersion, config: &Config, opts: &GenerateOpts) -> Result<(), CliError> {
    match new_version.version() {
        Some(version) => logger::info(&format!("New version {}", version)),
        None => logger::info("No new version"),
    }

    if opts.print_new_version {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        new_version.print_to(&mut handle)?;
        handle.flush()?;
    }

    if let Some(env_file) = opts.env_file() {
        new_version.export_env(config.env_var(), env_file)?;
        logger::debug(&format!(
            "Exported {} to {}",
            config.env_var(),
            env_file.display()
        ));
    }

    if let Some(sentinel) = opts.sentinel_path(config) {
        new_version.write_sentinel(&sentinel)?;
    }

    Ok(())
}
