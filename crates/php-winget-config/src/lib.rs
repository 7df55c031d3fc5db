//! Configuration for the php-winget manifest generator
//!
//! Settings live in an optional `php-winget.toml`. Every key is optional;
//! anything left unset falls back to the defaults below, which match the
//! layout of the winget-pkgs repository and the windows.php.net release index.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable that points at an explicit config file
pub const CONFIG_ENV_VAR: &str = "PHP_WINGET_CONFIG";

/// Config file looked up in the working directory when no override is given
pub const CONFIG_FILE_NAME: &str = "php-winget.toml";

pub const DEFAULT_INDEX_URL: &str = "https://windows.php.net/downloads/releases/releases.json";
pub const DEFAULT_DOWNLOAD_BASE: &str = "https://windows.php.net/downloads/releases/";
pub const DEFAULT_TOOLSETS: &[&str] = &["vc15", "vs16", "vs17"];
pub const DEFAULT_TEMPLATE_DIR: &str = "templates";
pub const DEFAULT_OUTPUT_ROOT: &str = "manifests/p/PHP/PHP";
pub const DEFAULT_AUX_DIR: &str = ".";
pub const DEFAULT_SENTINEL_PATH: &str = ".new-version";
pub const DEFAULT_ENV_VAR: &str = "PHP_WINGET_NEW_VERSION";
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_MAX_REDIRECTS: usize = 2;
pub const DEFAULT_USER_AGENT: &str = concat!("php-winget/", env!("CARGO_PKG_VERSION"));

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid config value for '{key}': {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub index_url: Option<String>,
    pub download_base: Option<String>,
    pub toolsets: Option<Vec<String>>,
    pub template_dir: Option<PathBuf>,
    pub output_root: Option<PathBuf>,
    pub aux_dir: Option<PathBuf>,
    pub sentinel_path: Option<PathBuf>,
    pub env_var: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_redirects: Option<usize>,
    pub user_agent: Option<String>,
}

impl Config {
    /// Resolve which config file to use.
    ///
    /// An explicit path wins, then `PHP_WINGET_CONFIG`, then
    /// `./php-winget.toml`. Returns `None` when nothing applies.
    pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }

        if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR) {
            let trimmed = env_path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }

        let local = PathBuf::from(CONFIG_FILE_NAME);
        local.is_file().then_some(local)
    }

    /// Load the config from the resolved location, or defaults if none exists.
    ///
    /// An explicitly requested file that does not exist is an error; the
    /// implicit `./php-winget.toml` is simply skipped when absent.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match Self::locate(explicit) {
            Some(path) => Self::load_from(&path),
            None => Ok(Config::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("index_url", self.index_url.as_deref()),
            ("download_base", self.download_base.as_deref()),
        ] {
            if let Some(url) = value {
                if !url.starts_with("https://") {
                    return Err(ConfigError::Invalid {
                        key,
                        reason: format!("'{}' is not an https:// URL", url),
                    });
                }
            }
        }

        if let Some(toolsets) = &self.toolsets {
            if toolsets.iter().all(|t| t.trim().is_empty()) {
                return Err(ConfigError::Invalid {
                    key: "toolsets",
                    reason: "at least one toolset tag is required".to_string(),
                });
            }
        }

        if self.timeout_secs == Some(0) {
            return Err(ConfigError::Invalid {
                key: "timeout_secs",
                reason: "timeout must be greater than zero".to_string(),
            });
        }

        Ok(())
    }

    pub fn index_url(&self) -> &str {
        self.index_url.as_deref().unwrap_or(DEFAULT_INDEX_URL)
    }

    /// Base URL that relative artifact paths are joined onto, always with a
    /// trailing slash.
    pub fn download_base(&self) -> String {
        let base = self.download_base.as_deref().unwrap_or(DEFAULT_DOWNLOAD_BASE);
        if base.ends_with('/') {
            base.to_string()
        } else {
            format!("{}/", base)
        }
    }

    pub fn toolsets(&self) -> Vec<String> {
        match &self.toolsets {
            Some(toolsets) => toolsets
                .iter()
                .map(|t| t.trim().to_ascii_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
            None => DEFAULT_TOOLSETS.iter().map(|t| (*t).to_string()).collect(),
        }
    }

    pub fn template_dir(&self) -> PathBuf {
        self.template_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TEMPLATE_DIR))
    }

    pub fn output_root(&self) -> PathBuf {
        self.output_root
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_ROOT))
    }

    pub fn aux_dir(&self) -> PathBuf {
        self.aux_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_AUX_DIR))
    }

    pub fn sentinel_path(&self) -> PathBuf {
        self.sentinel_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SENTINEL_PATH))
    }

    pub fn env_var(&self) -> &str {
        self.env_var.as_deref().unwrap_or(DEFAULT_ENV_VAR)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    pub fn max_redirects(&self) -> usize {
        self.max_redirects.unwrap_or(DEFAULT_MAX_REDIRECTS)
    }

    pub fn user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }

    /// Effective key/value pairs, defaults included, for display and logging
    pub fn values_iter(&self) -> Vec<(&'static str, String)> {
        vec![
            ("index-url", self.index_url().to_string()),
            ("download-base", self.download_base()),
            ("toolsets", self.toolsets().join(",")),
            ("template-dir", self.template_dir().display().to_string()),
            ("output-root", self.output_root().display().to_string()),
            ("aux-dir", self.aux_dir().display().to_string()),
            ("sentinel-path", self.sentinel_path().display().to_string()),
            ("env-var", self.env_var().to_string()),
            ("timeout-secs", self.timeout().as_secs().to_string()),
            ("max-redirects", self.max_redirects().to_string()),
            ("user-agent", self.user_agent().to_string()),
        ]
    }
}
