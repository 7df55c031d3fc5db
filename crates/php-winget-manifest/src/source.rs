//! Where the release index comes from
//!
//! A run reads exactly one document. `HttpSource` fetches it from the
//! upstream host; `FileSource` reads a saved copy for offline regeneration.

use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

use crate::errors::FetchError;

/// Anything that can hand back the release index as text
pub trait DocumentSource {
    /// Human-readable origin, used in log lines and errors
    fn describe(&self) -> String;

    fn fetch(&self) -> Result<String, FetchError>;
}

/// Client settings shared by the index fetch and artifact verification
#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub timeout: Duration,
    pub max_redirects: usize,
    pub user_agent: String,
}

impl Default for HttpOptions {
    fn default() -> Self {
        HttpOptions {
            timeout: Duration::from_secs(300),
            max_redirects: 2,
            user_agent: concat!("php-winget/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Why a redirect must not be followed, if it must not.
///
/// `visited` counts the URLs already requested in this chain, the original
/// one included, so `max_redirects` hops are allowed.
fn redirect_refusal(visited: usize, scheme: &str, max_redirects: usize) -> Option<&'static str> {
    if visited > max_redirects {
        Some("too many redirects")
    } else if scheme != "https" {
        Some("refusing to follow redirect to a non-HTTPS URL")
    } else {
        None
    }
}

/// Build a blocking client that verifies certificates, speaks TLS 1.2+ only,
/// refuses plain HTTP anywhere in the redirect chain, and caps redirects.
pub fn build_client(options: &HttpOptions) -> Result<Client, FetchError> {
    let max_redirects = options.max_redirects;
    let redirect_policy = Policy::custom(move |attempt| {
        match redirect_refusal(attempt.previous().len(), attempt.url().scheme(), max_redirects) {
            Some(reason) => attempt.error(reason),
            None => attempt.follow(),
        }
    });

    Client::builder()
        .use_rustls_tls()
        .https_only(true)
        .min_tls_version(reqwest::tls::Version::TLS_1_2)
        .redirect(redirect_policy)
        .timeout(options.timeout)
        .user_agent(options.user_agent.clone())
        .build()
        .map_err(FetchError::Client)
}

/// GET a URL and return the body, failing on non-2xx status or empty content
pub fn get_bytes(client: &Client, url: &str) -> Result<Vec<u8>, FetchError> {
    debug!("GET {}", url);

    let response = client.get(url).send().map_err(|source| FetchError::Request {
        url: url.to_string(),
        source,
    })?;

    if !response.status().is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    let bytes = response.bytes().map_err(|source| FetchError::Request {
        url: url.to_string(),
        source,
    })?;

    if bytes.is_empty() {
        return Err(FetchError::Empty(url.to_string()));
    }

    Ok(bytes.to_vec())
}

pub struct HttpSource {
    url: String,
    client: Client,
}

impl HttpSource {
    pub fn new(url: impl Into<String>, options: &HttpOptions) -> Result<Self, FetchError> {
        Ok(HttpSource {
            url: url.into(),
            client: build_client(options)?,
        })
    }
}

impl DocumentSource for HttpSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    fn fetch(&self) -> Result<String, FetchError> {
        let bytes = get_bytes(&self.client, &self.url)?;
        let text = String::from_utf8_lossy(&bytes).into_owned();
        if text.trim().is_empty() {
            return Err(FetchError::Empty(self.url.clone()));
        }

        info!("Fetched {} bytes from {}", bytes.len(), self.url);
        Ok(text)
    }
}

pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSource { path: path.into() }
    }
}

impl DocumentSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&self) -> Result<String, FetchError> {
        let text = fs::read_to_string(&self.path).map_err(|source| FetchError::Io {
            path: self.path.clone(),
            source,
        })?;
        if text.trim().is_empty() {
            return Err(FetchError::Empty(self.describe()));
        }

        info!("Read {} bytes from {}", text.len(), self.path.display());
        Ok(text)
    }
}
