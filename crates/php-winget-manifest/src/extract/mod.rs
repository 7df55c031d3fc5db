//! Release index parsing
//!
//! windows.php.net publishes the same data twice: a JSON index and the HTML
//! download page. Each format gets its own `IndexParser`; the first parser
//! whose capability check accepts a document is the one that reads it.

mod html;
mod json;

pub use html::HtmlPageParser;
pub use json::JsonIndexParser;

use tracing::debug;

use crate::errors::ParseError;
use crate::query::ReleaseQuery;
use crate::release::ReleaseInfo;

/// Knobs that do not come from the query itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Compiler toolset tags a build may carry, e.g. `vs16`. Lowercase.
    pub toolsets: Vec<String>,
    /// Base URL that index-relative artifact paths are joined onto
    pub download_base: String,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        ExtractOptions {
            toolsets: vec!["vc15".to_string(), "vs16".to_string(), "vs17".to_string()],
            download_base: "https://windows.php.net/downloads/releases/".to_string(),
        }
    }
}

impl ExtractOptions {
    pub fn accepts_toolset(&self, tag: &str) -> bool {
        self.toolsets.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

pub trait IndexParser {
    fn name(&self) -> &'static str;

    /// Cheap check on the raw document; no parsing beyond sniffing
    fn supports(&self, document: &str) -> bool;

    fn extract(
        &self,
        document: &str,
        query: &ReleaseQuery,
        options: &ExtractOptions,
    ) -> Result<ReleaseInfo, ParseError>;
}

/// Registered parsers in priority order
pub fn parsers() -> Vec<Box<dyn IndexParser>> {
    vec![Box::new(JsonIndexParser), Box::new(HtmlPageParser)]
}

pub fn select_parser(document: &str) -> Result<Box<dyn IndexParser>, ParseError> {
    parsers()
        .into_iter()
        .find(|parser| parser.supports(document))
        .ok_or_else(|| ParseError::new("document format", "neither a JSON index nor an HTML page"))
}

/// Pick a parser for the document and extract the queried release
pub fn extract_release(
    document: &str,
    query: &ReleaseQuery,
    options: &ExtractOptions,
) -> Result<ReleaseInfo, ParseError> {
    let parser = select_parser(document)?;
    debug!("Parsing release index with the {} parser", parser.name());
    parser.extract(document, query, options)
}
