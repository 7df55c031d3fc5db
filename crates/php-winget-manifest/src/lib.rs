//! PHP for Windows winget manifest generation
//!
//! One run handles one release line: read the windows.php.net release index,
//! pull out the full version, release date and per-architecture zip URLs and
//! digests, render the winget manifest templates into a version-scoped
//! directory, and report whether the version had not been generated before.

pub mod errors;
pub mod extract;
pub mod generator;
pub mod layout;
pub mod query;
pub mod release;
pub mod render;
pub mod report;
pub mod source;
pub mod verify;

pub use errors::{
    ArgumentError, DirectoryError, FetchError, GenerateError, ParseError, RenderError,
    ReportError, Result, VerifyError, WriteError,
};
pub use extract::{extract_release, ExtractOptions, IndexParser};
pub use generator::{GenerateOutcome, Generator, GeneratorSettings};
pub use layout::OutputLayout;
pub use query::{Arch, ReleaseQuery, ThreadSafety};
pub use release::{ArtifactInfo, ReleaseInfo};
pub use render::{RenderContext, Renderer, TEMPLATES};
pub use report::NewVersion;
pub use source::{build_client, DocumentSource, FileSource, HttpOptions, HttpSource};
pub use verify::ArtifactVerifier;
