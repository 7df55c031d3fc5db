//! What the user asked for: a release line and a thread-safety variant

use std::fmt;
use std::str::FromStr;

use crate::errors::ArgumentError;

/// Build flavor of the PHP binaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThreadSafety {
    Ts,
    Nts,
}

impl ThreadSafety {
    /// Token used in CLI arguments and in release index build keys
    pub fn as_str(self) -> &'static str {
        match self {
            ThreadSafety::Ts => "ts",
            ThreadSafety::Nts => "nts",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ThreadSafety::Ts => "Thread Safe",
            ThreadSafety::Nts => "Non Thread Safe",
        }
    }

    /// Text appended to human-readable package names
    pub fn suffix(self) -> &'static str {
        match self {
            ThreadSafety::Ts => "",
            ThreadSafety::Nts => " NTS",
        }
    }

    /// Segment inserted into the package identifier and manifest file names
    pub fn id_segment(self) -> &'static str {
        match self {
            ThreadSafety::Ts => "",
            ThreadSafety::Nts => "NTS.",
        }
    }
}

impl fmt::Display for ThreadSafety {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThreadSafety {
    type Err = ArgumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ts" => Ok(ThreadSafety::Ts),
            "nts" => Ok(ThreadSafety::Nts),
            other => Err(ArgumentError::Variant(other.to_string())),
        }
    }
}

/// Target architecture of a Windows build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    X86,
    X64,
}

impl Arch {
    /// Lookup order used by the extractors
    pub const ALL: [Arch; 2] = [Arch::X64, Arch::X86];

    pub fn as_str(self) -> &'static str {
        match self {
            Arch::X86 => "x86",
            Arch::X64 => "x64",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "x86" => Some(Arch::X86),
            "x64" => Some(Arch::X64),
            _ => None,
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Thread-safety variant used when the caller does not pick one.
///
/// Every release line published on windows.php.net ships thread-safe builds,
/// including the older lines whose index predates the ts/nts split, so the
/// default is thread-safe across the board.
pub fn default_thread_safety(_major: u8, _minor: u8) -> ThreadSafety {
    ThreadSafety::Ts
}

/// A validated request for one release line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseQuery {
    version: String,
    major: u8,
    minor: u8,
    thread_safety: ThreadSafety,
}

impl ReleaseQuery {
    /// Build a query from a `N.N` release line and an optional variant.
    pub fn new(version: &str, thread_safety: Option<ThreadSafety>) -> Result<Self, ArgumentError> {
        let (major, minor) = parse_release_line(version)
            .ok_or_else(|| ArgumentError::VersionFormat(version.to_string()))?;

        Ok(ReleaseQuery {
            version: version.to_string(),
            major,
            minor,
            thread_safety: thread_safety.unwrap_or_else(|| default_thread_safety(major, minor)),
        })
    }

    /// Build a query straight from command-line tokens.
    ///
    /// The version is validated first so a bad release line wins over a bad
    /// variant token.
    pub fn parse(version: &str, variant: Option<&str>) -> Result<Self, ArgumentError> {
        if parse_release_line(version).is_none() {
            return Err(ArgumentError::VersionFormat(version.to_string()));
        }
        let thread_safety = variant.map(str::parse::<ThreadSafety>).transpose()?;
        Self::new(version, thread_safety)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn major(&self) -> u8 {
        self.major
    }

    pub fn minor(&self) -> u8 {
        self.minor
    }

    pub fn thread_safety(&self) -> ThreadSafety {
        self.thread_safety
    }

    /// Version with the dot removed, e.g. "83"
    pub fn version_min(&self) -> String {
        format!("{}{}", self.major, self.minor)
    }

    /// winget package identifier, e.g. `PHP.PHP.8.3` or `PHP.PHP.NTS.8.3`
    pub fn package_id(&self) -> String {
        format!(
            "PHP.PHP.{}{}",
            self.thread_safety.id_segment(),
            self.version
        )
    }
}

/// Accepts exactly one ASCII digit, a dot, and one ASCII digit.
fn parse_release_line(version: &str) -> Option<(u8, u8)> {
    match version.as_bytes() {
        [major, b'.', minor] if major.is_ascii_digit() && minor.is_ascii_digit() => {
            Some((major - b'0', minor - b'0'))
        }
        _ => None,
    }
}
