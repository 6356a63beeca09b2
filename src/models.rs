use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::*;

/// Coarse OS family used to pick collection strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostClass {
    /// Windows-like hosts
    Windows,
    /// Apple macOS hosts
    Apple,
    /// Linux and other Unix-like hosts
    Unix,
}

impl HostClass {
    pub const ALL: [HostClass; 3] = [HostClass::Windows, HostClass::Apple, HostClass::Unix];

    /// Host class of the machine this binary was built for
    pub fn detect() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    /// Map an OS name as reported by `std::env::consts::OS`
    pub fn from_os(os: &str) -> Self {
        match os {
            "windows" => HostClass::Windows,
            "macos" | "ios" => HostClass::Apple,
            _ => HostClass::Unix,
        }
    }
}

impl fmt::Display for HostClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostClass::Windows => write!(f, "windows"),
            HostClass::Apple => write!(f, "apple"),
            HostClass::Unix => write!(f, "unix"),
        }
    }
}

/// Per-run options, computed once by the invocation layer.
#[derive(Debug, Clone)]
pub struct RunConfiguration {
    pub output_root: PathBuf,
    /// Widens the external scanner target and its time limit
    pub deep_mode: bool,
    pub archive: bool,
}

/// On-disk shape of a domain's artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    Json,
    Text,
}

/// A diagnostic domain; one probe and one artifact each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    SystemInfo,
    Environment,
    Processes,
    Services,
    StartupItems,
    Network,
    Connections,
    InstalledPackages,
    RecentFileHashes,
    ExternalScans,
}

impl Domain {
    pub const ALL: [Domain; 10] = [
        Domain::SystemInfo,
        Domain::Environment,
        Domain::Processes,
        Domain::Services,
        Domain::StartupItems,
        Domain::Network,
        Domain::Connections,
        Domain::InstalledPackages,
        Domain::RecentFileHashes,
        Domain::ExternalScans,
    ];

    /// Fixed artifact name, independent of which strategy produced the data
    pub fn artifact_name(&self) -> &'static str {
        match self {
            Domain::SystemInfo => ARTIFACT_SYSTEM_INFO,
            Domain::Environment => ARTIFACT_ENVIRONMENT,
            Domain::Processes => ARTIFACT_PROCESSES,
            Domain::Services => ARTIFACT_SERVICES,
            Domain::StartupItems => ARTIFACT_STARTUP_ITEMS,
            Domain::Network => ARTIFACT_NETWORK,
            Domain::Connections => ARTIFACT_CONNECTIONS,
            Domain::InstalledPackages => ARTIFACT_INSTALLED_PACKAGES,
            Domain::RecentFileHashes => ARTIFACT_RECENT_FILE_HASHES,
            Domain::ExternalScans => ARTIFACT_EXTERNAL_SCANS,
        }
    }

    pub fn format(&self) -> ArtifactFormat {
        match self {
            Domain::Services
            | Domain::Network
            | Domain::Connections
            | Domain::InstalledPackages
            | Domain::ExternalScans => ArtifactFormat::Text,
            Domain::SystemInfo
            | Domain::Environment
            | Domain::Processes
            | Domain::StartupItems
            | Domain::RecentFileHashes => ArtifactFormat::Json,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.artifact_name())
    }
}

/// Why a single strategy was not accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptFailure {
    pub source: String,
    pub reason: String,
}

/// Tagged result of resolving a domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// A strategy succeeded cleanly
    Complete { source: String },
    /// A strategy exited non-zero but produced usable output
    Partial { source: String, exit_code: Option<i32> },
    /// Every strategy failed; the result carries no records
    Empty { attempts: Vec<AttemptFailure> },
}

impl ProbeOutcome {
    pub fn is_empty(&self) -> bool {
        matches!(self, ProbeOutcome::Empty { .. })
    }

    pub fn source(&self) -> Option<&str> {
        match self {
            ProbeOutcome::Complete { source } | ProbeOutcome::Partial { source, .. } => {
                Some(source)
            }
            ProbeOutcome::Empty { .. } => None,
        }
    }
}

/// Records collected for a domain
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProbeRecords {
    Structured(Vec<Value>),
    Text(String),
}

impl ProbeRecords {
    /// An empty record set of the shape the domain's artifact expects
    pub fn empty_for(domain: Domain) -> Self {
        match domain.format() {
            ArtifactFormat::Json => ProbeRecords::Structured(Vec::new()),
            ArtifactFormat::Text => ProbeRecords::Text(String::new()),
        }
    }

    /// Number of entries, counting non-empty text lines for raw output
    pub fn len(&self) -> usize {
        match self {
            ProbeRecords::Structured(values) => values.len(),
            ProbeRecords::Text(text) => text.lines().filter(|l| !l.trim().is_empty()).count(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result of one probe. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeResult {
    pub domain: Domain,
    pub outcome: ProbeOutcome,
    pub records: ProbeRecords,
}

impl ProbeResult {
    pub fn new(domain: Domain, outcome: ProbeOutcome, records: ProbeRecords) -> Self {
        Self { domain, outcome, records }
    }

    /// Well-formed result for a domain where nothing could be collected
    pub fn empty(domain: Domain, attempts: Vec<AttemptFailure>) -> Self {
        Self {
            domain,
            outcome: ProbeOutcome::Empty { attempts },
            records: ProbeRecords::empty_for(domain),
        }
    }
}

/// Content fingerprint of a recently modified file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFingerprint {
    pub path: String,
    pub size_bytes: u64,
    pub sha256: String,
    pub modified_at: String,
}
