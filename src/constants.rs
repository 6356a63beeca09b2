//! Global constants for the host_snapshot application.
//!
//! This module centralizes hardcoded values so that timeouts, caps and
//! artifact names live in one place.

// Buffer size constants
/// Chunk size for streaming file hashes (1MB)
pub const HASH_CHUNK_SIZE: usize = 1024 * 1024;

/// Chunk size for compression operations (512KB)
pub const COMPRESSION_CHUNK_SIZE: usize = 512 * 1024;

// Timeout constants
/// Default wall-clock bound for an enumeration command, in seconds
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 30;

/// Default wall-clock bound for the external scanner, in seconds
pub const DEFAULT_SCANNER_TIMEOUT_SECS: u64 = 300;

/// Scanner bound when deep mode widens the target, in seconds
pub const DEEP_SCANNER_TIMEOUT_SECS: u64 = 1800;

/// How long output readers may keep draining after a timed-out child is killed
pub const READER_GRACE_MILLIS: u64 = 250;

/// Upper bound on draining output after a child exits on its own; the
/// command's remaining time limit caps it further
pub const EXIT_DRAIN_SECS: u64 = 5;

// Fingerprint walker constants
/// Default number of most recently modified files considered for hashing
pub const DEFAULT_FINGERPRINT_MAX_FILES: usize = 500;

/// Default per-file size ceiling for hashing, in MB
pub const DEFAULT_FINGERPRINT_MAX_FILE_SIZE_MB: u64 = 50;

// External scanner constants
/// Number of characters of scanner output kept in the artifact
pub const DEFAULT_SCANNER_OUTPUT_CAP: usize = 20_000;

// Artifact names
pub const ARTIFACT_SYSTEM_INFO: &str = "system_info";
pub const ARTIFACT_ENVIRONMENT: &str = "environment";
pub const ARTIFACT_PROCESSES: &str = "processes";
pub const ARTIFACT_SERVICES: &str = "services";
pub const ARTIFACT_STARTUP_ITEMS: &str = "startup_items";
pub const ARTIFACT_NETWORK: &str = "network";
pub const ARTIFACT_CONNECTIONS: &str = "connections";
pub const ARTIFACT_INSTALLED_PACKAGES: &str = "installed_packages";
pub const ARTIFACT_RECENT_FILE_HASHES: &str = "recent_file_hashes";
pub const ARTIFACT_EXTERNAL_SCANS: &str = "external_scans";

/// Name of the summary document written next to the artifacts
pub const SUMMARY_FILE_NAME: &str = "collection_summary.json";

/// Prefix of the default output directory name
pub const DEFAULT_OUTPUT_PREFIX: &str = "host-snapshot";
