//! Utility functions for persisting a snapshot.
//!
//! ## Components
//!
//! - **Report**: one artifact file per domain, written atomically
//! - **Summary**: the `collection_summary.json` document
//! - **Compression**: optional ZIP archive of the output directory
//! - **Hashing**: streaming SHA-256 used by the fingerprint walker
//!
//! ### Archiving an Output Directory
//!
//! ```no_run
//! use host_snapshot::utils::compress::compress_output_dir;
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! let zip_path = compress_output_dir(Path::new("/tmp/host-snapshot-ws-20240101-120000"))?;
//! println!("Created archive: {}", zip_path.display());
//! # Ok(())
//! # }
//! ```
//!
//! ### Hashing a File
//!
//! ```no_run
//! use host_snapshot::utils::hash::sha256_file;
//! use std::path::Path;
//!
//! # fn example() -> std::io::Result<()> {
//! let digest = sha256_file(Path::new("/home/analyst/Downloads/installer.pkg"))?;
//! println!("SHA-256: {}", digest);
//! # Ok(())
//! # }
//! ```

/// Artifact file writer
pub mod report;

/// Collection summary generation and reporting
pub mod summary;

/// ZIP archive creation
pub mod compress;

/// Cryptographic hash calculation utilities
pub mod hash;
