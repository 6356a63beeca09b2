//! # host_snapshot
//!
//! A one-shot diagnostic collector. A single run captures a structured
//! snapshot of the host it runs on and writes it to a directory of
//! artifacts, optionally bundled into a ZIP archive.
//!
//! ## Overview
//!
//! Every diagnostic domain (identity, environment, processes, services,
//! startup items, network, connections, installed packages, recent file
//! hashes and external scanner output) has one probe. A probe walks an
//! ordered chain of strategies for the detected host class and takes the
//! first that yields data. Tools that are missing, denied or slow never
//! abort the run: the domain's artifact is still written, empty, with the
//! reasons recorded.
//!
//! The collector only reads. It never modifies, quarantines or removes
//! anything, and does not interpret what it collects.
//!
//! ## Usage
//!
//! ```no_run
//! use host_snapshot::collectors::orchestrator::Orchestrator;
//! use host_snapshot::collectors::probes::ProbeContext;
//! use host_snapshot::config::CollectorSettings;
//! use host_snapshot::models::RunConfiguration;
//! use std::sync::Arc;
//!
//! # fn main() -> anyhow::Result<()> {
//! let run = RunConfiguration {
//!     output_root: "/tmp/host-snapshot-example".into(),
//!     deep_mode: false,
//!     archive: false,
//! };
//! let ctx = ProbeContext::for_local_host(Arc::new(run), Arc::new(CollectorSettings::default()));
//!
//! let runtime = tokio::runtime::Runtime::new()?;
//! let report = runtime.block_on(Orchestrator::new(ctx).run())?;
//! println!("Collected {} domains", report.results.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`cli`]: Command-line interface definitions and argument parsing
//! - [`models`]: Core data models and structures
//! - [`collectors`]: Probes, strategy resolution and the orchestrator
//! - [`config`]: Settings and environment variable expansion
//! - [`utils`]: Artifact writing, summary, archiving and hashing
//! - [`privileges`]: Elevation checks
//! - [`constants`]: Application-wide constants
//!
//! ## Safety
//!
//! The only `unsafe` code is the elevation check in [`privileges`], which
//! calls `geteuid` on Unix and `IsUserAnAdmin` on Windows.

/// Command-line interface definitions and argument parsing
pub mod cli;

/// Core data models and structures used throughout the application
pub mod models;

/// Probes, strategy resolution and orchestration
pub mod collectors;

/// Utility functions for writing, archiving and hashing
pub mod utils;

/// Settings and environment variable expansion
pub mod config;

/// Platform-specific privilege checks
pub mod privileges;

/// Application constants and configuration values
pub mod constants;

/// Test utilities and helpers
#[cfg(test)]
pub mod test_utils;
