//! Probe implementations and the machinery that runs them.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              Orchestrator               │
//! ├─────────────────────────────────────────┤
//! │     Probes (one per domain)             │
//! ├──────────────────────┬──────────────────┤
//! │  Strategy resolver   │ Fingerprint walk │
//! ├──────────┬───────────┴──────────────────┤
//! │  Native  │     Bounded process runner   │
//! └──────────┴──────────────────────────────┘
//! ```
//!
//! ## Usage Example
//!
//! ```no_run
//! use host_snapshot::collectors::orchestrator::Orchestrator;
//! use host_snapshot::collectors::probes::ProbeContext;
//! use host_snapshot::config::CollectorSettings;
//! use host_snapshot::models::RunConfiguration;
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let run = RunConfiguration {
//!     output_root: "/tmp/snapshot".into(),
//!     deep_mode: false,
//!     archive: true,
//! };
//! let ctx = ProbeContext::for_local_host(Arc::new(run), Arc::new(CollectorSettings::default()));
//! let report = Orchestrator::new(ctx).run().await?;
//! println!("Wrote {} artifacts", report.artifacts.len());
//! # Ok(())
//! # }
//! ```

/// Bounded execution of external commands
pub mod runner;

/// In-process host enumeration
pub mod native;

/// Strategy table and fallback-chain resolution
pub mod strategy;

/// Recency-ranked content fingerprinting
pub mod fingerprint;

/// One probe per diagnostic domain
pub mod probes;

/// Concurrent probe execution and persistence
pub mod orchestrator;
