//! Runs every probe concurrently and persists the snapshot.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Utc;
use log::{error, info, warn};
use tokio::task::JoinHandle;

use crate::collectors::probes::{run_probe, ProbeContext};
use crate::constants::SUMMARY_FILE_NAME;
use crate::models::{AttemptFailure, Domain, ProbeResult};
use crate::utils::compress::compress_output_dir;
use crate::utils::report::{write_artifacts, write_atomic};
use crate::utils::summary::{create_collection_summary, SummaryHeader};

/// What a finished run produced
#[derive(Debug)]
pub struct CollectionReport {
    pub output_root: PathBuf,
    /// One result per domain, in [`Domain::ALL`] order
    pub results: Vec<ProbeResult>,
    pub artifacts: Vec<PathBuf>,
    pub summary_path: PathBuf,
    pub archive_path: Option<PathBuf>,
}

pub struct Orchestrator {
    ctx: ProbeContext,
}

impl Orchestrator {
    pub fn new(ctx: ProbeContext) -> Self {
        Self { ctx }
    }

    /// Run all probes, one task each, and wait for every one of them.
    ///
    /// A probe task that panics is reported as an empty result for its
    /// domain so the artifact set stays complete.
    pub async fn run_probes(&self) -> Vec<ProbeResult> {
        let handles: Vec<(Domain, JoinHandle<ProbeResult>)> = Domain::ALL
            .iter()
            .map(|&domain| {
                let ctx = self.ctx.clone();
                let handle = tokio::spawn(async move {
                    let start = Instant::now();
                    let result = run_probe(domain, &ctx).await;
                    info!(
                        "[{}] {} records in {:?}",
                        domain,
                        result.records.len(),
                        start.elapsed()
                    );
                    result
                });
                (domain, handle)
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (domain, handle) in handles {
            match handle.await {
                Ok(result) => results.push(result),
                Err(e) => {
                    error!("[{}] probe task failed: {}", domain, e);
                    results.push(ProbeResult::empty(
                        domain,
                        vec![AttemptFailure {
                            source: format!("{} probe", domain),
                            reason: format!("probe task panicked: {}", e),
                        }],
                    ));
                }
            }
        }
        results
    }

    /// Collect, write artifacts and summary, then archive if requested.
    ///
    /// # Returns
    ///
    /// * `Result<CollectionReport>` - Per-domain results and the paths that
    ///   were written. Only failures to create or write into the output root
    ///   are errors; a failed archive is logged and leaves `archive_path`
    ///   unset.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use host_snapshot::collectors::orchestrator::Orchestrator;
    /// use host_snapshot::collectors::probes::ProbeContext;
    /// use host_snapshot::config::CollectorSettings;
    /// use host_snapshot::models::RunConfiguration;
    /// use std::sync::Arc;
    ///
    /// # async fn example() -> anyhow::Result<()> {
    /// let run = RunConfiguration {
    ///     output_root: "/tmp/host-snapshot-ws-20240101-120000".into(),
    ///     deep_mode: false,
    ///     archive: true,
    /// };
    /// let ctx = ProbeContext::for_local_host(Arc::new(run), Arc::new(CollectorSettings::default()));
    /// let report = Orchestrator::new(ctx).run().await?;
    /// println!("{} artifacts written", report.artifacts.len());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run(&self) -> Result<CollectionReport> {
        let run = &self.ctx.run;
        let started_at = Utc::now();

        fs::create_dir_all(&run.output_root).context(format!(
            "Failed to create output directory {}",
            run.output_root.display()
        ))?;
        info!(
            "Collecting {} domains on a {} host into {}",
            Domain::ALL.len(),
            self.ctx.host,
            run.output_root.display()
        );

        let results = self.run_probes().await;
        let artifacts = write_artifacts(&run.output_root, &results)?;

        let header = SummaryHeader {
            hostname: local_hostname(),
            host_class: self.ctx.host,
            started_at: started_at.to_rfc3339(),
            finished_at: Utc::now().to_rfc3339(),
            deep_mode: run.deep_mode,
        };
        let summary = create_collection_summary(&header, &results)?;
        let summary_path = run.output_root.join(SUMMARY_FILE_NAME);
        write_atomic(&summary_path, summary.as_bytes())?;

        let empty = results.iter().filter(|r| r.outcome.is_empty()).count();
        if empty > 0 {
            warn!("{} of {} domains produced no data", empty, results.len());
        }

        let archive_path = if run.archive {
            let root = run.output_root.clone();
            match tokio::task::spawn_blocking(move || compress_output_dir(&root)).await {
                Ok(Ok(path)) => Some(path),
                Ok(Err(e)) => {
                    error!("Archiving failed, artifacts remain in place: {:#}", e);
                    None
                }
                Err(e) => {
                    error!("Archiving task failed: {}", e);
                    None
                }
            }
        } else {
            None
        };

        info!(
            "Collection finished in {}s",
            (Utc::now() - started_at).num_seconds()
        );

        Ok(CollectionReport {
            output_root: run.output_root.clone(),
            results,
            artifacts,
            summary_path,
            archive_path,
        })
    }
}

/// Hostname of this machine, or "unknown-host"
pub fn local_hostname() -> String {
    hostname::get()
        .ok()
        .map(|h| h.to_string_lossy().into_owned())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "unknown-host".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::strategy::{Attempt, Strategy, StrategyExecutor};
    use crate::config::CollectorSettings;
    use crate::models::{HostClass, ProbeOutcome, RunConfiguration};
    use crate::test_utils::FailingExecutor;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    struct PanickingExecutor;

    #[async_trait::async_trait]
    impl StrategyExecutor for PanickingExecutor {
        async fn execute(&self, strategy: &Strategy, _limit: Duration) -> Attempt {
            panic!("executor blew up on {}", strategy.label());
        }
    }

    fn context(root: &std::path::Path, archive: bool, executor: Arc<dyn StrategyExecutor>) -> ProbeContext {
        let run = RunConfiguration {
            output_root: root.join("snapshot"),
            deep_mode: false,
            archive,
        };
        let settings = CollectorSettings {
            watched_directories: Some(vec![root.join("watched").to_string_lossy().to_string()]),
            ..CollectorSettings::default()
        };
        ProbeContext::new(
            HostClass::Unix,
            Arc::new(run),
            Arc::new(settings),
            Some(root.to_path_buf()),
            executor,
        )
    }

    #[tokio::test]
    async fn test_results_follow_domain_order() {
        let dir = TempDir::new().unwrap();
        let orchestrator = Orchestrator::new(context(dir.path(), false, Arc::new(FailingExecutor)));

        let results = orchestrator.run_probes().await;
        let domains: Vec<_> = results.iter().map(|r| r.domain).collect();
        assert_eq!(domains, Domain::ALL.to_vec());
    }

    #[tokio::test]
    async fn test_panicking_probe_becomes_empty_result() {
        let dir = TempDir::new().unwrap();
        let orchestrator = Orchestrator::new(context(dir.path(), false, Arc::new(PanickingExecutor)));

        let results = orchestrator.run_probes().await;
        assert_eq!(results.len(), Domain::ALL.len());

        let processes = &results[2];
        assert_eq!(processes.domain, Domain::Processes);
        match &processes.outcome {
            ProbeOutcome::Empty { attempts } => assert!(attempts[0].reason.contains("panicked")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_writes_full_artifact_set_and_archive() {
        let dir = TempDir::new().unwrap();
        let orchestrator = Orchestrator::new(context(dir.path(), true, Arc::new(FailingExecutor)));

        let report = orchestrator.run().await.unwrap();

        assert_eq!(report.artifacts.len(), Domain::ALL.len());
        assert!(report.artifacts.iter().all(|p| p.exists()));
        assert!(report.summary_path.exists());
        let base = fs::canonicalize(dir.path()).unwrap();
        assert_eq!(report.archive_path, Some(base.join("snapshot.zip")));
    }

    #[tokio::test]
    async fn test_unwritable_output_root_is_fatal() {
        let dir = TempDir::new().unwrap();
        // A regular file where the output directory should go
        fs::write(dir.path().join("snapshot"), b"in the way").unwrap();
        let orchestrator = Orchestrator::new(context(dir.path(), false, Arc::new(FailingExecutor)));

        assert!(orchestrator.run().await.is_err());
    }
}
