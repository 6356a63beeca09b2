use std::path::PathBuf;

use log::warn;

use super::ProbeContext;
use crate::collectors::fingerprint;
use crate::models::{AttemptFailure, Domain, ProbeOutcome, ProbeRecords, ProbeResult};

fn roots(ctx: &ProbeContext) -> Vec<PathBuf> {
    ctx.settings
        .expanded_watched_directories()
        .unwrap_or_else(|| fingerprint::watched_roots(ctx.host, ctx.home_dir.as_deref()))
}

/// Fingerprint recently modified files under the watched directories
pub async fn collect(ctx: &ProbeContext) -> ProbeResult {
    let roots = roots(ctx);
    let (present, missing): (Vec<PathBuf>, Vec<PathBuf>) = roots.into_iter().partition(|r| r.is_dir());

    if present.is_empty() {
        let attempts = missing
            .iter()
            .map(|root| AttemptFailure {
                source: format!("walk {}", root.display()),
                reason: "not present on this host".to_string(),
            })
            .collect();
        return ProbeResult::empty(Domain::RecentFileHashes, attempts);
    }

    let source = format!("fingerprint walk of {} directories", present.len());
    let max_files = ctx.settings.fingerprint_max_files;
    let max_size = ctx.settings.max_file_size_bytes();

    let walk = tokio::task::spawn_blocking(move || fingerprint::scan(&present, max_files, max_size)).await;
    let fingerprints = match walk {
        Ok(fingerprints) => fingerprints,
        Err(e) => {
            warn!("Fingerprint walk did not finish: {}", e);
            return ProbeResult::empty(
                Domain::RecentFileHashes,
                vec![AttemptFailure {
                    source,
                    reason: e.to_string(),
                }],
            );
        }
    };

    let records = fingerprints
        .iter()
        .filter_map(|f| serde_json::to_value(f).ok())
        .collect();
    ProbeResult::new(
        Domain::RecentFileHashes,
        ProbeOutcome::Complete { source },
        ProbeRecords::Structured(records),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CollectorSettings;
    use crate::models::{HostClass, RunConfiguration};
    use crate::test_utils::{write_file_aged, FailingExecutor};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn context(home: &std::path::Path, max_files: usize) -> ProbeContext {
        let run = RunConfiguration {
            output_root: home.join("out"),
            deep_mode: false,
            archive: false,
        };
        let settings = CollectorSettings {
            fingerprint_max_files: max_files,
            watched_directories: Some(vec![
                home.join("Downloads").to_string_lossy().to_string(),
                home.join("absent").to_string_lossy().to_string(),
            ]),
            ..CollectorSettings::default()
        };
        ProbeContext::new(
            HostClass::detect(),
            Arc::new(run),
            Arc::new(settings),
            Some(home.to_path_buf()),
            Arc::new(FailingExecutor),
        )
    }

    #[tokio::test]
    async fn test_newest_download_fingerprinted() {
        let home = TempDir::new().unwrap();
        write_file_aged(&home.path().join("Downloads/a.txt"), b"0123456789", 10).unwrap();
        write_file_aged(&home.path().join("Downloads/b.txt"), b"older", 3600).unwrap();

        let result = collect(&context(home.path(), 1)).await;

        let ProbeRecords::Structured(records) = &result.records else { panic!("expected records") };
        assert_eq!(records.len(), 1);
        assert!(records[0]["path"].as_str().unwrap().ends_with("a.txt"));
        assert_eq!(records[0]["size_bytes"], 10);
        let digest = records[0]["sha256"].as_str().unwrap();
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert!(matches!(result.outcome, ProbeOutcome::Complete { .. }));
    }

    #[tokio::test]
    async fn test_no_watched_directory_present() {
        let home = TempDir::new().unwrap();

        let result = collect(&context(home.path(), 10)).await;

        assert_eq!(result.records, ProbeRecords::Structured(Vec::new()));
        match result.outcome {
            ProbeOutcome::Empty { attempts } => assert_eq!(attempts.len(), 2),
            other => panic!("unexpected {:?}", other),
        }
    }
}
