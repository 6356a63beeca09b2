//! End-to-end snapshot runs against a host with no external tools.
//!
//! Every command launch fails, so the run exercises the fallback chains, the
//! empty-result path, the fingerprint walker and the report writer together.

use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use anyhow::Result;
use serde_json::Value;
use tempfile::TempDir;

use host_snapshot::collectors::orchestrator::Orchestrator;
use host_snapshot::collectors::probes::ProbeContext;
use host_snapshot::collectors::runner::{CommandResult, CommandRunner, CommandSpec};
use host_snapshot::collectors::strategy::HostExecutor;
use host_snapshot::config::CollectorSettings;
use host_snapshot::models::{Domain, HostClass, RunConfiguration};
use host_snapshot::utils::report::artifact_file_name;

/// A host where no external program is installed
struct NoToolsRunner;

#[async_trait::async_trait]
impl CommandRunner for NoToolsRunner {
    async fn run(&self, spec: &CommandSpec, _limit: Duration) -> CommandResult {
        CommandResult::launch_failed(format!("{}: not installed", spec.program), Duration::ZERO)
    }
}

fn write_aged(path: &Path, content: &[u8], age_secs: u64) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    let mtime = SystemTime::now() - Duration::from_secs(age_secs);
    File::options().write(true).open(path)?.set_modified(mtime)?;
    Ok(())
}

fn context(home: &Path, output_root: &Path, host: HostClass, max_files: usize) -> ProbeContext {
    let run = RunConfiguration {
        output_root: output_root.to_path_buf(),
        deep_mode: false,
        archive: false,
    };
    let settings = CollectorSettings {
        command_timeout_secs: 5,
        fingerprint_max_files: max_files,
        watched_directories: Some(vec![home.join("Downloads").to_string_lossy().to_string()]),
        ..CollectorSettings::default()
    };
    let executor = HostExecutor::new(Arc::new(NoToolsRunner), None);
    ProbeContext::new(
        host,
        Arc::new(run),
        Arc::new(settings),
        Some(home.to_path_buf()),
        Arc::new(executor),
    )
}

fn read_json(path: &Path) -> Result<Value> {
    Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
}

#[tokio::test]
async fn test_snapshot_on_bare_host() -> Result<()> {
    let home = TempDir::new()?;
    let out = TempDir::new()?;
    let root = out.path().join("snapshot");
    write_aged(&home.path().join("Downloads/a.txt"), b"0123456789", 5)?;
    write_aged(&home.path().join("Downloads/b.txt"), b"older file", 7200)?;

    let report = Orchestrator::new(context(home.path(), &root, HostClass::Unix, 1))
        .run()
        .await?;

    // Every domain has its artifact, whatever happened to it
    for domain in Domain::ALL {
        assert!(root.join(artifact_file_name(domain)).exists(), "missing {}", domain);
    }
    assert_eq!(report.results.len(), Domain::ALL.len());

    // Only the newest download is fingerprinted
    let hashes = read_json(&root.join("recent_file_hashes.json"))?;
    let records = hashes["records"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert!(records[0]["path"].as_str().unwrap().ends_with("a.txt"));
    assert_eq!(records[0]["size_bytes"], 10);
    let digest = records[0]["sha256"].as_str().unwrap();
    assert_eq!(digest.len(), 64);
    assert!(digest.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));

    // No package manager: artifact present, no entries
    assert_eq!(fs::read(root.join("installed_packages.txt"))?.len(), 0);

    // The environment never depends on external tools
    let environment = read_json(&root.join("environment.json"))?;
    assert_eq!(environment["outcome"]["kind"], "complete");

    let summary = read_json(&report.summary_path)?;
    assert_eq!(summary["domains"].as_array().unwrap().len(), Domain::ALL.len());
    assert_eq!(summary["host_class"], "unix");
    let packages = summary["domains"]
        .as_array()
        .unwrap()
        .iter()
        .find(|d| d["domain"] == "installed_packages")
        .unwrap();
    assert_eq!(packages["status"], "empty");
    assert_eq!(packages["record_count"], 0);

    Ok(())
}

#[tokio::test]
async fn test_every_host_class_yields_full_artifact_set() -> Result<()> {
    let home = TempDir::new()?;

    for host in HostClass::ALL {
        let out = TempDir::new()?;
        let root = out.path().join(host.to_string());
        let report = Orchestrator::new(context(home.path(), &root, host, 10)).run().await?;

        assert_eq!(report.artifacts.len(), Domain::ALL.len());
        // Missing Downloads folder: nothing to hash, and no error
        let hashes = read_json(&root.join("recent_file_hashes.json"))?;
        assert_eq!(hashes["records"].as_array().unwrap().len(), 0);
    }

    Ok(())
}

#[tokio::test]
async fn test_system_info_falls_back_to_runtime_identity() -> Result<()> {
    let home = TempDir::new()?;
    let out = TempDir::new()?;
    let root = out.path().join("snapshot");

    Orchestrator::new(context(home.path(), &root, HostClass::Unix, 10)).run().await?;

    let info = read_json(&root.join("system_info.json"))?;
    assert_eq!(info["outcome"]["source"], "runtime identity");
    assert_eq!(info["records"][0]["host_class"], "unix");
    assert!(info["records"][0]["elevated"].is_boolean());
    Ok(())
}
