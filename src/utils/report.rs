//! Artifact writer.
//!
//! Every domain gets exactly one file in the output root, named after the
//! domain. Structured domains are pretty JSON documents, raw-text domains
//! are `.txt`. Files are written under a `.tmp` name and renamed into place,
//! so a reader never observes a half-written artifact.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::debug;

use crate::models::{ArtifactFormat, Domain, ProbeRecords, ProbeResult};

/// File name of a domain's artifact
pub fn artifact_file_name(domain: Domain) -> String {
    match domain.format() {
        ArtifactFormat::Json => format!("{}.json", domain.artifact_name()),
        ArtifactFormat::Text => format!("{}.txt", domain.artifact_name()),
    }
}

/// Write `contents` to `path` via a temporary sibling and a rename
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    fs::write(&tmp, contents).context(format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path).context(format!("Failed to move {} into place", path.display()))?;
    Ok(())
}

fn render(result: &ProbeResult) -> Result<Vec<u8>> {
    match (&result.records, result.domain.format()) {
        (ProbeRecords::Text(text), ArtifactFormat::Text) => Ok(text.clone().into_bytes()),
        _ => serde_json::to_vec_pretty(result)
            .context(format!("Failed to serialize {} to JSON", result.domain)),
    }
}

/// Write one probe result into `output_root`, returning the artifact path
pub fn write_artifact(output_root: &Path, result: &ProbeResult) -> Result<PathBuf> {
    let path = output_root.join(artifact_file_name(result.domain));
    write_atomic(&path, &render(result)?)?;
    debug!("Wrote {} ({} records)", path.display(), result.records.len());
    Ok(path)
}

/// Write every result, failing on the first artifact that cannot be written
pub fn write_artifacts(output_root: &Path, results: &[ProbeResult]) -> Result<Vec<PathBuf>> {
    results
        .iter()
        .map(|result| write_artifact(output_root, result))
        .collect()
}
