use anyhow::{Context, Result};
use serde_json::json;
use uuid::Uuid;

use crate::models::{HostClass, ProbeOutcome, ProbeResult};
use crate::utils::report::artifact_file_name;

/// Run-level facts recorded alongside the per-domain entries
#[derive(Debug, Clone)]
pub struct SummaryHeader {
    pub hostname: String,
    pub host_class: HostClass,
    /// RFC 3339 start of the run
    pub started_at: String,
    /// RFC 3339 end of the run
    pub finished_at: String,
    pub deep_mode: bool,
}

/// Create a JSON summary of the collection.
///
/// One entry per domain with the artifact file, the outcome and the number
/// of records.
///
/// # Example Output
///
/// ```json
/// {
///   "collection_id": "550e8400-e29b-41d4-a716-446655440000",
///   "hostname": "workstation-01",
///   "host_class": "unix",
///   "started_at": "2024-01-15T14:30:52+00:00",
///   "domains": [
///     { "domain": "processes", "artifact": "processes.json", "status": "complete", ... }
///   ]
/// }
/// ```
pub fn create_collection_summary(header: &SummaryHeader, results: &[ProbeResult]) -> Result<String> {
    let domains: Vec<_> = results
        .iter()
        .map(|result| {
            let status = match &result.outcome {
                ProbeOutcome::Complete { .. } => "complete",
                ProbeOutcome::Partial { .. } => "partial",
                ProbeOutcome::Empty { .. } => "empty",
            };
            json!({
                "domain": result.domain,
                "artifact": artifact_file_name(result.domain),
                "status": status,
                "record_count": result.records.len(),
                "outcome": result.outcome,
            })
        })
        .collect();

    let empty_count = results.iter().filter(|r| r.outcome.is_empty()).count();

    let summary = json!({
        "collection_id": Uuid::new_v4().to_string(),
        "hostname": header.hostname,
        "host_class": header.host_class,
        "started_at": header.started_at,
        "finished_at": header.finished_at,
        "deep_mode": header.deep_mode,
        "collector_version": env!("CARGO_PKG_VERSION"),
        "domain_count": results.len(),
        "empty_domain_count": empty_count,
        "domains": domains,
    });

    serde_json::to_string_pretty(&summary).context("Failed to serialize collection summary to JSON")
}
