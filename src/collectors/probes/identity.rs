use serde_json::{json, Value};

use super::ProbeContext;
use crate::collectors::strategy::strategy_table;
use crate::models::{Domain, ProbeRecords, ProbeResult};
use crate::privileges::{current_user, is_elevated};

/// Host identity, annotated with what the collector knows about itself
pub async fn collect(ctx: &ProbeContext) -> ProbeResult {
    let strategies = strategy_table(Domain::SystemInfo, ctx.host, &ctx.strategy_context());
    let resolved = ctx
        .resolver()
        .resolve(Domain::SystemInfo, &strategies, ctx.settings.command_timeout())
        .await;

    if resolved.outcome.is_empty() {
        return resolved;
    }

    let ProbeResult { outcome, records, .. } = resolved;
    let records = match records {
        ProbeRecords::Structured(records) => records,
        other => return ProbeResult::new(Domain::SystemInfo, outcome, other),
    };
    let annotations = json!({
        "host_class": ctx.host,
        "current_user": current_user(),
        "elevated": is_elevated(),
        "deep_mode": ctx.run.deep_mode,
    });

    ProbeResult::new(
        Domain::SystemInfo,
        outcome,
        ProbeRecords::Structured(annotate(records, annotations)),
    )
}

/// Merge into the identity record, or lead with a separate record when the
/// data came back as raw command lines.
fn annotate(mut records: Vec<Value>, annotations: Value) -> Vec<Value> {
    let Value::Object(extra) = annotations else {
        return records;
    };

    let merge = matches!(records.first(), Some(Value::Object(first)) if !first.contains_key("raw"));
    if merge {
        if let Some(Value::Object(identity)) = records.first_mut() {
            for (key, value) in extra {
                identity.entry(key).or_insert(value);
            }
        }
        return records;
    }

    let mut annotated = vec![Value::Object(extra)];
    annotated.extend(records);
    annotated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotations_merge_into_identity_record() {
        let records = vec![json!({ "hostname": "ws-17", "os_name": "linux" })];
        let result = annotate(records, json!({ "host_class": "unix", "elevated": false }));

        assert_eq!(result.len(), 1);
        assert_eq!(result[0]["hostname"], "ws-17");
        assert_eq!(result[0]["host_class"], "unix");
    }

    #[test]
    fn test_annotations_lead_raw_lines() {
        let records = vec![json!({ "raw": "Linux ws-17 6.1.0 x86_64" })];
        let result = annotate(records, json!({ "host_class": "unix" }));

        assert_eq!(result.len(), 2);
        assert_eq!(result[0]["host_class"], "unix");
        assert_eq!(result[1]["raw"], "Linux ws-17 6.1.0 x86_64");
    }

    #[test]
    fn test_existing_fields_are_not_overwritten() {
        let records = vec![json!({ "hostname": "ws-17", "host_class": "custom" })];
        let result = annotate(records, json!({ "host_class": "unix" }));
        assert_eq!(result[0]["host_class"], "custom");
    }
}
