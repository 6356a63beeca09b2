use log::info;

use super::ProbeContext;
use crate::collectors::strategy::strategy_table;
use crate::models::{AttemptFailure, Domain, ProbeRecords, ProbeResult};

/// Marker line appended when scanner output is cut
pub fn truncation_marker(cap: usize) -> String {
    format!("[output truncated after {} characters]", cap)
}

/// Keep the first `cap` characters of `text`, then the truncation marker.
///
/// Counts characters, not bytes, so the cut never splits a code point.
pub fn cap_output(text: &str, cap: usize) -> String {
    match text.char_indices().nth(cap) {
        None => text.to_string(),
        Some((cut, _)) => format!("{}\n{}\n", &text[..cut], truncation_marker(cap)),
    }
}

/// Run the first available pre-installed scanner over the scan target
pub async fn collect(ctx: &ProbeContext) -> ProbeResult {
    let strategy_ctx = ctx.strategy_context();
    let strategies = strategy_table(Domain::ExternalScans, ctx.host, &strategy_ctx);
    let Some(target) = strategy_ctx.scan_target() else {
        return ProbeResult::empty(
            Domain::ExternalScans,
            vec![AttemptFailure {
                source: "external scanner".to_string(),
                reason: "no home directory to scan".to_string(),
            }],
        );
    };

    let limit = ctx.settings.scanner_timeout(ctx.run.deep_mode);
    info!("Scanning {} with a {:?} limit", target.display(), limit);

    let result = ctx
        .resolver()
        .resolve(Domain::ExternalScans, &strategies, limit)
        .await;

    match result.records {
        ProbeRecords::Text(text) => ProbeResult::new(
            Domain::ExternalScans,
            result.outcome,
            ProbeRecords::Text(cap_output(&text, ctx.settings.scanner_output_cap)),
        ),
        records => ProbeResult::new(Domain::ExternalScans, result.outcome, records),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::strategy::{HostExecutor, StrategyExecutor};
    use crate::config::CollectorSettings;
    use crate::models::{HostClass, ProbeOutcome, RunConfiguration};
    use crate::test_utils::ScriptedRunner;
    use proptest::prelude::*;
    use std::path::Path;
    use std::sync::Arc;

    fn context(home: Option<&Path>, cap: usize, executor: Arc<dyn StrategyExecutor>) -> ProbeContext {
        let run = RunConfiguration {
            output_root: "/unused".into(),
            deep_mode: false,
            archive: false,
        };
        let settings = CollectorSettings {
            scanner_output_cap: cap,
            ..CollectorSettings::default()
        };
        ProbeContext::new(
            HostClass::Unix,
            Arc::new(run),
            Arc::new(settings),
            home.map(Path::to_path_buf),
            executor,
        )
    }

    #[test]
    fn test_short_output_untouched() {
        assert_eq!(cap_output("clean\n", 100), "clean\n");
        assert_eq!(cap_output("", 0), "");
    }

    #[test]
    fn test_long_output_truncated_with_marker() {
        let capped = cap_output("abcdefghij", 4);
        assert_eq!(capped, "abcd\n[output truncated after 4 characters]\n");
    }

    #[test]
    fn test_cap_respects_char_boundaries() {
        let capped = cap_output("ééééé", 2);
        assert!(capped.starts_with("éé\n"));
    }

    #[tokio::test]
    async fn test_infected_scan_is_partial_and_capped() {
        let report = format!("/home/a/Downloads/x: Eicar FOUND\n{}", "-".repeat(500));
        let runner = ScriptedRunner::default().with("clamscan", ScriptedRunner::exited(1, &report, ""));
        let executor = HostExecutor::new(Arc::new(runner), None);
        let ctx = context(Some(Path::new("/home/a")), 100, Arc::new(executor));

        let result = collect(&ctx).await;

        assert!(matches!(result.outcome, ProbeOutcome::Partial { exit_code: Some(1), .. }));
        let ProbeRecords::Text(text) = &result.records else { panic!("expected text") };
        assert!(text.contains("Eicar FOUND"));
        assert!(text.ends_with("[output truncated after 100 characters]\n"));
    }

    #[tokio::test]
    async fn test_no_scanner_installed_is_empty() {
        let executor = HostExecutor::new(Arc::new(ScriptedRunner::default()), None);
        let ctx = context(Some(Path::new("/home/a")), 100, Arc::new(executor));

        let result = collect(&ctx).await;
        assert!(result.outcome.is_empty());
        assert_eq!(result.records, ProbeRecords::Text(String::new()));
    }

    #[tokio::test]
    async fn test_missing_home_is_empty() {
        let executor = HostExecutor::new(Arc::new(ScriptedRunner::default()), None);
        let ctx = context(None, 100, Arc::new(executor));

        let result = collect(&ctx).await;
        match result.outcome {
            ProbeOutcome::Empty { attempts } => assert_eq!(attempts[0].reason, "no home directory to scan"),
            other => panic!("unexpected {:?}", other),
        }
    }

    proptest! {
        #[test]
        fn cap_output_keeps_prefix(text in "\\PC{0,300}", cap in 0usize..200) {
            let capped = cap_output(&text, cap);
            let total = text.chars().count();
            let kept: String = text.chars().take(cap).collect();

            prop_assert!(capped.starts_with(&kept));
            if total > cap {
                let want = format!("{}\n", truncation_marker(cap));
                prop_assert!(capped.ends_with(&want));
                prop_assert_eq!(capped.chars().count(), cap + truncation_marker(cap).chars().count() + 2);
            } else {
                prop_assert_eq!(capped, text);
            }
        }
    }
}
