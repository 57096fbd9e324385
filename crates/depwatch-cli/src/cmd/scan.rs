use crate::cmd::{
    build_classifier, load_config, print_alerts, remediator, ClassifierOverrides,
};
use crate::output::print_json;
use depwatch_core::types::CheckKind;
use depwatch_monitor::{Monitor, ScanOutcome};
use std::path::Path;

/// Run one check in the foreground and print what it found.
pub fn run(
    root: &Path,
    full: bool,
    apply: bool,
    overrides: &ClassifierOverrides,
    json: bool,
) -> anyhow::Result<()> {
    let config = load_config(root, overrides)?;
    config.monitoring.validate()?;
    let kind = if full { CheckKind::Full } else { CheckKind::Critical };

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let classifier = build_classifier(&config)?;
        let monitor = Monitor::builder(classifier)
            .root(root)
            .policy(config.monitoring.clone())
            .remediator(remediator(root, apply))
            .build();

        let report = match monitor.run_check(kind).await {
            ScanOutcome::Completed(report) => report,
            ScanOutcome::Skipped => anyhow::bail!("another scan is already running"),
        };
        let alerts = monitor.alerts();

        if json {
            return print_json(&serde_json::json!({
                "report": report,
                "alerts": alerts,
            }));
        }

        println!(
            "{} check: {} resources discovered, {} checked, {} skipped",
            report.kind,
            report.resources_discovered,
            report.resources_checked,
            report.resources_skipped
        );
        if report.resources_discovered > report.resources_checked {
            println!(
                "  ({} deferred by max_concurrent_checks)",
                report.resources_discovered - report.resources_checked
            );
        }
        println!();
        print_alerts(&alerts);
        anyhow::Ok(())
    })
}
