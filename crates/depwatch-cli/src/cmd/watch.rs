use crate::cmd::{
    build_classifier, load_config, print_alerts, remediator, ClassifierOverrides,
};
use crate::output::print_json;
use depwatch_monitor::Monitor;
use std::path::Path;

/// Start the monitor and keep it running until Ctrl-C, then print the final status.
pub fn run(
    root: &Path,
    apply: bool,
    overrides: &ClassifierOverrides,
    json: bool,
) -> anyhow::Result<()> {
    let config = load_config(root, overrides)?;
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async {
        let classifier = build_classifier(&config)?;
        let mut monitor = Monitor::builder(classifier)
            .root(root)
            .policy(config.monitoring.clone())
            .remediator(remediator(root, apply))
            .build();
        monitor.start()?;
        tracing::info!(root = %root.display(), "watching; press Ctrl-C to stop");

        tokio::signal::ctrl_c().await?;

        let status = monitor.status();
        monitor.stop();

        if json {
            return print_json(&status);
        }
        println!(
            "\nChecks: {} classifier calls, {} alerts generated, {} auto-remediations",
            status.stats.classifier_calls,
            status.stats.alerts_generated,
            status.stats.auto_remediations
        );
        print_alerts(&status.active_alerts);
        anyhow::Ok(())
    })
}
