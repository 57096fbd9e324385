use crate::output::print_json;
use anyhow::Context;
use depwatch_core::config::Config;
use depwatch_core::gate::surface;
use depwatch_core::severity::{
    classify_severity, indicates_issue, primary_finding, requires_action,
};
use depwatch_core::types::Severity;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct Classification<'a> {
    severity: Severity,
    raises_alert: bool,
    requires_action: bool,
    surfaced: bool,
    threshold: Severity,
    finding: Option<&'a str>,
}

/// Apply the keyword heuristics to `insights` without calling the classifier.
pub fn run(root: &Path, insights: &[String], json: bool) -> anyhow::Result<()> {
    let threshold = Config::load(root)
        .context("failed to load config")?
        .monitoring
        .notification_threshold;

    let severity = classify_severity(insights);
    let raises_alert = indicates_issue(insights);
    let result = Classification {
        severity,
        raises_alert,
        requires_action: raises_alert && requires_action(severity),
        surfaced: raises_alert && surface(severity, threshold).is_some(),
        threshold,
        finding: primary_finding(insights),
    };

    if json {
        return print_json(&result);
    }

    println!("severity:        {}", result.severity);
    println!("raises alert:    {}", yes_no(result.raises_alert));
    println!("requires action: {}", yes_no(result.requires_action));
    println!(
        "surfaced:        {} (threshold: {})",
        yes_no(result.surfaced),
        result.threshold
    );
    if let Some(finding) = result.finding {
        println!("finding:         {finding}");
    }
    Ok(())
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
