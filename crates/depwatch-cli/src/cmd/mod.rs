pub mod classify;
pub mod config;
pub mod init;
pub mod resources;
pub mod scan;
pub mod watch;

use anyhow::Context;
use classifier_client::{ClassifierClient, HttpClassifierClient};
use depwatch_core::alert::Alert;
use depwatch_core::config::Config;
use depwatch_monitor::{LogOnlyRemediator, ManifestRemediator, Remediator};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::output::{print_table, truncate};

/// Classifier settings supplied on the command line or through the environment.
#[derive(Debug, Default, Clone)]
pub struct ClassifierOverrides {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
}

/// Load the config and apply command-line/environment overrides on top.
pub fn load_config(root: &Path, overrides: &ClassifierOverrides) -> anyhow::Result<Config> {
    let mut config = Config::load(root).context("failed to load config")?;
    if let Some(endpoint) = &overrides.endpoint {
        config.classifier.endpoint = Some(endpoint.clone());
    }
    if let Some(key) = &overrides.api_key {
        config.classifier.api_key = Some(key.clone());
    }
    Ok(config)
}

/// Build the HTTP classifier described by `config`.
pub fn build_classifier(config: &Config) -> anyhow::Result<Arc<dyn ClassifierClient>> {
    let endpoint = config
        .classifier
        .endpoint
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .context(
            "classifier.endpoint is not set (configure it in .depwatch/config.yaml \
             or set DEPWATCH_CLASSIFIER_URL)",
        )?;

    let mut client = HttpClassifierClient::new(endpoint)
        .with_context(|| format!("invalid classifier endpoint '{endpoint}'"))?
        .with_retries(config.classifier.retries)
        // Per-request ceiling; the monitor applies its own per-resource timeout.
        .with_request_timeout(Duration::from_millis(config.monitoring.classifier_timeout_ms))
        .context("failed to build HTTP client")?;
    if let Some(key) = &config.classifier.api_key {
        client = client.with_api_key(key.clone());
    }
    Ok(Arc::new(client))
}

/// `ManifestRemediator` when the user asked for fixes to be written, otherwise log-only.
pub fn remediator(root: &Path, apply: bool) -> Arc<dyn Remediator> {
    if apply {
        Arc::new(ManifestRemediator::new(root))
    } else {
        Arc::new(LogOnlyRemediator)
    }
}

pub fn print_alerts(alerts: &[Alert]) {
    if alerts.is_empty() {
        println!("No alerts.");
        return;
    }
    let rows: Vec<Vec<String>> = alerts
        .iter()
        .map(|a| {
            vec![
                a.severity.to_string(),
                a.kind.to_string(),
                a.resource_name.clone(),
                a.resource_version.clone(),
                if a.requires_action { "yes" } else { "no" }.to_string(),
                truncate(&a.message, 80),
            ]
        })
        .collect();
    print_table(
        &["SEVERITY", "KIND", "RESOURCE", "VERSION", "ACTION", "MESSAGE"],
        &rows,
    );
}
