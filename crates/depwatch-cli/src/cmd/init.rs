use anyhow::Context;
use depwatch_core::config::Config;
use depwatch_core::{io, paths};
use std::path::Path;

pub fn run(root: &Path) -> anyhow::Result<()> {
    println!("Initializing depwatch in: {}", root.display());

    let config_path = paths::config_path(root);
    let data = serde_yaml::to_string(&Config::default()).context("failed to render default config")?;
    let created = io::write_if_missing(&config_path, data.as_bytes())
        .with_context(|| format!("failed to write {}", config_path.display()))?;

    if created {
        println!("  created: {}", paths::CONFIG_FILE);
        println!("\nSet classifier.endpoint (or DEPWATCH_CLASSIFIER_URL) before running `depwatch scan`.");
    } else {
        println!("  exists:  {}", paths::CONFIG_FILE);
    }
    Ok(())
}
