use crate::output::{print_json, print_table};
use depwatch_core::manifest::{discover_manifests, discover_resources};
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let resources = discover_resources(root);

    if json {
        return print_json(&resources);
    }

    let manifests = discover_manifests(root);
    if manifests.is_empty() {
        println!("No manifests found in {}", root.display());
        return Ok(());
    }
    let names: Vec<String> = manifests
        .iter()
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .collect();
    println!("Manifests: {}\n", names.join(", "));

    if resources.is_empty() {
        println!("No declared dependencies.");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = resources
        .iter()
        .map(|r| {
            vec![
                r.name.clone(),
                r.declared_version.clone(),
                r.ecosystem.to_string(),
            ]
        })
        .collect();
    print_table(&["NAME", "VERSION", "ECOSYSTEM"], &rows);
    Ok(())
}
