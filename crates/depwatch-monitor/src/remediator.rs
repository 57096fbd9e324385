use std::path::PathBuf;

use async_trait::async_trait;
use depwatch_core::alert::bare_version;
use depwatch_core::io::atomic_write;
use depwatch_core::remediation::RemediationPlan;

use crate::Result;

/// Applies remediation plans the policy has already approved.
#[async_trait]
pub trait Remediator: Send + Sync {
    /// `Ok(true)` if the fix was applied, `Ok(false)` if there was nothing
    /// this remediator could do.
    async fn remediate(&self, plan: &RemediationPlan) -> Result<bool>;
}

// ─── LogOnlyRemediator ────────────────────────────────────────────────────

/// Records the plan in the log and changes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOnlyRemediator;

#[async_trait]
impl Remediator for LogOnlyRemediator {
    async fn remediate(&self, plan: &RemediationPlan) -> Result<bool> {
        tracing::info!(
            resource = %plan.resource_name,
            from = %plan.from_version,
            to = %plan.to_version,
            risk = %plan.risk,
            "remediation available (not applied)"
        );
        Ok(false)
    }
}

// ─── ManifestRemediator ───────────────────────────────────────────────────

/// Rewrites the declared version in the root `package.json`.
///
/// Only touches an entry whose current declaration still matches the plan's
/// `from_version`, and keeps its range operator (`^1.0.0` → `^1.0.1`).
#[derive(Debug, Clone)]
pub struct ManifestRemediator {
    root: PathBuf,
}

impl ManifestRemediator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

fn rewrite_version(current: &str, to: &str) -> String {
    let rest = current.trim_start_matches(['^', '~', '>', '<', '=', ' ']);
    let prefix = &current[..current.len() - rest.len()];
    format!("{prefix}{}", bare_version(to))
}

#[async_trait]
impl Remediator for ManifestRemediator {
    async fn remediate(&self, plan: &RemediationPlan) -> Result<bool> {
        let path = self.root.join("package.json");
        if !path.is_file() {
            return Ok(false);
        }
        let data = tokio::fs::read_to_string(&path).await?;
        let mut manifest: serde_json::Value = serde_json::from_str(&data)?;

        let mut changed = false;
        for section in ["dependencies", "devDependencies"] {
            let Some(entry) = manifest
                .get_mut(section)
                .and_then(|deps| deps.get_mut(&plan.resource_name))
            else {
                continue;
            };
            let Some(current) = entry.as_str() else {
                continue;
            };
            if current != plan.from_version {
                continue;
            }
            let bumped = rewrite_version(current, &plan.to_version);
            *entry = serde_json::Value::String(bumped);
            changed = true;
        }

        if !changed {
            return Ok(false);
        }

        let mut out = serde_json::to_string_pretty(&manifest)?;
        out.push('\n');
        atomic_write(&path, out.as_bytes())?;
        tracing::info!(
            resource = %plan.resource_name,
            from = %plan.from_version,
            to = %plan.to_version,
            "applied remediation to package.json"
        );
        Ok(true)
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────
