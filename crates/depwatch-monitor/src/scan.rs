use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use chrono::Utc;
use classifier_client::{ClassifierClient, ClassifierResult};
use depwatch_core::alert::{Alert, AlertRegistry, Insertion, MonitoringStats};
use depwatch_core::config::MonitoringPolicy;
use depwatch_core::gate::surface;
use depwatch_core::manifest::{discover_resources, TrackedResource};
use depwatch_core::remediation::plan_remediation;
use depwatch_core::types::CheckKind;
use futures::FutureExt;
use serde::Serialize;
use tokio::time::Instant;

use crate::notifier::Notifier;
use crate::remediator::Remediator;

// ─── Reports ──────────────────────────────────────────────────────────────

/// Summary of one completed scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub kind: CheckKind,
    pub resources_discovered: usize,
    /// Resources handed to the classifier (at most `max_concurrent_checks`).
    pub resources_checked: usize,
    /// Checked resources whose classification was unavailable, failed, or timed out.
    pub resources_skipped: usize,
    pub new_alerts: usize,
    pub surfaced: usize,
    pub remediations: usize,
}

impl ScanReport {
    fn new(kind: CheckKind) -> Self {
        Self {
            kind,
            resources_discovered: 0,
            resources_checked: 0,
            resources_skipped: 0,
            new_alerts: 0,
            surfaced: 0,
            remediations: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Completed(ScanReport),
    /// Another scan was already in flight.
    Skipped,
}

// ─── Scan guard ───────────────────────────────────────────────────────────

/// Held for the duration of a scan; clears the busy flag on drop, including
/// when the scan future is aborted or unwinds.
struct ScanGuard<'a> {
    busy: &'a AtomicBool,
}

impl<'a> ScanGuard<'a> {
    fn acquire(busy: &'a AtomicBool) -> Option<Self> {
        busy.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { busy })
    }
}

impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

// ─── MonitorCore ──────────────────────────────────────────────────────────

/// State shared between the [`Monitor`](crate::Monitor) handle and its
/// background tasks.
pub(crate) struct MonitorCore {
    root: Option<PathBuf>,
    policy: RwLock<MonitoringPolicy>,
    registry: Mutex<AlertRegistry>,
    scanning: AtomicBool,
    /// Bumped by [`MonitorCore::reset`]. Scans started under an older value
    /// may not touch the registry.
    generation: AtomicU64,
    classifier: Arc<dyn ClassifierClient>,
    notifier: Arc<dyn Notifier>,
    remediator: Arc<dyn Remediator>,
}

impl MonitorCore {
    pub(crate) fn new(
        root: Option<PathBuf>,
        policy: MonitoringPolicy,
        classifier: Arc<dyn ClassifierClient>,
        notifier: Arc<dyn Notifier>,
        remediator: Arc<dyn Remediator>,
    ) -> Self {
        Self {
            root,
            policy: RwLock::new(policy),
            registry: Mutex::new(AlertRegistry::new()),
            scanning: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            classifier,
            notifier,
            remediator,
        }
    }

    pub(crate) fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub(crate) fn policy(&self) -> MonitoringPolicy {
        self.policy
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn set_policy(&self, policy: MonitoringPolicy) {
        *self.policy.write().unwrap_or_else(PoisonError::into_inner) = policy;
    }

    fn registry(&self) -> MutexGuard<'_, AlertRegistry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn alerts(&self) -> Vec<Alert> {
        self.registry().all()
    }

    pub(crate) fn stats(&self) -> MonitoringStats {
        self.registry().stats().clone()
    }

    /// Drop every alert and orphan scans still in flight, so a scan that
    /// finishes after this returns cannot repopulate the registry.
    pub(crate) fn reset(&self) {
        let mut registry = self.registry();
        self.generation.fetch_add(1, Ordering::AcqRel);
        registry.clear();
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::Acquire) == generation
    }

    pub(crate) fn is_scanning(&self) -> bool {
        self.scanning.load(Ordering::Acquire)
    }

    /// Run one scan unless another is already in flight.
    pub(crate) async fn run_scan(&self, kind: CheckKind) -> ScanOutcome {
        let Some(_guard) = ScanGuard::acquire(&self.scanning) else {
            tracing::info!(kind = %kind, "scan already in progress; skipping check");
            return ScanOutcome::Skipped;
        };

        let generation = self.generation.load(Ordering::Acquire);
        let policy = self.policy();
        let resources = match self.root() {
            Some(root) => discover_resources(root),
            None => Vec::new(),
        };

        let mut report = ScanReport::new(kind);
        report.resources_discovered = resources.len();
        if resources.len() > policy.max_concurrent_checks {
            tracing::debug!(
                discovered = resources.len(),
                cap = policy.max_concurrent_checks,
                "deferring resources beyond the per-scan cap"
            );
        }

        let mut response_times = Vec::new();
        for resource in resources.iter().take(policy.max_concurrent_checks) {
            report.resources_checked += 1;

            let started = Instant::now();
            let result = self.classify(resource, &policy).await;
            response_times.push(started.elapsed().as_millis() as u64);

            let Some(result) = result else {
                report.resources_skipped += 1;
                continue;
            };

            let alert = match Alert::security(
                resource,
                &result.insights,
                result.latest_version.as_deref(),
            ) {
                Some(alert) => Some(alert),
                None if kind == CheckKind::Full => result
                    .latest_version
                    .as_deref()
                    .and_then(|latest| Alert::update(resource, latest)),
                None => None,
            };

            if let Some(alert) = alert {
                self.handle_alert(alert, generation, &policy, &mut report)
                    .await;
            }
        }

        self.registry()
            .stats_mut()
            .record_scan(kind, resources.len(), &response_times, Utc::now());

        tracing::info!(
            kind = %kind,
            discovered = report.resources_discovered,
            checked = report.resources_checked,
            skipped = report.resources_skipped,
            new_alerts = report.new_alerts,
            "scan complete"
        );
        ScanOutcome::Completed(report)
    }

    /// Run a scan from a background task. Panics are caught and logged so the
    /// calling timer keeps going.
    pub(crate) async fn run_guarded(&self, kind: CheckKind) {
        if AssertUnwindSafe(self.run_scan(kind))
            .catch_unwind()
            .await
            .is_err()
        {
            tracing::error!(kind = %kind, "scan panicked; monitor continues");
        }
    }

    /// Classify one resource. `None` when the result cannot be used.
    async fn classify(
        &self,
        resource: &TrackedResource,
        policy: &MonitoringPolicy,
    ) -> Option<ClassifierResult> {
        let call = self.classifier.classify(
            &resource.name,
            &resource.declared_version,
            resource.ecosystem.as_str(),
        );
        match tokio::time::timeout(policy.classifier_timeout(), call).await {
            Err(_) => {
                tracing::warn!(
                    resource = %resource.name,
                    timeout_ms = policy.classifier_timeout_ms,
                    "classifier timed out; skipping resource"
                );
                None
            }
            Ok(None) => {
                tracing::debug!(resource = %resource.name, "classifier unavailable; skipping resource");
                None
            }
            Ok(Some(result)) if !result.success => {
                tracing::debug!(resource = %resource.name, "classification failed; skipping resource");
                None
            }
            Ok(Some(result)) => Some(result),
        }
    }

    async fn handle_alert(
        &self,
        alert: Alert,
        generation: u64,
        policy: &MonitoringPolicy,
        report: &mut ScanReport,
    ) {
        let insertion = {
            let mut registry = self.registry();
            if !self.is_current(generation) {
                tracing::debug!(resource = %alert.resource_name, "monitor reset mid-scan; dropping alert");
                return;
            }
            registry.add(alert.clone())
        };
        if let Insertion::Refreshed { replaced } = insertion {
            tracing::debug!(resource = %alert.resource_name, %replaced, "alert refreshed");
            return;
        }
        report.new_alerts += 1;

        if let Some(presentation) = surface(alert.severity, policy.notification_threshold) {
            self.notifier.notify(&alert, presentation);
            report.surfaced += 1;
        }

        let Some(plan) = plan_remediation(&alert, policy) else {
            return;
        };
        if !self.is_current(generation) {
            return;
        }
        match self.remediator.remediate(&plan).await {
            Ok(true) => {
                self.registry().stats_mut().auto_remediations += 1;
                report.remediations += 1;
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(resource = %plan.resource_name, "remediation failed: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remediator::LogOnlyRemediator;
    use async_trait::async_trait;
    use depwatch_core::gate::Presentation;
    use std::time::Duration;
    use tempfile::TempDir;

    struct SlowClassifier {
        delay: Duration,
        result: ClassifierResult,
    }

    #[async_trait]
    impl ClassifierClient for SlowClassifier {
        async fn classify(&self, _: &str, _: &str, _: &str) -> Option<ClassifierResult> {
            tokio::time::sleep(self.delay).await;
            Some(self.result.clone())
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        seen: Mutex<Vec<String>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, alert: &Alert, _: Presentation) {
            self.seen.lock().unwrap().push(alert.resource_name.clone());
        }
    }

    fn core_with_slow_rce(dir: &TempDir, notifier: Arc<RecordingNotifier>) -> MonitorCore {
        std::fs::write(
            dir.path().join("package.json"),
            r#"{"name": "app", "dependencies": {"left-pad": "1.0.0"}}"#,
        )
        .unwrap();
        let classifier = Arc::new(SlowClassifier {
            delay: Duration::from_secs(2),
            result: ClassifierResult::ok(["Known CVE: remote code execution in left-pad 1.0.0"]),
        });
        let policy = MonitoringPolicy {
            classifier_timeout_ms: 10_000,
            ..MonitoringPolicy::default()
        };
        MonitorCore::new(
            Some(dir.path().to_path_buf()),
            policy,
            classifier,
            notifier,
            Arc::new(LogOnlyRemediator),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn reset_during_scan_discards_its_alerts() {
        let dir = TempDir::new().unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let core = core_with_slow_rce(&dir, notifier.clone());

        let (outcome, ()) = tokio::join!(core.run_scan(CheckKind::Critical), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            core.reset();
        });

        assert!(matches!(outcome, ScanOutcome::Completed(_)));
        assert!(core.alerts().is_empty());
        assert!(notifier.seen.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn scans_after_reset_record_alerts_again() {
        let dir = TempDir::new().unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let core = core_with_slow_rce(&dir, notifier.clone());

        core.reset();
        core.run_scan(CheckKind::Critical).await;

        assert_eq!(core.alerts().len(), 1);
        assert_eq!(*notifier.seen.lock().unwrap(), vec!["left-pad".to_string()]);
    }

    #[test]
    fn scan_guard_is_exclusive_and_released_on_drop() {
        let busy = AtomicBool::new(false);
        let guard = ScanGuard::acquire(&busy).unwrap();
        assert!(ScanGuard::acquire(&busy).is_none());
        drop(guard);
        assert!(!busy.load(Ordering::Acquire));
        assert!(ScanGuard::acquire(&busy).is_some());
    }
}
