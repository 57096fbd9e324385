use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use classifier_client::ClassifierClient;
use depwatch_core::alert::{Alert, MonitoringStats};
use depwatch_core::config::MonitoringPolicy;
use depwatch_core::types::CheckKind;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::debounce::Debouncer;
use crate::error::MonitorError;
use crate::notifier::{Notifier, TracingNotifier};
use crate::remediator::{LogOnlyRemediator, Remediator};
use crate::scan::{MonitorCore, ScanOutcome};
use crate::watcher::ManifestWatcher;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorState {
    Stopped,
    Starting,
    Running,
}

/// Snapshot returned by [`Monitor::status`].
#[derive(Debug, Clone, Serialize)]
pub struct MonitorStatus {
    pub is_active: bool,
    pub policy: MonitoringPolicy,
    pub stats: MonitoringStats,
    pub active_alerts: Vec<Alert>,
}

// ─── Builder ──────────────────────────────────────────────────────────────

pub struct MonitorBuilder {
    classifier: Arc<dyn ClassifierClient>,
    root: Option<PathBuf>,
    policy: MonitoringPolicy,
    notifier: Arc<dyn Notifier>,
    remediator: Arc<dyn Remediator>,
}

impl MonitorBuilder {
    /// Project root to discover and watch manifests under. Without a root
    /// the monitor has nothing to scan and installs no watcher.
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn policy(mut self, policy: MonitoringPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn remediator(mut self, remediator: Arc<dyn Remediator>) -> Self {
        self.remediator = remediator;
        self
    }

    pub fn build(self) -> Monitor {
        Monitor {
            core: Arc::new(MonitorCore::new(
                self.root,
                self.policy,
                self.classifier,
                self.notifier,
                self.remediator,
            )),
            state: MonitorState::Stopped,
            tasks: Vec::new(),
            debouncer: None,
            watcher: None,
        }
    }
}

// ─── Monitor ──────────────────────────────────────────────────────────────

/// Background dependency monitor for one project root.
///
/// Construct one per root with [`Monitor::builder`]; nothing runs until
/// [`start`](Monitor::start). While running, the monitor:
///
/// - watches the root for manifest changes and, once a burst of changes has
///   been quiet for `debounce_ms`, runs a critical check;
/// - runs critical and full checks on their own intervals, the first tick
///   one period after start;
/// - runs a critical check immediately and a full check after
///   `startup_full_check_delay_ms`.
///
/// Scans never overlap: a trigger that arrives while a scan is in flight is
/// skipped. [`stop`](Monitor::stop) cancels everything and clears alerts.
/// Dropping a running monitor stops it.
pub struct Monitor {
    core: Arc<MonitorCore>,
    state: MonitorState,
    tasks: Vec<JoinHandle<()>>,
    debouncer: Option<Arc<Debouncer>>,
    watcher: Option<ManifestWatcher>,
}

impl Monitor {
    pub fn builder(classifier: Arc<dyn ClassifierClient>) -> MonitorBuilder {
        MonitorBuilder {
            classifier,
            root: None,
            policy: MonitoringPolicy::default(),
            notifier: Arc::new(TracingNotifier),
            remediator: Arc::new(LogOnlyRemediator),
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn policy(&self) -> MonitoringPolicy {
        self.core.policy()
    }

    /// Start background monitoring. A no-op when already running.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&mut self) -> Result<()> {
        if self.state != MonitorState::Stopped {
            tracing::debug!("monitor already running");
            return Ok(());
        }
        let policy = self.core.policy();
        policy.validate()?;
        let handle = Handle::try_current().map_err(|_| MonitorError::NoRuntime)?;

        self.state = MonitorState::Starting;

        if !policy.background_processing_enabled {
            tracing::info!("background processing disabled; manual checks only");
            self.state = MonitorState::Running;
            return Ok(());
        }

        let (settled_tx, settled_rx) = mpsc::unbounded_channel();
        let debouncer = Arc::new(Debouncer::new(policy.debounce(), settled_tx));
        self.spawn_dispatch(&handle, settled_rx);
        self.install_watcher(&handle, &debouncer);
        self.debouncer = Some(debouncer);

        self.spawn_interval(&handle, CheckKind::Critical, policy.critical_interval());
        self.spawn_interval(&handle, CheckKind::Full, policy.full_interval());
        self.spawn_startup_checks(&handle, policy.startup_full_check_delay());

        self.state = MonitorState::Running;
        tracing::info!(
            root = ?self.core.root(),
            critical_interval_ms = policy.critical_check_interval_ms,
            full_interval_ms = policy.full_check_interval_ms,
            "monitor started"
        );
        Ok(())
    }

    /// Stop monitoring and clear all alerts. Safe to call repeatedly.
    pub fn stop(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
        if let Some(debouncer) = self.debouncer.take() {
            debouncer.cancel();
        }
        self.watcher = None;
        self.core.reset();

        if self.state != MonitorState::Stopped {
            tracing::info!("monitor stopped");
        }
        self.state = MonitorState::Stopped;
    }

    /// Replace the policy. A running monitor is restarted under the new one.
    pub fn apply_policy(&mut self, policy: MonitoringPolicy) -> Result<()> {
        policy.validate()?;
        let was_running = self.state != MonitorState::Stopped;
        if was_running {
            self.stop();
        }
        self.core.set_policy(policy);
        if was_running {
            self.start()?;
        }
        Ok(())
    }

    /// Run a check now, whether or not the monitor is started.
    pub async fn run_check(&self, kind: CheckKind) -> ScanOutcome {
        self.core.run_scan(kind).await
    }

    /// Report a manifest change from outside the file watcher. Ignored unless
    /// the monitor is running with background processing.
    pub fn manifest_changed(&self, path: impl Into<PathBuf>) {
        let Some(debouncer) = &self.debouncer else {
            return;
        };
        if Handle::try_current().is_err() {
            tracing::warn!("manifest change reported outside a Tokio runtime; ignored");
            return;
        }
        debouncer.touch(path.into());
    }

    pub fn is_scanning(&self) -> bool {
        self.core.is_scanning()
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.core.alerts()
    }

    pub fn status(&self) -> MonitorStatus {
        MonitorStatus {
            is_active: self.state == MonitorState::Running,
            policy: self.core.policy(),
            stats: self.core.stats(),
            active_alerts: self.core.alerts(),
        }
    }

    // ── task wiring ──

    fn spawn_dispatch(&mut self, handle: &Handle, mut settled: mpsc::UnboundedReceiver<PathBuf>) {
        let core = Arc::clone(&self.core);
        self.tasks.push(handle.spawn(async move {
            while let Some(path) = settled.recv().await {
                tracing::info!(path = %path.display(), "manifest change settled");
                core.run_guarded(CheckKind::Critical).await;
            }
        }));
    }

    fn install_watcher(&mut self, handle: &Handle, debouncer: &Arc<Debouncer>) {
        let Some(root) = self.core.root().filter(|r| r.is_dir()) else {
            tracing::debug!("no project root; file watching disabled");
            return;
        };
        let (change_tx, mut change_rx) = mpsc::unbounded_channel();
        match ManifestWatcher::install(root, change_tx) {
            Ok(watcher) => {
                self.watcher = Some(watcher);
                let debouncer = Arc::clone(debouncer);
                self.tasks.push(handle.spawn(async move {
                    while let Some(path) = change_rx.recv().await {
                        debouncer.touch(path);
                    }
                }));
            }
            Err(e) => {
                tracing::warn!(root = %root.display(), "file watching unavailable: {e}");
            }
        }
    }

    fn spawn_interval(&mut self, handle: &Handle, kind: CheckKind, period: Duration) {
        let core = Arc::clone(&self.core);
        self.tasks.push(handle.spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                core.run_guarded(kind).await;
            }
        }));
    }

    fn spawn_startup_checks(&mut self, handle: &Handle, full_delay: Duration) {
        let core = Arc::clone(&self.core);
        self.tasks.push(handle.spawn(async move {
            core.run_guarded(CheckKind::Critical).await;
        }));

        let core = Arc::clone(&self.core);
        self.tasks.push(handle.spawn(async move {
            tokio::time::sleep(full_delay).await;
            core.run_guarded(CheckKind::Full).await;
        }));
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("root", &self.core.root())
            .field("state", &self.state)
            .field("tasks", &self.tasks.len())
            .finish_non_exhaustive()
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────
