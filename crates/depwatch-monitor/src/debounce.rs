use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

// ─── Debouncer ────────────────────────────────────────────────────────────

/// Collapses a burst of change events into one settled event.
///
/// Every [`touch`](Debouncer::touch) cancels the pending timer and starts a
/// new one, so only the last event of a burst survives. When the quiet
/// period elapses the last path is sent on the `settled` channel exactly once.
/// [`cancel`](Debouncer::cancel) guarantees a pending timer never fires.
#[derive(Debug)]
pub struct Debouncer {
    quiet: Duration,
    settled: mpsc::UnboundedSender<PathBuf>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(quiet: Duration, settled: mpsc::UnboundedSender<PathBuf>) -> Self {
        Self {
            quiet,
            settled,
            pending: Mutex::new(None),
        }
    }

    /// Record a change at `path`. Must be called from within a Tokio runtime.
    pub fn touch(&self, path: PathBuf) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = pending.take() {
            previous.abort();
        }
        let quiet = self.quiet;
        let settled = self.settled.clone();
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            // Receiver gone means the monitor stopped; nothing to do.
            let _ = settled.send(path);
        }));
    }

    /// Drop the pending trigger, if any.
    pub fn cancel(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = pending.take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────
