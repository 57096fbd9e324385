use std::path::{Path, PathBuf};

use depwatch_core::paths::is_watched_manifest;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::Result;

/// Recursive filesystem watch that forwards manifest changes.
///
/// Only create and modify events on known manifest file names outside
/// dependency/vendor directories make it through. Dropping the watcher
/// removes the OS watch.
pub struct ManifestWatcher {
    root: PathBuf,
    _watcher: RecommendedWatcher,
}

impl ManifestWatcher {
    pub fn install(root: &Path, changes: mpsc::UnboundedSender<PathBuf>) -> Result<Self> {
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!("file watcher error: {e}");
                    return;
                }
            };
            if !is_relevant(&event.kind) {
                return;
            }
            for path in event.paths {
                if is_watched_manifest(&path) {
                    tracing::debug!(path = %path.display(), "manifest changed");
                    let _ = changes.send(path);
                }
            }
        })?;
        watcher.watch(root, RecursiveMode::Recursive)?;
        tracing::debug!(root = %root.display(), "manifest watcher installed");

        Ok(Self {
            root: root.to_path_buf(),
            _watcher: watcher,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl std::fmt::Debug for ManifestWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManifestWatcher")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

fn is_relevant(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Create(_) | EventKind::Modify(_))
}
