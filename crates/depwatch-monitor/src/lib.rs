//! Background dependency monitor.
//!
//! [`Monitor`] owns the whole lifecycle for one project root: a recursive
//! manifest watcher feeding a [`Debouncer`], two interval timers for critical
//! and full checks, and the scan pipeline that turns classifier findings into
//! deduplicated alerts. Collaborators are injected as traits:
//! [`ClassifierClient`](classifier_client::ClassifierClient) for research,
//! [`Notifier`] for surfacing alerts, and [`Remediator`] for applying
//! approved version bumps.

pub mod debounce;
pub mod error;
pub mod monitor;
pub mod notifier;
pub mod remediator;
pub mod scan;
pub mod watcher;

pub use debounce::Debouncer;
pub use error::MonitorError;
pub use monitor::{Monitor, MonitorBuilder, MonitorState, MonitorStatus};
pub use notifier::{Notifier, TracingNotifier};
pub use remediator::{LogOnlyRemediator, ManifestRemediator, Remediator};
pub use scan::{ScanOutcome, ScanReport};
pub use watcher::ManifestWatcher;

pub type Result<T> = std::result::Result<T, MonitorError>;
