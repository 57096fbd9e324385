use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("monitor must be started from within a Tokio runtime")]
    NoRuntime,

    #[error(transparent)]
    Core(#[from] depwatch_core::DepwatchError),

    #[error("file watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
