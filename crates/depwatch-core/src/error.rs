use thiserror::Error;

#[derive(Debug, Error)]
pub enum DepwatchError {
    #[error("invalid policy: {0}")]
    InvalidPolicy(String),

    #[error("invalid severity '{0}': expected critical, high, medium, or low")]
    InvalidSeverity(String),

    #[error("invalid risk level '{0}': expected low, medium, or high")]
    InvalidRiskLevel(String),

    #[error("invalid alert kind '{0}'")]
    InvalidAlertKind(String),

    #[error("unsupported manifest: {0}")]
    UnsupportedManifest(String),

    #[error("malformed manifest {path}: {reason}")]
    MalformedManifest { path: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DepwatchError>;
