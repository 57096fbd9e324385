use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("invalid classifier endpoint '{0}': expected an http(s) URL")]
    InvalidEndpoint(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("classifier returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode classifier response: {0}")]
    Decode(#[source] serde_json::Error),
}

impl ClassifierError {
    /// Transport failures, rate limiting, and server errors are worth another
    /// attempt. Client errors and undecodable bodies are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClassifierError::Http(_) => true,
            ClassifierError::Status { status, .. } => *status == 429 || *status >= 500,
            ClassifierError::InvalidEndpoint(_) | ClassifierError::Decode(_) => false,
        }
    }
}
