//! `classifier-client`: the narrow seam between the monitor and the external
//! research/classification service.
//!
//! The monitor only ever sees the [`ClassifierClient`] trait: one call per
//! resource, returning structured findings or `None` when the service is
//! unavailable. [`HttpClassifierClient`] is the production implementation;
//! tests substitute their own.
//!
//! ```rust,ignore
//! use classifier_client::{ClassifierClient, HttpClassifierClient};
//!
//! let client = HttpClassifierClient::new("https://research.example.com")?
//!     .with_api_key("token")
//!     .with_retries(2);
//!
//! if let Some(result) = client.classify("left-pad", "1.0.0", "npm").await {
//!     for insight in &result.insights {
//!         println!("{insight}");
//!     }
//! }
//! ```

pub mod error;
pub mod http;
pub mod types;

use async_trait::async_trait;

pub use error::ClassifierError;
pub use http::HttpClassifierClient;
pub use types::{ClassifierResult, ClassifyRequest};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, ClassifierError>;

/// External research collaborator.
///
/// Implementations must not panic or error on an unreachable service:
/// return `None` and let the caller skip the resource.
#[async_trait]
pub trait ClassifierClient: Send + Sync {
    async fn classify(&self, name: &str, version: &str, ecosystem: &str)
        -> Option<ClassifierResult>;
}
