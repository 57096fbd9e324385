pub mod alert;
pub mod config;
pub mod error;
pub mod gate;
pub mod io;
pub mod manifest;
pub mod paths;
pub mod remediation;
pub mod severity;
pub mod types;

pub use error::{DepwatchError, Result};
