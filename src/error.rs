use std::path::PathBuf;

use thiserror::Error;

/// Failures that abort an export and must not be retried.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("malformed dataset `{}`: {reason}", path.display())]
    MalformedData { path: PathBuf, reason: String },

    #[error("myEKZ appears to be offline for maintenance")]
    Maintenance,
}
