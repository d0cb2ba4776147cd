//! Engine error types.

use thiserror::Error;

/// Errors raised by the cluster state accessor.
///
/// The planners themselves never fail; only fetching or applying cluster
/// state does, and such a failure ends the current reconcile pass.
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("cluster backend error: {0}")]
    Backend(String),

    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type ClusterResult<T> = Result<T, ClusterError>;
