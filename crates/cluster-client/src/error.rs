//! Cluster client errors

use std::fmt;
use thiserror::Error;

/// Errors that can occur when talking to the Kubernetes API
#[derive(Debug, Error)]
pub enum ClusterError {
    /// Object does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Object already exists, or was modified concurrently
    #[error("Conflict: {0}")]
    Conflict(String),

    /// API server rejected or failed the request
    #[error("API error: {0}")]
    Api(String),

    /// Transport or client error from kube
    #[error("Kubernetes client error: {0}")]
    Kube(#[source] kube::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid request (e.g. a patch that does not apply)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ClusterError {
    /// Classifies a kube error for the object or collection it was raised against.
    ///
    /// A 404 on a collection means the kind itself is not served.
    pub fn from_kube(err: kube::Error, target: impl fmt::Display) -> Self {
        match err {
            kube::Error::Api(api_err) if api_err.code == 404 => ClusterError::NotFound(target.to_string()),
            kube::Error::Api(api_err) if api_err.code == 409 => {
                ClusterError::Conflict(format!("{target}: {}", api_err.message))
            }
            other => ClusterError::Kube(other),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClusterError::NotFound(_))
    }
}
