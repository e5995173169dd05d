//! Controller-specific error types.
//!
//! Reconcilers distinguish failures by condition reason, not by error type;
//! these variants exist for propagation and logging.

use cluster_client::ClusterError;
use kube::Error as KubeError;
use thiserror::Error;

/// Errors that can occur in the GPU add-on controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Cluster object client error
    #[error("{0}")]
    Cluster(#[from] ClusterError),

    /// Kubernetes API error outside the object client
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// Desired state cannot be built from the parent spec
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Teardown of a dependent resource failed
    #[error("failed to delete {kind} {name}: {source}")]
    DeleteFailed {
        kind: String,
        name: String,
        #[source]
        source: ClusterError,
    },

    /// Finalizer add/remove or wrapped reconcile error
    #[error("Finalizer error: {0}")]
    Finalizer(#[source] Box<kube_runtime::finalizer::Error<ControllerError>>),

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
