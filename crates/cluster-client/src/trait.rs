//! ClusterClient trait for mocking
//!
//! This trait abstracts the Kubernetes API so reconcilers can run against an
//! in-memory store in unit tests.

use crate::error::ClusterError;
use crate::key::{ObjectKey, ResourceType};
use serde_json::Value;

/// Cluster object operations
///
/// Not-found is reported as [`ClusterError::NotFound`] from every method;
/// callers decide whether it is an error.
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait ClusterClient: Send + Sync {
    /// Fetch an object
    async fn get(&self, key: &ObjectKey) -> Result<Value, ClusterError>;

    /// Create an object; fails with `Conflict` if it already exists
    async fn create(&self, key: &ObjectKey, object: Value) -> Result<Value, ClusterError>;

    /// Apply an RFC 6902 patch to an existing object
    async fn patch(&self, key: &ObjectKey, patch: &json_patch::Patch) -> Result<Value, ClusterError>;

    /// JSON merge patch on the status subresource
    async fn patch_status(&self, key: &ObjectKey, status: Value) -> Result<Value, ClusterError>;

    /// Delete an object
    async fn delete(&self, key: &ObjectKey) -> Result<(), ClusterError>;

    /// List objects of a type, in one namespace or cluster-wide
    async fn list(&self, resource: &ResourceType, namespace: Option<&str>) -> Result<Vec<Value>, ClusterError>;
}
