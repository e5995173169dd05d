//! Typed create / read / patch / delete helpers
//!
//! These mirror the controller-runtime primitives reconcilers are written
//! against: fetch treats not-found as absence, create-or-patch either creates
//! the full desired object or sends only the fields the mutation changed, and
//! delete is idempotent.

use crate::cluster_trait::ClusterClient;
use crate::error::ClusterError;
use crate::key::{ObjectKey, ResourceType};
use kube::Resource;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use tracing::debug;

/// What `create_or_patch` did to the cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationResult {
    Unchanged,
    Created,
    Updated,
}

impl fmt::Display for OperationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OperationResult::Unchanged => "unchanged",
            OperationResult::Created => "created",
            OperationResult::Updated => "updated",
        };
        f.write_str(s)
    }
}

/// Result of an idempotent delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    AlreadyAbsent,
}

/// Starting point for a create-or-patch: a fresh object, or the fetched one
#[derive(Debug, Clone)]
pub enum Target<K> {
    New(K),
    Existing(K),
}

impl<K> Target<K> {
    /// `Existing` when the object was fetched, otherwise `New` built by `new`
    pub fn resolve(existing: Option<K>, new: impl FnOnce() -> K) -> Self {
        match existing {
            Some(object) => Target::Existing(object),
            None => Target::New(new()),
        }
    }
}

/// Fetch an object, `None` when it does not exist
pub async fn get<K>(client: &dyn ClusterClient, key: &ObjectKey) -> Result<Option<K>, ClusterError>
where
    K: DeserializeOwned,
{
    match client.get(key).await {
        Ok(value) => Ok(Some(serde_json::from_value(value)?)),
        Err(ClusterError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Apply `mutate` to `target` and persist the result
///
/// A new target is created with its full mutated shape. An existing target is
/// diffed against its mutated copy and patched with just the changed fields;
/// no request is sent when nothing changed.
pub async fn create_or_patch<K, E, F>(
    client: &dyn ClusterClient,
    key: &ObjectKey,
    target: Target<K>,
    mutate: F,
) -> Result<OperationResult, E>
where
    K: Serialize,
    E: From<ClusterError>,
    F: FnOnce(&mut K) -> Result<(), E>,
{
    match target {
        Target::New(mut object) => {
            mutate(&mut object)?;
            let value = serde_json::to_value(&object).map_err(ClusterError::from)?;
            client.create(key, value).await?;
            Ok(OperationResult::Created)
        }
        Target::Existing(mut object) => {
            let before = serde_json::to_value(&object).map_err(ClusterError::from)?;
            mutate(&mut object)?;
            let after = serde_json::to_value(&object).map_err(ClusterError::from)?;

            let patch = json_patch::diff(&before, &after);
            if patch.0.is_empty() {
                return Ok(OperationResult::Unchanged);
            }

            debug!(object = %key, operations = patch.0.len(), "Object drifted from desired state");
            client.patch(key, &patch).await?;
            Ok(OperationResult::Updated)
        }
    }
}

/// Delete an object, treating absence as success
pub async fn delete(client: &dyn ClusterClient, key: &ObjectKey) -> Result<DeleteOutcome, ClusterError> {
    match client.delete(key).await {
        Ok(()) => Ok(DeleteOutcome::Deleted),
        Err(ClusterError::NotFound(_)) => Ok(DeleteOutcome::AlreadyAbsent),
        Err(e) => Err(e),
    }
}

/// Objects of type `K` in `namespace` whose name starts with `prefix`
///
/// A kind the API server does not serve has no objects, so it lists as empty.
pub async fn list_with_prefix<K>(
    client: &dyn ClusterClient,
    namespace: Option<&str>,
    prefix: &str,
) -> Result<Vec<K>, ClusterError>
where
    K: Resource<DynamicType = ()> + DeserializeOwned,
{
    let resource = ResourceType::of::<K>();
    let items = match client.list(&resource, namespace).await {
        Ok(items) => items,
        Err(e) if e.is_not_found() => {
            debug!(kind = %resource.kind, prefix, "Kind not served, nothing to list");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e),
    };

    let mut matched = Vec::new();
    for item in items {
        let object: K = serde_json::from_value(item)?;
        if object.meta().name.as_deref().is_some_and(|name| name.starts_with(prefix)) {
            matched.push(object);
        }
    }
    Ok(matched)
}
