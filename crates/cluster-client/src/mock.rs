//! Mock ClusterClient for unit testing
//!
//! Stores objects in memory keyed by [`ObjectKey`], applies JSON patches the
//! way the API server would, counts writes, and can be told to fail specific
//! operations on specific kinds.

use crate::cluster_trait::ClusterClient;
use crate::error::ClusterError;
use crate::key::{ObjectKey, ResourceType};
use kube::Resource;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Client operation, used to target injected failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Get,
    Create,
    Patch,
    PatchStatus,
    Delete,
    List,
}

#[derive(Debug, Clone)]
enum FailureMode {
    Api(String),
    NotFound,
}

#[derive(Debug, Clone)]
struct InjectedFailure {
    operation: Operation,
    kind: String,
    mode: FailureMode,
}

/// In-memory cluster for tests
#[derive(Clone, Default, Debug)]
pub struct MockClusterClient {
    objects: Arc<Mutex<HashMap<ObjectKey, Value>>>,
    failures: Arc<Mutex<Vec<InjectedFailure>>>,
    writes: Arc<Mutex<usize>>,
    status_writes: Arc<Mutex<usize>>,
}

impl MockClusterClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a typed object (for test setup, not counted as a write)
    pub fn insert<K>(&self, object: &K)
    where
        K: Resource<DynamicType = ()> + Serialize,
    {
        let key = ObjectKey::for_object(object);
        let mut value = serde_json::to_value(object).unwrap_or(Value::Null);
        stamp_type_meta(&key.resource, &mut value);
        self.objects.lock().unwrap().insert(key, value);
    }

    /// Raw stored object
    pub fn object(&self, key: &ObjectKey) -> Option<Value> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    /// Stored object decoded as `K`
    pub fn typed<K: DeserializeOwned>(&self, key: &ObjectKey) -> Option<K> {
        self.object(key).and_then(|value| serde_json::from_value(value).ok())
    }

    pub fn contains(&self, key: &ObjectKey) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Creates, patches and deletes that reached the store
    pub fn write_count(&self) -> usize {
        *self.writes.lock().unwrap()
    }

    /// Status subresource patches that reached the store
    pub fn status_write_count(&self) -> usize {
        *self.status_writes.lock().unwrap()
    }

    /// Make every `operation` on objects of `kind` fail with `message`
    pub fn fail_on(&self, operation: Operation, kind: &str, message: &str) {
        self.failures.lock().unwrap().push(InjectedFailure {
            operation,
            kind: kind.to_string(),
            mode: FailureMode::Api(message.to_string()),
        });
    }

    /// Make every `operation` on `kind` answer 404, as when the kind is not served
    pub fn not_found_on(&self, operation: Operation, kind: &str) {
        self.failures.lock().unwrap().push(InjectedFailure {
            operation,
            kind: kind.to_string(),
            mode: FailureMode::NotFound,
        });
    }

    fn check_failure(&self, operation: Operation, kind: &str) -> Result<(), ClusterError> {
        let failures = self.failures.lock().unwrap();
        match failures.iter().find(|f| f.operation == operation && f.kind == kind) {
            Some(InjectedFailure { mode: FailureMode::Api(message), .. }) => Err(ClusterError::Api(message.clone())),
            Some(InjectedFailure { mode: FailureMode::NotFound, .. }) => Err(ClusterError::NotFound(kind.to_string())),
            None => Ok(()),
        }
    }

    fn record_write(&self) {
        *self.writes.lock().unwrap() += 1;
    }
}

fn stamp_type_meta(resource: &ResourceType, value: &mut Value) {
    if let Some(map) = value.as_object_mut() {
        map.insert("apiVersion".to_string(), Value::String(resource.api_version()));
        map.insert("kind".to_string(), Value::String(resource.kind.clone()));
    }
}

#[async_trait::async_trait]
impl ClusterClient for MockClusterClient {
    async fn get(&self, key: &ObjectKey) -> Result<Value, ClusterError> {
        self.check_failure(Operation::Get, &key.resource.kind)?;
        self.object(key)
            .ok_or_else(|| ClusterError::NotFound(key.to_string()))
    }

    async fn create(&self, key: &ObjectKey, mut object: Value) -> Result<Value, ClusterError> {
        self.check_failure(Operation::Create, &key.resource.kind)?;
        stamp_type_meta(&key.resource, &mut object);

        let mut objects = self.objects.lock().unwrap();
        if objects.contains_key(key) {
            return Err(ClusterError::Conflict(format!("{key} already exists")));
        }
        objects.insert(key.clone(), object.clone());
        drop(objects);

        self.record_write();
        Ok(object)
    }

    async fn patch(&self, key: &ObjectKey, patch: &json_patch::Patch) -> Result<Value, ClusterError> {
        self.check_failure(Operation::Patch, &key.resource.kind)?;

        let mut objects = self.objects.lock().unwrap();
        let object = objects
            .get_mut(key)
            .ok_or_else(|| ClusterError::NotFound(key.to_string()))?;
        json_patch::patch(object, patch).map_err(|e| ClusterError::InvalidRequest(e.to_string()))?;
        let patched = object.clone();
        drop(objects);

        self.record_write();
        Ok(patched)
    }

    async fn patch_status(&self, key: &ObjectKey, status: Value) -> Result<Value, ClusterError> {
        self.check_failure(Operation::PatchStatus, &key.resource.kind)?;

        let mut objects = self.objects.lock().unwrap();
        let object = objects
            .get_mut(key)
            .ok_or_else(|| ClusterError::NotFound(key.to_string()))?;
        // Only the status stanza is honoured, as on the real subresource
        if let Some(status) = status.get("status") {
            json_patch::merge(object, &serde_json::json!({ "status": status }));
        }
        let patched = object.clone();
        drop(objects);

        *self.status_writes.lock().unwrap() += 1;
        Ok(patched)
    }

    async fn delete(&self, key: &ObjectKey) -> Result<(), ClusterError> {
        self.check_failure(Operation::Delete, &key.resource.kind)?;

        let removed = self.objects.lock().unwrap().remove(key);
        match removed {
            Some(_) => {
                self.record_write();
                Ok(())
            }
            None => Err(ClusterError::NotFound(key.to_string())),
        }
    }

    async fn list(&self, resource: &ResourceType, namespace: Option<&str>) -> Result<Vec<Value>, ClusterError> {
        self.check_failure(Operation::List, &resource.kind)?;

        let objects = self.objects.lock().unwrap();
        let mut items: Vec<(&ObjectKey, &Value)> = objects
            .iter()
            .filter(|(key, _)| &key.resource == resource)
            .filter(|(key, _)| namespace.is_none() || key.namespace.as_deref() == namespace)
            .collect();
        items.sort_by(|a, b| a.0.name.cmp(&b.0.name));
        Ok(items.into_iter().map(|(_, value)| value.clone()).collect())
    }
}
