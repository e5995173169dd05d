//! Kubernetes-backed cluster client
//!
//! Every call goes through `Api<DynamicObject>` built from the key's resource
//! type, so one client serves core kinds, CRDs and third-party kinds alike.

use crate::cluster_trait::ClusterClient;
use crate::error::ClusterError;
use crate::key::{ObjectKey, ResourceType};
use kube::api::{Api, DeleteParams, DynamicObject, ListParams, Patch, PatchParams, PostParams};
use kube::Client;
use serde_json::Value;
use tracing::debug;

/// Cluster client over a live API server
#[derive(Clone)]
pub struct KubeClusterClient {
    client: Client,
}

impl std::fmt::Debug for KubeClusterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeClusterClient").finish_non_exhaustive()
    }
}

impl KubeClusterClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Client from in-cluster config or the local kubeconfig
    pub async fn try_default() -> Result<Self, ClusterError> {
        let client = Client::try_default().await.map_err(ClusterError::Kube)?;
        Ok(Self::new(client))
    }

    fn api(&self, resource: &ResourceType, namespace: Option<&str>) -> Api<DynamicObject> {
        let ar = resource.api_resource();
        match namespace {
            Some(ns) => Api::namespaced_with(self.client.clone(), ns, &ar),
            None => Api::all_with(self.client.clone(), &ar),
        }
    }
}

#[async_trait::async_trait]
impl ClusterClient for KubeClusterClient {
    async fn get(&self, key: &ObjectKey) -> Result<Value, ClusterError> {
        let api = self.api(&key.resource, key.namespace.as_deref());
        let object = api
            .get(&key.name)
            .await
            .map_err(|e| ClusterError::from_kube(e, key))?;
        Ok(serde_json::to_value(object)?)
    }

    async fn create(&self, key: &ObjectKey, object: Value) -> Result<Value, ClusterError> {
        let api = self.api(&key.resource, key.namespace.as_deref());
        let mut object: DynamicObject = serde_json::from_value(object)?;
        if object.types.is_none() {
            object.types = Some(kube::core::TypeMeta {
                api_version: key.resource.api_version(),
                kind: key.resource.kind.clone(),
            });
        }

        debug!(object = %key, "Creating object");
        let created = api
            .create(&PostParams::default(), &object)
            .await
            .map_err(|e| ClusterError::from_kube(e, key))?;
        Ok(serde_json::to_value(created)?)
    }

    async fn patch(&self, key: &ObjectKey, patch: &json_patch::Patch) -> Result<Value, ClusterError> {
        let api = self.api(&key.resource, key.namespace.as_deref());

        debug!(object = %key, operations = patch.0.len(), "Patching object");
        let patched = api
            .patch(&key.name, &PatchParams::default(), &Patch::<()>::Json(patch.clone()))
            .await
            .map_err(|e| ClusterError::from_kube(e, key))?;
        Ok(serde_json::to_value(patched)?)
    }

    async fn patch_status(&self, key: &ObjectKey, status: Value) -> Result<Value, ClusterError> {
        let api = self.api(&key.resource, key.namespace.as_deref());

        let patched = api
            .patch_status(&key.name, &PatchParams::default(), &Patch::Merge(&status))
            .await
            .map_err(|e| ClusterError::from_kube(e, key))?;
        Ok(serde_json::to_value(patched)?)
    }

    async fn delete(&self, key: &ObjectKey) -> Result<(), ClusterError> {
        let api = self.api(&key.resource, key.namespace.as_deref());

        debug!(object = %key, "Deleting object");
        api.delete(&key.name, &DeleteParams::background())
            .await
            .map_err(|e| ClusterError::from_kube(e, key))?;
        Ok(())
    }

    async fn list(&self, resource: &ResourceType, namespace: Option<&str>) -> Result<Vec<Value>, ClusterError> {
        let api = self.api(resource, namespace);
        let target = match namespace {
            Some(ns) => format!("{} in {ns}", resource.kind),
            None => resource.kind.clone(),
        };
        let list = api
            .list(&ListParams::default())
            .await
            .map_err(|e| ClusterError::from_kube(e, target))?;

        list.items
            .into_iter()
            .map(|item| serde_json::to_value(item).map_err(ClusterError::from))
            .collect()
    }
}
