//! Unit tests for the typed apply helpers

#[cfg(test)]
mod tests {
    use crate::apply::{self, DeleteOutcome, OperationResult, Target};
    use crate::error::ClusterError;
    use crate::key::ObjectKey;
    use crate::mock::{MockClusterClient, Operation};
    use k8s_openapi::api::core::v1::{ConfigMap, Namespace};
    use std::collections::BTreeMap;

    fn config_map_key() -> ObjectKey {
        ObjectKey::namespaced::<ConfigMap>("addon-ns", "settings")
    }

    fn desired(cm: &mut ConfigMap) -> Result<(), ClusterError> {
        cm.data = Some(BTreeMap::from([("mode".to_string(), "fast".to_string())]));
        Ok(())
    }

    async fn upsert(client: &MockClusterClient) -> Result<OperationResult, ClusterError> {
        let key = config_map_key();
        let existing = apply::get::<ConfigMap>(client, &key).await?;
        let target = Target::resolve(existing, || ConfigMap {
            metadata: key.object_meta(),
            ..Default::default()
        });
        apply::create_or_patch(client, &key, target, desired).await
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let client = MockClusterClient::new();
        let found = apply::get::<ConfigMap>(&client, &config_map_key()).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_get_propagates_other_errors() {
        let client = MockClusterClient::new();
        client.fail_on(Operation::Get, "ConfigMap", "etcd unavailable");

        let err = apply::get::<ConfigMap>(&client, &config_map_key()).await.unwrap_err();
        assert!(matches!(err, ClusterError::Api(ref msg) if msg == "etcd unavailable"));
    }

    #[tokio::test]
    async fn test_create_then_unchanged() {
        let client = MockClusterClient::new();

        assert_eq!(upsert(&client).await.unwrap(), OperationResult::Created);
        assert_eq!(upsert(&client).await.unwrap(), OperationResult::Unchanged);
        assert_eq!(client.write_count(), 1);

        let stored: ConfigMap = client.typed(&config_map_key()).unwrap();
        assert_eq!(stored.data.unwrap()["mode"], "fast");
    }

    #[tokio::test]
    async fn test_drift_is_patched_and_foreign_fields_kept() {
        let client = MockClusterClient::new();
        let mut existing = ConfigMap {
            metadata: config_map_key().object_meta(),
            data: Some(BTreeMap::from([("mode".to_string(), "slow".to_string())])),
            ..Default::default()
        };
        existing.metadata.labels = Some(BTreeMap::from([("team".to_string(), "gpu".to_string())]));
        client.insert(&existing);

        assert_eq!(upsert(&client).await.unwrap(), OperationResult::Updated);

        let stored: ConfigMap = client.typed(&config_map_key()).unwrap();
        assert_eq!(stored.data.unwrap()["mode"], "fast");
        assert_eq!(stored.metadata.labels.unwrap()["team"], "gpu");
    }

    #[tokio::test]
    async fn test_mutate_error_skips_write() {
        let client = MockClusterClient::new();
        let key = config_map_key();
        let target = Target::New(ConfigMap {
            metadata: key.object_meta(),
            ..Default::default()
        });

        let result = apply::create_or_patch(&client, &key, target, |_cm: &mut ConfigMap| {
            Err(ClusterError::InvalidRequest("bad input".to_string()))
        })
        .await;

        assert!(matches!(result, Err(ClusterError::InvalidRequest(_))));
        assert!(client.is_empty());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let client = MockClusterClient::new();
        let key = ObjectKey::cluster::<Namespace>("scratch");
        client.insert(&Namespace {
            metadata: key.object_meta(),
            ..Default::default()
        });

        assert_eq!(apply::delete(&client, &key).await.unwrap(), DeleteOutcome::Deleted);
        assert_eq!(apply::delete(&client, &key).await.unwrap(), DeleteOutcome::AlreadyAbsent);
        assert!(!client.contains(&key));
    }

    #[tokio::test]
    async fn test_list_with_prefix_filters_namespace_and_name() {
        let client = MockClusterClient::new();
        for (ns, name) in [
            ("addon-ns", "nvidia-network-operator.v1.1.0"),
            ("addon-ns", "gpu-operator-certified.v1.11.0"),
            ("other-ns", "nvidia-network-operator.v1.0.0"),
        ] {
            client.insert(&ConfigMap {
                metadata: ObjectKey::namespaced::<ConfigMap>(ns, name).object_meta(),
                ..Default::default()
            });
        }

        let found = apply::list_with_prefix::<ConfigMap>(&client, Some("addon-ns"), "nvidia-network-operator")
            .await
            .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(
            found[0].metadata.name.as_deref(),
            Some("nvidia-network-operator.v1.1.0")
        );
    }

    #[tokio::test]
    async fn test_list_with_prefix_unserved_kind_is_empty() {
        let client = MockClusterClient::new();
        client.not_found_on(Operation::List, "ConfigMap");

        let found = apply::list_with_prefix::<ConfigMap>(&client, Some("addon-ns"), "nvidia-network-operator")
            .await
            .unwrap();

        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_list_with_prefix_propagates_other_errors() {
        let client = MockClusterClient::new();
        client.fail_on(Operation::List, "ConfigMap", "forbidden");

        let err = apply::list_with_prefix::<ConfigMap>(&client, Some("addon-ns"), "nvidia-network-operator")
            .await
            .unwrap_err();

        assert!(matches!(err, ClusterError::Api(ref msg) if msg == "forbidden"));
    }
}
