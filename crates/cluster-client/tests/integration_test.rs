//! Integration tests for the cluster client
//!
//! These tests require a reachable cluster (in-cluster config or KUBECONFIG).
//! Set TEST_NAMESPACE to choose the namespace used (defaults to "default").

use cluster_client::{apply, ClusterClient, DeleteOutcome, KubeClusterClient, ObjectKey, OperationResult, Target};
use k8s_openapi::api::core::v1::ConfigMap;
use std::collections::BTreeMap;

fn test_namespace() -> String {
    std::env::var("TEST_NAMESPACE").unwrap_or_else(|_| "default".to_string())
}

#[tokio::test]
#[ignore] // Requires a running cluster
async fn test_client_creation() {
    let client = KubeClusterClient::try_default().await.expect("Failed to create client");

    let key = ObjectKey::namespaced::<ConfigMap>(&test_namespace(), "kube-root-ca.crt");
    let value = client.get(&key).await;
    assert!(value.is_ok(), "Failed to fetch kube-root-ca.crt");
}

#[tokio::test]
#[ignore]
async fn test_create_or_patch_round() -> anyhow::Result<()> {
    let client = KubeClusterClient::try_default().await?;
    let key = ObjectKey::namespaced::<ConfigMap>(&test_namespace(), "cluster-client-it");
    apply::delete(&client, &key).await?;

    let mut outcomes = Vec::new();
    for value in ["one", "one", "two"] {
        let existing = apply::get::<ConfigMap>(&client, &key).await?;
        let target = Target::resolve(existing, || ConfigMap {
            metadata: key.object_meta(),
            ..Default::default()
        });
        let result = apply::create_or_patch(&client, &key, target, |cm: &mut ConfigMap| {
            cm.data = Some(BTreeMap::from([("value".to_string(), value.to_string())]));
            Ok::<_, cluster_client::ClusterError>(())
        })
        .await?;
        outcomes.push(result);
    }

    assert_eq!(
        outcomes,
        vec![OperationResult::Created, OperationResult::Unchanged, OperationResult::Updated]
    );
    assert_eq!(apply::delete(&client, &key).await?, DeleteOutcome::Deleted);
    assert_eq!(apply::delete(&client, &key).await?, DeleteOutcome::AlreadyAbsent);
    Ok(())
}
