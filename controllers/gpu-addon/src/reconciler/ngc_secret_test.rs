//! Unit tests for the NGC secret reconciler

#[cfg(test)]
mod tests {
    use super::super::ngc_secret::*;
    use super::super::ResourceReconciler;
    use crate::condition::reasons;
    use crate::test_utils::*;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use cluster_client::{DeleteOutcome, MockClusterClient, ObjectKey, Operation};
    use crds::ConditionStatus;
    use k8s_openapi::ByteString;
    use k8s_openapi::api::core::v1::Secret;

    fn secret_key() -> ObjectKey {
        ObjectKey::namespaced::<Secret>(TEST_NAMESPACE, SECRET_NAME)
    }

    fn reconciler() -> NgcSecretReconciler {
        NgcSecretReconciler::new(test_config())
    }

    #[tokio::test]
    async fn test_parameters_secret_absent_is_informational() {
        let client = MockClusterClient::new();
        let addon = test_addon("gpu-addon", TEST_NAMESPACE, None);

        let conditions = reconciler().reconcile(&client, &addon).await.unwrap();

        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].type_, CONDITION_TYPE);
        assert_eq!(conditions[0].status, ConditionStatus::True);
        assert_eq!(conditions[0].reason, reasons::ADDON_PARAMETERS_SECRET_NOT_PRESENT);
        assert!(!client.contains(&secret_key()));
    }

    #[tokio::test]
    async fn test_missing_api_key_is_not_valid() {
        let client = MockClusterClient::new();
        client.insert(&test_parameters_secret(TEST_NAMESPACE, &[("ngc-email", "an-email")]));
        let addon = test_addon("gpu-addon", TEST_NAMESPACE, None);

        let conditions = reconciler().reconcile(&client, &addon).await.unwrap();

        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].status, ConditionStatus::True);
        assert_eq!(conditions[0].reason, reasons::ADDON_PARAMETERS_SECRET_NOT_VALID);
        assert!(conditions[0].message.contains("ngc-api-key"));
        assert!(!client.contains(&secret_key()));
        assert_eq!(client.write_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_email_is_not_valid() {
        let client = MockClusterClient::new();
        client.insert(&test_parameters_secret(
            TEST_NAMESPACE,
            &[("ngc-api-key", "a-key"), ("ngc-email", "")],
        ));
        let addon = test_addon("gpu-addon", TEST_NAMESPACE, None);

        let conditions = reconciler().reconcile(&client, &addon).await.unwrap();
        assert_eq!(conditions[0].reason, reasons::ADDON_PARAMETERS_SECRET_NOT_VALID);
        assert!(!client.contains(&secret_key()));
    }

    #[tokio::test]
    async fn test_non_utf8_parameter_is_not_valid() {
        let client = MockClusterClient::new();
        let mut parameters = test_parameters_secret(TEST_NAMESPACE, &[("ngc-email", "an-email")]);
        parameters
            .data
            .as_mut()
            .unwrap()
            .insert("ngc-api-key".to_string(), ByteString(vec![0x61, 0xff, 0xfe]));
        client.insert(&parameters);
        let addon = test_addon("gpu-addon", TEST_NAMESPACE, None);

        let conditions = reconciler().reconcile(&client, &addon).await.unwrap();

        assert_eq!(conditions[0].reason, reasons::ADDON_PARAMETERS_SECRET_NOT_VALID);
        assert!(conditions[0].message.contains("ngc-api-key parameter is not valid UTF-8"));
        assert!(!client.contains(&secret_key()));
    }

    #[tokio::test]
    async fn test_creates_docker_config_secret() {
        let client = MockClusterClient::new();
        client.insert(&test_parameters_secret(
            TEST_NAMESPACE,
            &[("ngc-api-key", "a-key"), ("ngc-email", "an-email")],
        ));
        let addon = test_addon("gpu-addon", TEST_NAMESPACE, None);

        let conditions = reconciler().reconcile(&client, &addon).await.unwrap();
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].reason, reasons::SUCCESS);

        let secret: Secret = client.typed(&secret_key()).unwrap();
        assert_eq!(secret.type_.as_deref(), Some(DOCKER_CONFIG_JSON_TYPE));

        let payload = &secret.data.unwrap()[DOCKER_CONFIG_JSON_KEY];
        let config: serde_json::Value = serde_json::from_slice(&payload.0).unwrap();
        let auth = &config["auths"]["nvcr.io"];
        assert_eq!(auth["username"], DOCKER_USERNAME);
        assert_eq!(auth["password"], "a-key");
        assert_eq!(auth["email"], "an-email");
        assert_eq!(auth["auth"], STANDARD.encode(format!("{DOCKER_USERNAME}:a-key")));

        let owners = secret.metadata.owner_references.unwrap();
        assert_eq!(owners[0].name, "gpu-addon");
    }

    #[tokio::test]
    async fn test_reconcile_is_idempotent() {
        let client = MockClusterClient::new();
        client.insert(&test_parameters_secret(
            TEST_NAMESPACE,
            &[("ngc-api-key", "a-key"), ("ngc-email", "an-email")],
        ));
        let addon = test_addon("gpu-addon", TEST_NAMESPACE, None);

        reconciler().reconcile(&client, &addon).await.unwrap();
        let first = client.object(&secret_key()).unwrap();
        reconciler().reconcile(&client, &addon).await.unwrap();

        assert_eq!(client.object(&secret_key()).unwrap(), first);
        assert_eq!(client.write_count(), 1);
    }

    #[tokio::test]
    async fn test_rotated_key_is_patched() {
        let client = MockClusterClient::new();
        client.insert(&test_parameters_secret(
            TEST_NAMESPACE,
            &[("ngc-api-key", "a-key"), ("ngc-email", "an-email")],
        ));
        let addon = test_addon("gpu-addon", TEST_NAMESPACE, None);
        reconciler().reconcile(&client, &addon).await.unwrap();

        client.insert(&test_parameters_secret(
            TEST_NAMESPACE,
            &[("ngc-api-key", "b-key"), ("ngc-email", "an-email")],
        ));
        reconciler().reconcile(&client, &addon).await.unwrap();

        let secret: Secret = client.typed(&secret_key()).unwrap();
        let payload = &secret.data.unwrap()[DOCKER_CONFIG_JSON_KEY];
        let config: serde_json::Value = serde_json::from_slice(&payload.0).unwrap();
        assert_eq!(config["auths"]["nvcr.io"]["password"], "b-key");
        assert_eq!(client.write_count(), 2);
    }

    #[tokio::test]
    async fn test_secret_of_other_type_is_replaced() {
        let client = MockClusterClient::new();
        client.insert(&test_parameters_secret(
            TEST_NAMESPACE,
            &[("ngc-api-key", "a-key"), ("ngc-email", "an-email")],
        ));
        client.insert(&Secret {
            metadata: secret_key().object_meta(),
            type_: Some("Opaque".to_string()),
            ..Default::default()
        });
        let addon = test_addon("gpu-addon", TEST_NAMESPACE, None);

        let conditions = reconciler().reconcile(&client, &addon).await.unwrap();
        assert_eq!(conditions[0].reason, reasons::SUCCESS);

        let secret: Secret = client.typed(&secret_key()).unwrap();
        assert_eq!(secret.type_.as_deref(), Some(DOCKER_CONFIG_JSON_TYPE));
        assert!(secret.data.unwrap().contains_key(DOCKER_CONFIG_JSON_KEY));
        // delete + create
        assert_eq!(client.write_count(), 2);
    }

    #[tokio::test]
    async fn test_fetch_failure_fails_step() {
        let client = MockClusterClient::new();
        client.fail_on(Operation::Get, "Secret", "apiserver timeout");
        let addon = test_addon("gpu-addon", TEST_NAMESPACE, None);

        let failure = reconciler().reconcile(&client, &addon).await.unwrap_err();

        assert_eq!(failure.conditions.len(), 1);
        assert_eq!(failure.conditions[0].status, ConditionStatus::False);
        assert_eq!(failure.conditions[0].reason, reasons::FETCH_FAILED);
        assert!(failure.conditions[0].message.contains("apiserver timeout"));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let client = MockClusterClient::new();
        client.insert(&test_parameters_secret(
            TEST_NAMESPACE,
            &[("ngc-api-key", "a-key"), ("ngc-email", "an-email")],
        ));
        let addon = test_addon("gpu-addon", TEST_NAMESPACE, None);
        reconciler().reconcile(&client, &addon).await.unwrap();

        assert_eq!(reconciler().delete(&client).await.unwrap(), DeleteOutcome::Deleted);
        assert_eq!(reconciler().delete(&client).await.unwrap(), DeleteOutcome::AlreadyAbsent);
        assert!(!client.contains(&secret_key()));
        // The parameters secret belongs to the add-on installer, not to us
        assert_eq!(client.len(), 1);
    }
}
