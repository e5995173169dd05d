//! NVIDIA network operator.
//!
//! Subscribes to the network operator through OLM in the addon namespace and
//! creates the namespace its operands run in. Teardown also removes the CSV
//! OLM installed, which is only known by its package-name prefix.

use super::{ResourceReconciler, StepResult, combine, delete_object, fetch, upsert};
use crate::condition;
use crate::config::AddonConfig;
use crate::error::ControllerError;
use crate::{metrics, owner};
use cluster_client::{ClusterClient, DeleteOutcome, ObjectKey, Target, apply};
use crds::{Approval, ClusterServiceVersion, GPUAddon, Subscription, SubscriptionSpec};
use k8s_openapi::api::core::v1::Namespace;
use std::sync::Arc;
use tracing::{debug, info};

pub const CONDITION_TYPE: &str = "NetworkOperatorDeployed";

pub const PACKAGE_NAME: &str = "nvidia-network-operator";
pub const SUBSCRIPTION_NAME: &str = "nvidia-network-operator";
pub const RESOURCES_NAMESPACE: &str = "nvidia-network-operator-resources";
pub const CATALOG_SOURCE: &str = "certified-operators";
pub const CATALOG_SOURCE_NAMESPACE: &str = "openshift-marketplace";

#[derive(Debug)]
pub struct NetworkOperatorReconciler {
    config: Arc<AddonConfig>,
}

impl NetworkOperatorReconciler {
    pub fn new(config: Arc<AddonConfig>) -> Self {
        Self { config }
    }

    fn subscription_key(&self) -> ObjectKey {
        ObjectKey::namespaced::<Subscription>(&self.config.addon_namespace, SUBSCRIPTION_NAME)
    }

    fn namespace_key(&self) -> ObjectKey {
        ObjectKey::cluster::<Namespace>(RESOURCES_NAMESPACE)
    }

    async fn reconcile_subscription(&self, client: &dyn ClusterClient, addon: &GPUAddon) -> StepResult {
        let key = self.subscription_key();
        let existing = fetch::<Subscription>(client, &key, CONDITION_TYPE).await?;

        if let Some(status) = existing.as_ref().and_then(|s| s.status.as_ref()) {
            metrics::set_network_operator_subscription(
                status.current_csv.as_deref().unwrap_or_default(),
                status.installed_csv.as_deref().unwrap_or_default(),
            );
        }

        let target = Target::resolve(existing, || {
            let mut subscription = Subscription::new(&key.name, SubscriptionSpec::default());
            subscription.metadata.namespace = key.namespace.clone();
            subscription
        });

        let channel = self.config.network_operator_channel.clone();
        let result = upsert(client, &key, target, CONDITION_TYPE, |s: &mut Subscription| {
            s.spec.catalog_source = CATALOG_SOURCE.to_string();
            s.spec.catalog_source_namespace = CATALOG_SOURCE_NAMESPACE.to_string();
            s.spec.package = PACKAGE_NAME.to_string();
            s.spec.channel = Some(channel);
            s.spec.install_plan_approval = Some(Approval::Automatic);
            owner::set_controller_reference(addon, &mut s.metadata)?;
            Ok(())
        })
        .await?;

        info!(
            step = "NetworkOperator Subscription",
            object = %key,
            result = %result,
            "NetworkOperator Subscription reconciled successfully"
        );
        Ok(Vec::new())
    }

    async fn reconcile_namespace(&self, client: &dyn ClusterClient) -> StepResult {
        let key = self.namespace_key();
        let existing = fetch::<Namespace>(client, &key, CONDITION_TYPE).await?;
        let target = Target::resolve(existing, || Namespace {
            metadata: key.object_meta(),
            ..Default::default()
        });

        // Only existence matters; labels and annotations set by others stay
        let result = upsert(client, &key, target, CONDITION_TYPE, |_: &mut Namespace| Ok(())).await?;

        info!(
            step = "NetworkOperator Resources Namespace",
            object = %key,
            result = %result,
            "NetworkOperator Resources Namespace reconciled successfully"
        );
        Ok(Vec::new())
    }

    async fn delete_csvs(&self, client: &dyn ClusterClient) -> Result<DeleteOutcome, ControllerError> {
        let namespace = self.config.addon_namespace.as_str();
        let csvs = apply::list_with_prefix::<ClusterServiceVersion>(client, Some(namespace), PACKAGE_NAME)
            .await
            .map_err(|source| ControllerError::DeleteFailed {
                kind: "ClusterServiceVersion".to_string(),
                name: format!("{PACKAGE_NAME}*"),
                source,
            })?;

        if csvs.is_empty() {
            debug!(namespace, prefix = PACKAGE_NAME, "No NetworkOperator CSV left to delete");
        }

        let mut outcomes = Vec::with_capacity(csvs.len());
        for csv in &csvs {
            outcomes.push(delete_object(client, &ObjectKey::for_object(csv)).await?);
        }
        Ok(combine(&outcomes))
    }
}

#[async_trait::async_trait]
impl ResourceReconciler for NetworkOperatorReconciler {
    fn step(&self) -> &'static str {
        "NetworkOperator"
    }

    async fn reconcile(&self, client: &dyn ClusterClient, addon: &GPUAddon) -> StepResult {
        self.reconcile_subscription(client, addon).await?;
        self.reconcile_namespace(client).await?;

        Ok(vec![condition::success(CONDITION_TYPE, "NetworkOperator deployed successfully")])
    }

    async fn delete(&self, client: &dyn ClusterClient) -> Result<DeleteOutcome, ControllerError> {
        // Subscription first so OLM does not reinstall the CSV
        let subscription = delete_object(client, &self.subscription_key()).await?;
        let csvs = self.delete_csvs(client).await?;
        let namespace = delete_object(client, &self.namespace_key()).await?;

        metrics::clear_network_operator_subscription();
        Ok(combine(&[subscription, csvs, namespace]))
    }
}
