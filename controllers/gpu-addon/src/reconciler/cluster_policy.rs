//! GPU operator ClusterPolicy.
//!
//! Deploys the DCGM metrics ConfigMap first, then the cluster-scoped
//! ClusterPolicy whose DCGM exporter references it. The ConfigMap is owned by
//! the add-on; the ClusterPolicy cannot be and is removed on teardown.

use super::{ResourceReconciler, StepResult, combine, delete_object, fetch, upsert};
use crate::condition;
use crate::config::AddonConfig;
use crate::error::ControllerError;
use crate::owner;
use cluster_client::{ClusterClient, DeleteOutcome, ObjectKey, Target};
use crds::{
    ClusterPolicy, ClusterPolicySpec, ComponentToggle, DCGMExporterMetricsConfig, DCGMExporterSpec,
    DriverLicensingConfigSpec, DriverSpec, EnvVar, GPUAddon, MIGSpec, OperatorSpec, ValidatorSpec,
};
use k8s_openapi::api::core::v1::ConfigMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

pub const CONDITION_TYPE: &str = "ClusterPolicyDeployed";

pub const DCGM_METRICS_CONFIG_MAP_NAME: &str = "custom-dcgm-metrics";
pub const DCGM_METRICS_CONFIG_KEY: &str = "dcgm-metrics.csv";

/// Metrics exported by dcgm-exporter, `field, type, help` per line
pub const DEFAULT_DCGM_METRICS: &str = "\
DCGM_FI_PROF_GR_ENGINE_ACTIVE, gauge, gpu utilization.
DCGM_FI_DEV_MEM_COPY_UTIL, gauge, mem utilization.
DCGM_FI_DEV_ENC_UTIL, gauge, enc utilization.
DCGM_FI_DEV_DEC_UTIL, gauge, dec utilization.
DCGM_FI_DEV_POWER_USAGE, gauge, power usage.
DCGM_FI_DEV_POWER_MGMT_LIMIT_MAX, gauge, power mgmt limit.
DCGM_FI_DEV_GPU_TEMP, gauge, gpu temp.
DCGM_FI_DEV_SM_CLOCK, gauge, sm clock.
DCGM_FI_DEV_MAX_SM_CLOCK, gauge, max sm clock.
DCGM_FI_DEV_MEM_CLOCK, gauge, mem clock.
DCGM_FI_DEV_MAX_MEM_CLOCK, gauge, max mem clock.
";

pub const DEFAULT_RUNTIME: &str = "crio";
pub const MIG_STRATEGY: &str = "single";
pub const VALIDATOR_WORKLOAD_ENV: &str = "WITH_WORKLOAD";

#[derive(Debug)]
pub struct ClusterPolicyReconciler {
    config: Arc<AddonConfig>,
}

impl ClusterPolicyReconciler {
    pub fn new(config: Arc<AddonConfig>) -> Self {
        Self { config }
    }

    fn config_map_key(&self) -> ObjectKey {
        ObjectKey::namespaced::<ConfigMap>(&self.config.addon_namespace, DCGM_METRICS_CONFIG_MAP_NAME)
    }

    fn cluster_policy_key(&self) -> ObjectKey {
        ObjectKey::cluster::<ClusterPolicy>(&self.config.cluster_policy_name)
    }

    async fn reconcile_config_map(&self, client: &dyn ClusterClient, addon: &GPUAddon) -> StepResult {
        let key = self.config_map_key();
        let existing = fetch::<ConfigMap>(client, &key, CONDITION_TYPE).await?;
        let target = Target::resolve(existing, || ConfigMap {
            metadata: key.object_meta(),
            ..Default::default()
        });

        let result = upsert(client, &key, target, CONDITION_TYPE, |cm: &mut ConfigMap| {
            cm.data
                .get_or_insert_with(BTreeMap::new)
                .insert(DCGM_METRICS_CONFIG_KEY.to_string(), DEFAULT_DCGM_METRICS.to_string());
            owner::set_controller_reference(addon, &mut cm.metadata)?;
            Ok(())
        })
        .await?;

        info!(step = self.step(), object = %key, result = %result, "DCGM metrics ConfigMap reconciled");
        Ok(Vec::new())
    }
}

/// Bring `spec` to the add-on's GPU operator settings.
///
/// Only the fields the add-on owns are written; anything else already on the
/// object is left as found.
pub fn set_desired_cluster_policy(spec: &mut ClusterPolicySpec, rdma_enabled: bool) {
    spec.operator
        .get_or_insert_with(OperatorSpec::default)
        .default_runtime = Some(DEFAULT_RUNTIME.to_string());

    spec.psp = Some(ComponentToggle::enabled(false));
    spec.toolkit = Some(ComponentToggle::enabled(true));
    spec.dcgm = Some(ComponentToggle::enabled(true));
    spec.mig_manager = Some(ComponentToggle::enabled(true));
    spec.node_status_exporter = Some(ComponentToggle::enabled(true));

    spec.dcgm_exporter
        .get_or_insert_with(DCGMExporterSpec::default)
        .metrics_config = Some(DCGMExporterMetricsConfig {
        name: DCGM_METRICS_CONFIG_MAP_NAME.to_string(),
    });

    spec.mig.get_or_insert_with(MIGSpec::default).strategy = Some(MIG_STRATEGY.to_string());

    let validator = spec.validator.get_or_insert_with(ValidatorSpec::default);
    match validator.env.iter_mut().find(|e| e.name == VALIDATOR_WORKLOAD_ENV) {
        Some(env) => env.value = "true".to_string(),
        None => validator.env.push(EnvVar {
            name: VALIDATOR_WORKLOAD_ENV.to_string(),
            value: "true".to_string(),
        }),
    }

    let driver = spec.driver.get_or_insert_with(DriverSpec::default);
    driver.enabled = Some(true);
    driver.use_openshift_driver_toolkit = Some(true);
    driver.gpu_direct_rdma = Some(ComponentToggle::enabled(rdma_enabled));
    driver
        .licensing_config
        .get_or_insert_with(DriverLicensingConfigSpec::default)
        .nls_enabled = Some(false);
}

#[async_trait::async_trait]
impl ResourceReconciler for ClusterPolicyReconciler {
    fn step(&self) -> &'static str {
        "ClusterPolicy"
    }

    async fn reconcile(&self, client: &dyn ClusterClient, addon: &GPUAddon) -> StepResult {
        self.reconcile_config_map(client, addon).await?;

        let key = self.cluster_policy_key();
        let existing = fetch::<ClusterPolicy>(client, &key, CONDITION_TYPE).await?;
        let target = Target::resolve(existing, || {
            ClusterPolicy::new(&key.name, ClusterPolicySpec::default())
        });

        let rdma_enabled = addon.spec.rdma.is_some();
        let result = upsert(client, &key, target, CONDITION_TYPE, |policy: &mut ClusterPolicy| {
            set_desired_cluster_policy(&mut policy.spec, rdma_enabled);
            Ok(())
        })
        .await?;

        info!(
            step = self.step(),
            object = %key,
            rdma = rdma_enabled,
            result = %result,
            "ClusterPolicy reconciled successfully"
        );
        Ok(vec![condition::success(CONDITION_TYPE, "ClusterPolicy deployed successfully")])
    }

    async fn delete(&self, client: &dyn ClusterClient) -> Result<DeleteOutcome, ControllerError> {
        let policy = delete_object(client, &self.cluster_policy_key()).await?;
        let config_map = delete_object(client, &self.config_map_key()).await?;
        Ok(combine(&[policy, config_map]))
    }
}
