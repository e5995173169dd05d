//! NicClusterPolicy (RDMA only).
//!
//! Deploys MOFED plus the RDMA shared and SR-IOV device plugins through the
//! network operator. The RDMA shared device plugin exposes one resource per
//! device configured on the add-on.

use super::{ResourceReconciler, StepResult, delete_object, fetch, upsert};
use crate::condition::{self, reasons};
use crate::error::ControllerError;
use cluster_client::{ClusterClient, DeleteOutcome, ObjectKey, Target};
use crds::{
    DevicePluginSpec, GPUAddon, ImageSpec, NicClusterPolicy, NicClusterPolicySpec, OFEDDriverSpec,
    RDMASpec,
};
use kube::ResourceExt;
use serde::Serialize;
use tracing::info;

pub const CONDITION_TYPE: &str = "NicClusterPolicyDeployed";
pub const NIC_CLUSTER_POLICY_NAME: &str = "nic-cluster-policy";

const OFED_REPOSITORY: &str = "nvcr.io/nvidia/mellanox";
const OFED_IMAGE: &str = "mofed";
const OFED_VERSION: &str = "5.6-1.0.3.3";

const RDMA_SHARED_DEVICE_PLUGIN_REPOSITORY: &str = "nvcr.io/nvidia/cloud-native";
const RDMA_SHARED_DEVICE_PLUGIN_IMAGE: &str = "k8s-rdma-shared-dev-plugin";
const RDMA_SHARED_DEVICE_PLUGIN_VERSION: &str = "v1.3.2";
const RDMA_HCA_MAX: u32 = 1000;

const SRIOV_DEVICE_PLUGIN_REPOSITORY: &str = "ghcr.io/k8snetworkplumbingwg";
const SRIOV_DEVICE_PLUGIN_IMAGE: &str = "sriov-network-device-plugin";
const SRIOV_DEVICE_PLUGIN_VERSION: &str = "v3.4.0";

/// Mellanox PCI vendor id
const MELLANOX_VENDOR_ID: &str = "15b3";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RdmaSharedDevicePluginConfig {
    config_list: Vec<RdmaResourceConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RdmaResourceConfig {
    resource_name: String,
    rdma_hca_max: u32,
    selectors: RdmaSelectors,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RdmaSelectors {
    if_names: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SriovDevicePluginConfig {
    resource_list: Vec<SriovResourceConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SriovResourceConfig {
    resource_prefix: &'static str,
    resource_name: &'static str,
    selectors: SriovSelectors,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SriovSelectors {
    vendors: Vec<&'static str>,
    is_rdma: bool,
}

/// RDMA shared device plugin config, one resource per add-on device
pub fn rdma_shared_device_plugin_config(rdma: &RDMASpec) -> Result<String, ControllerError> {
    let mut config_list = Vec::with_capacity(rdma.devices.len());
    for device in &rdma.devices {
        if device.resource_name.is_empty() {
            return Err(ControllerError::InvalidInput(
                "RDMA device resourceName must not be empty".to_string(),
            ));
        }
        config_list.push(RdmaResourceConfig {
            resource_name: device.resource_name.clone(),
            rdma_hca_max: RDMA_HCA_MAX,
            selectors: RdmaSelectors {
                if_names: device.selectors.if_names.clone(),
            },
        });
    }

    Ok(serde_json::to_string(&RdmaSharedDevicePluginConfig { config_list })?)
}

/// SR-IOV device plugin config exposing RDMA-capable Mellanox NICs as `nvidia.com/hostdev`
pub fn sriov_device_plugin_config() -> Result<String, ControllerError> {
    let config = SriovDevicePluginConfig {
        resource_list: vec![SriovResourceConfig {
            resource_prefix: "nvidia.com",
            resource_name: "hostdev",
            selectors: SriovSelectors {
                vendors: vec![MELLANOX_VENDOR_ID],
                is_rdma: true,
            },
        }],
    };
    Ok(serde_json::to_string(&config)?)
}

pub fn set_desired_nic_cluster_policy(
    spec: &mut NicClusterPolicySpec,
    rdma: &RDMASpec,
) -> Result<(), ControllerError> {
    spec.ofed_driver = Some(OFEDDriverSpec {
        image: ImageSpec::new(OFED_REPOSITORY, OFED_IMAGE, OFED_VERSION),
    });
    spec.rdma_shared_device_plugin = Some(DevicePluginSpec {
        image: ImageSpec::new(
            RDMA_SHARED_DEVICE_PLUGIN_REPOSITORY,
            RDMA_SHARED_DEVICE_PLUGIN_IMAGE,
            RDMA_SHARED_DEVICE_PLUGIN_VERSION,
        ),
        config: Some(rdma_shared_device_plugin_config(rdma)?),
    });
    spec.sriov_device_plugin = Some(DevicePluginSpec {
        image: ImageSpec::new(
            SRIOV_DEVICE_PLUGIN_REPOSITORY,
            SRIOV_DEVICE_PLUGIN_IMAGE,
            SRIOV_DEVICE_PLUGIN_VERSION,
        ),
        config: Some(sriov_device_plugin_config()?),
    });
    Ok(())
}

#[derive(Debug, Default)]
pub struct NicClusterPolicyReconciler;

impl NicClusterPolicyReconciler {
    pub fn new() -> Self {
        Self
    }

    fn key(&self) -> ObjectKey {
        ObjectKey::cluster::<NicClusterPolicy>(NIC_CLUSTER_POLICY_NAME)
    }
}

#[async_trait::async_trait]
impl ResourceReconciler for NicClusterPolicyReconciler {
    fn step(&self) -> &'static str {
        "NicClusterPolicy CR"
    }

    async fn reconcile(&self, client: &dyn ClusterClient, addon: &GPUAddon) -> StepResult {
        let Some(rdma) = addon.spec.rdma.as_ref() else {
            info!(
                step = self.step(),
                addon = %addon.name_any(),
                "NicClusterPolicy CR will not be reconciled as GPUAddon RDMA is not configured"
            );
            return Ok(vec![condition::skipped(
                CONDITION_TYPE,
                reasons::NOT_CONFIGURED,
                "GPUAddon RDMA is not configured, the NicClusterPolicy CR won't be deployed",
            )]);
        };

        let key = self.key();
        let existing = fetch::<NicClusterPolicy>(client, &key, CONDITION_TYPE).await?;
        let target = Target::resolve(existing, || {
            NicClusterPolicy::new(&key.name, NicClusterPolicySpec::default())
        });

        let result = upsert(client, &key, target, CONDITION_TYPE, |policy: &mut NicClusterPolicy| {
            set_desired_nic_cluster_policy(&mut policy.spec, rdma)
        })
        .await?;

        info!(step = self.step(), object = %key, result = %result, "NicClusterPolicy reconciled successfully");
        Ok(vec![condition::success(CONDITION_TYPE, "NicClusterPolicy deployed successfully")])
    }

    async fn delete(&self, client: &dyn ClusterClient) -> Result<DeleteOutcome, ControllerError> {
        delete_object(client, &self.key()).await
    }
}
