//! NicClusterPolicy
//!
//! Cluster-wide network operator configuration: OFED driver and the RDMA
//! shared / SR-IOV device plugins.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[kube(
    group = "mellanox.com",
    version = "v1alpha1",
    kind = "NicClusterPolicy",
    plural = "nicclusterpolicies"
)]
#[serde(rename_all = "camelCase")]
pub struct NicClusterPolicySpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ofed_driver: Option<OFEDDriverSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rdma_shared_device_plugin: Option<DevicePluginSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sriov_device_plugin: Option<DevicePluginSpec>,
}

/// Container image coordinates, rendered as `<repository>/<image>:<version>`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
pub struct ImageSpec {
    pub image: String,
    pub repository: String,
    pub version: String,
}

impl ImageSpec {
    pub fn new(repository: &str, image: &str, version: &str) -> Self {
        Self {
            image: image.to_string(),
            repository: repository.to_string(),
            version: version.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
pub struct OFEDDriverSpec {
    #[serde(flatten)]
    pub image: ImageSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
pub struct DevicePluginSpec {
    #[serde(flatten)]
    pub image: ImageSpec,

    /// Plugin configuration as a JSON document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,
}
