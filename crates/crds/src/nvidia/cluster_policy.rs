//! ClusterPolicy (nvidia.com/v1)
//!
//! Typed view of the GPU operator's cluster-scoped ClusterPolicy. Only the
//! components the add-on configures are modelled.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[kube(
    group = "nvidia.com",
    version = "v1",
    kind = "ClusterPolicy",
    plural = "clusterpolicies"
)]
#[serde(rename_all = "camelCase")]
pub struct ClusterPolicySpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<OperatorSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub psp: Option<ComponentToggle>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toolkit: Option<ComponentToggle>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dcgm: Option<ComponentToggle>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dcgm_exporter: Option<DCGMExporterSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mig_manager: Option<ComponentToggle>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_status_exporter: Option<ComponentToggle>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mig: Option<MIGSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validator: Option<ValidatorSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<DriverSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OperatorSpec {
    /// Container runtime on the nodes ("crio", "containerd", "docker")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_runtime: Option<String>,
}

/// Any component whose only knob the add-on sets is `enabled`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
pub struct ComponentToggle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

impl ComponentToggle {
    pub fn enabled(enabled: bool) -> Self {
        Self {
            enabled: Some(enabled),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DCGMExporterSpec {
    /// ConfigMap holding the custom metrics list
    #[serde(default, rename = "config", skip_serializing_if = "Option::is_none")]
    pub metrics_config: Option<DCGMExporterMetricsConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
pub struct DCGMExporterMetricsConfig {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
pub struct MIGSpec {
    /// "single" or "mixed"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
pub struct ValidatorSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
pub struct EnvVar {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DriverSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// Build the driver with the OpenShift driver toolkit
    #[serde(
        default,
        rename = "use_ocp_driver_toolkit",
        skip_serializing_if = "Option::is_none"
    )]
    pub use_openshift_driver_toolkit: Option<bool>,

    /// GPUDirect RDMA
    #[serde(default, rename = "rdma", skip_serializing_if = "Option::is_none")]
    pub gpu_direct_rdma: Option<ComponentToggle>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub licensing_config: Option<DriverLicensingConfigSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DriverLicensingConfigSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_map_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nls_enabled: Option<bool>,
}
