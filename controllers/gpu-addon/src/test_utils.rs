//! Test utilities for unit testing reconcilers
//!
//! Builders for GPUAddon objects, configuration and the add-on parameters
//! secret.

#[cfg(test)]
use crate::config::AddonConfig;
#[cfg(test)]
use crds::*;
#[cfg(test)]
use k8s_openapi::ByteString;
#[cfg(test)]
use k8s_openapi::api::core::v1::Secret;
#[cfg(test)]
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
#[cfg(test)]
use std::collections::BTreeMap;
#[cfg(test)]
use std::sync::Arc;

#[cfg(test)]
pub const TEST_NAMESPACE: &str = "redhat-nvidia-gpu-addon";

/// Helper to create a GPUAddon with a uid and generation 1
#[cfg(test)]
pub fn test_addon(name: &str, namespace: &str, rdma: Option<RDMASpec>) -> GPUAddon {
    let mut addon = GPUAddon::new(
        name,
        GPUAddonSpec {
            rdma,
            ..Default::default()
        },
    );
    addon.metadata = ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(namespace.to_string()),
        uid: Some(format!("{name}-uid")),
        generation: Some(1),
        ..Default::default()
    };
    addon
}

/// Helper to create the default test configuration, addon namespace `TEST_NAMESPACE`
#[cfg(test)]
pub fn test_config() -> Arc<AddonConfig> {
    Arc::new(AddonConfig {
        addon_namespace: TEST_NAMESPACE.to_string(),
        watch_namespace: TEST_NAMESPACE.to_string(),
        ..Default::default()
    })
}

/// Helper to create an RDMA configuration with one device
#[cfg(test)]
pub fn test_rdma(range: &str, exclude: &[&str]) -> RDMASpec {
    RDMASpec {
        devices: vec![DeviceSpec {
            resource_name: "rdma_shared_device_a".to_string(),
            selectors: Selectors {
                if_names: vec!["ens2f0np0".to_string()],
            },
        }],
        macvlan_network: MacvlanNetworkConfig {
            master: None,
            ipam: IPAMConfig {
                range: range.to_string(),
                omit_ranges: exclude.iter().map(|s| (*s).to_string()).collect(),
            },
        },
    }
}

/// Helper to create the add-on parameters secret with the given data keys
#[cfg(test)]
pub fn test_parameters_secret(namespace: &str, entries: &[(&str, &str)]) -> Secret {
    let data: BTreeMap<String, ByteString> = entries
        .iter()
        .map(|(k, v)| ((*k).to_string(), ByteString(v.as_bytes().to_vec())))
        .collect();

    Secret {
        metadata: ObjectMeta {
            name: Some(crate::reconciler::ngc_secret::ADDON_PARAMETERS_SECRET_NAME.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        data: Some(data),
        ..Default::default()
    }
}
