//! Process-wide configuration.
//!
//! Built once in `main` from the environment and shared as
//! `Arc<AddonConfig>`; nothing mutates it afterwards.

use crate::error::ControllerError;
use std::env;

pub const DEFAULT_ADDON_NAMESPACE: &str = "redhat-nvidia-gpu-addon";
pub const DEFAULT_CLUSTER_POLICY_NAME: &str = "ocp-gpu-addon";
pub const DEFAULT_NETWORK_OPERATOR_CHANNEL: &str = "v1.1.0";
pub const DEFAULT_METRICS_PORT: u16 = 8080;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddonConfig {
    /// Namespace holding the add-on, its secrets, configmaps and subscriptions
    pub addon_namespace: String,
    /// Namespace watched for GPUAddon objects
    pub watch_namespace: String,
    pub cluster_policy_name: String,
    /// OLM channel of the network operator subscription
    pub network_operator_channel: String,
    pub metrics_port: u16,
}

impl Default for AddonConfig {
    fn default() -> Self {
        Self {
            addon_namespace: DEFAULT_ADDON_NAMESPACE.to_string(),
            watch_namespace: DEFAULT_ADDON_NAMESPACE.to_string(),
            cluster_policy_name: DEFAULT_CLUSTER_POLICY_NAME.to_string(),
            network_operator_channel: DEFAULT_NETWORK_OPERATOR_CHANNEL.to_string(),
            metrics_port: DEFAULT_METRICS_PORT,
        }
    }
}

impl AddonConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ControllerError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ControllerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str, default: &str| -> Result<String, ControllerError> {
            match lookup(name) {
                None => Ok(default.to_string()),
                Some(value) if value.trim().is_empty() => Err(ControllerError::InvalidConfig(format!(
                    "{name} must not be empty"
                ))),
                Some(value) => Ok(value.trim().to_string()),
            }
        };

        let addon_namespace = non_empty("ADDON_NAMESPACE", DEFAULT_ADDON_NAMESPACE)?;
        let watch_namespace = non_empty("WATCH_NAMESPACE", &addon_namespace)?;
        let cluster_policy_name = non_empty("CLUSTER_POLICY_NAME", DEFAULT_CLUSTER_POLICY_NAME)?;
        let network_operator_channel =
            non_empty("NETWORK_OPERATOR_CHANNEL", DEFAULT_NETWORK_OPERATOR_CHANNEL)?;

        let metrics_port = match lookup("METRICS_PORT") {
            None => DEFAULT_METRICS_PORT,
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| {
                ControllerError::InvalidConfig(format!("METRICS_PORT '{raw}' is not a valid port: {e}"))
            })?,
        };

        Ok(Self {
            addon_namespace,
            watch_namespace,
            cluster_policy_name,
            network_operator_channel,
            metrics_port,
        })
    }
}
