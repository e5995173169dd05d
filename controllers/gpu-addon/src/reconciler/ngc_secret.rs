//! NGC pull secret.
//!
//! Builds a `kubernetes.io/dockerconfigjson` secret for `nvcr.io` from the
//! add-on parameters secret. The step is gated on that secret: absent or
//! incomplete parameters are reported, not treated as errors.

use super::{ResourceReconciler, StepResult, delete_object, fetch, step_failure, upsert};
use crate::condition::{self, reasons};
use crate::config::AddonConfig;
use crate::error::ControllerError;
use crate::owner;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use cluster_client::{ClusterClient, DeleteOutcome, ObjectKey, Target, apply};
use crds::GPUAddon;
use k8s_openapi::ByteString;
use k8s_openapi::api::core::v1::Secret;
use kube::ResourceExt;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

pub const CONDITION_TYPE: &str = "NGCSecretDeployed";
pub const SECRET_NAME: &str = "ngc-secret";
pub const ADDON_PARAMETERS_SECRET_NAME: &str = "addon-nvidia-gpu-addon-parameters";

pub const NGC_API_KEY_PARAM: &str = "ngc-api-key";
pub const NGC_EMAIL_PARAM: &str = "ngc-email";

pub const DOCKER_SERVER: &str = "nvcr.io";
pub const DOCKER_USERNAME: &str = "$oauthtoken";
pub const DOCKER_CONFIG_JSON_TYPE: &str = "kubernetes.io/dockerconfigjson";
pub const DOCKER_CONFIG_JSON_KEY: &str = ".dockerconfigjson";

/// Credentials read from the add-on parameters secret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NgcCredentials {
    pub api_key: String,
    pub email: String,
}

impl NgcCredentials {
    /// Both parameters must be present and non-empty
    pub fn from_parameters(secret: &Secret) -> Result<Self, String> {
        let value = |param: &str| -> Result<String, String> {
            let raw = match secret.data.as_ref().and_then(|data| data.get(param)) {
                Some(bytes) => String::from_utf8(bytes.0.clone())
                    .map_err(|_| format!("{param} parameter is not valid UTF-8"))?,
                None => secret
                    .string_data
                    .as_ref()
                    .and_then(|data| data.get(param).cloned())
                    .unwrap_or_default(),
            };
            if raw.is_empty() {
                Err(format!("{param} parameter is not present"))
            } else {
                Ok(raw)
            }
        };

        Ok(Self {
            email: value(NGC_EMAIL_PARAM)?,
            api_key: value(NGC_API_KEY_PARAM)?,
        })
    }

    /// Registry auth document for `nvcr.io`
    pub fn docker_config_json(&self) -> Result<String, ControllerError> {
        let auth = STANDARD.encode(format!("{DOCKER_USERNAME}:{}", self.api_key));
        let mut auths = serde_json::Map::new();
        auths.insert(
            DOCKER_SERVER.to_string(),
            serde_json::json!({
                "username": DOCKER_USERNAME,
                "password": self.api_key,
                "email": self.email,
                "auth": auth,
            }),
        );
        Ok(serde_json::to_string(&serde_json::json!({ "auths": auths }))?)
    }
}

#[derive(Debug)]
pub struct NgcSecretReconciler {
    config: Arc<AddonConfig>,
}

impl NgcSecretReconciler {
    pub fn new(config: Arc<AddonConfig>) -> Self {
        Self { config }
    }

    fn secret_key(&self) -> ObjectKey {
        ObjectKey::namespaced::<Secret>(&self.config.addon_namespace, SECRET_NAME)
    }

    fn parameters_key(&self) -> ObjectKey {
        ObjectKey::namespaced::<Secret>(&self.config.addon_namespace, ADDON_PARAMETERS_SECRET_NAME)
    }
}

fn set_desired_secret(
    secret: &mut Secret,
    credentials: &NgcCredentials,
    addon: &GPUAddon,
) -> Result<(), ControllerError> {
    let payload = credentials.docker_config_json()?;

    secret.type_ = Some(DOCKER_CONFIG_JSON_TYPE.to_string());
    secret.data = Some(BTreeMap::from([(
        DOCKER_CONFIG_JSON_KEY.to_string(),
        ByteString(payload.into_bytes()),
    )]));
    secret.string_data = None;

    owner::set_controller_reference(addon, &mut secret.metadata)?;
    Ok(())
}

#[async_trait::async_trait]
impl ResourceReconciler for NgcSecretReconciler {
    fn step(&self) -> &'static str {
        "NGC Secret"
    }

    async fn reconcile(&self, client: &dyn ClusterClient, addon: &GPUAddon) -> StepResult {
        let parameters_key = self.parameters_key();
        let Some(parameters) = fetch::<Secret>(client, &parameters_key, CONDITION_TYPE).await? else {
            info!(
                step = self.step(),
                addon = %addon.name_any(),
                parameters = %parameters_key,
                "NGC secret will not be reconciled as the add-on parameters secret is not present"
            );
            return Ok(vec![condition::skipped(
                CONDITION_TYPE,
                reasons::ADDON_PARAMETERS_SECRET_NOT_PRESENT,
                "Add-on parameters secret is not present",
            )]);
        };

        let credentials = match NgcCredentials::from_parameters(&parameters) {
            Ok(credentials) => credentials,
            Err(problem) => {
                info!(
                    step = self.step(),
                    parameters = %parameters_key,
                    problem = %problem,
                    "NGC secret will not be reconciled as the add-on parameters secret is invalid"
                );
                return Ok(vec![condition::skipped(
                    CONDITION_TYPE,
                    reasons::ADDON_PARAMETERS_SECRET_NOT_VALID,
                    format!("Add-on parameters secret contains invalid parameters: {problem}"),
                )]);
            }
        };

        let key = self.secret_key();
        let mut existing = fetch::<Secret>(client, &key, CONDITION_TYPE).await?;

        // Secret type is immutable: a same-named secret of another type is replaced
        let unexpected_type = existing
            .as_ref()
            .and_then(|s| s.type_.clone())
            .filter(|t| t != DOCKER_CONFIG_JSON_TYPE);
        if let Some(found) = unexpected_type {
            info!(step = self.step(), object = %key, found = %found, "Replacing NGC secret of unexpected type");
            apply::delete(client, &key)
                .await
                .map_err(|e| step_failure(CONDITION_TYPE, reasons::CREATE_OR_PATCH_FAILED, e.into()))?;
            existing = None;
        }
        let target = Target::resolve(existing, || Secret {
            metadata: key.object_meta(),
            ..Default::default()
        });

        let result = upsert(client, &key, target, CONDITION_TYPE, |secret: &mut Secret| {
            set_desired_secret(secret, &credentials, addon)
        })
        .await?;

        info!(step = self.step(), object = %key, result = %result, "NGC secret reconciled successfully");
        Ok(vec![condition::success(CONDITION_TYPE, "NGC Secret deployed successfully")])
    }

    async fn delete(&self, client: &dyn ClusterClient) -> Result<DeleteOutcome, ControllerError> {
        delete_object(client, &self.secret_key()).await
    }
}
