//! Cluster Object Client
//!
//! A narrow client over the Kubernetes API used by the GPU add-on reconcilers.
//! Objects are exchanged as JSON values keyed by [`ObjectKey`]; the typed helpers
//! in [`apply`] layer the controller-runtime style primitives on top.
//!
//! # Example
//!
//! ```no_run
//! use cluster_client::{apply, KubeClusterClient, ObjectKey, Target};
//! use k8s_openapi::api::core::v1::ConfigMap;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = KubeClusterClient::try_default().await?;
//! let key = ObjectKey::namespaced::<ConfigMap>("my-namespace", "my-config");
//!
//! let existing = apply::get::<ConfigMap>(&client, &key).await?;
//! let target = Target::resolve(existing, || ConfigMap {
//!     metadata: key.object_meta(),
//!     ..Default::default()
//! });
//! let result = apply::create_or_patch(&client, &key, target, |cm: &mut ConfigMap| {
//!     cm.data = Some([("key".to_string(), "value".to_string())].into());
//!     Ok::<_, cluster_client::ClusterError>(())
//! })
//! .await?;
//! println!("{result}");
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Not-found as a state**: `get` yields `None`, `delete` reports `AlreadyAbsent`
//! - **Create-or-patch**: creates the full object, or sends a minimal JSON patch
//! - **Prefix lookup**: locate objects whose generated name is only known by prefix
//! - **Mocking**: `MockClusterClient` behind the `test-util` feature

pub mod apply;
#[cfg(test)]
mod apply_test;
pub mod client;
pub mod error;
pub mod key;
#[path = "trait.rs"]
pub mod cluster_trait;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use apply::{DeleteOutcome, OperationResult, Target};
pub use client::KubeClusterClient;
pub use cluster_trait::ClusterClient;
pub use error::ClusterError;
pub use key::{ObjectKey, ResourceType};
#[cfg(any(test, feature = "test-util"))]
pub use mock::{MockClusterClient, Operation};
