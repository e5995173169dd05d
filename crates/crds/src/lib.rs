//! GPU add-on CRD Definitions
//!
//! The `GPUAddon` custom resource owned by this operator, plus typed views of
//! the third-party resources it creates on the add-on's behalf:
//! - `nvidia`: GPU operator `ClusterPolicy`
//! - `mellanox`: network operator `NicClusterPolicy` and `MacvlanNetwork`
//! - `olm`: Operator Lifecycle Manager `Subscription` and `ClusterServiceVersion`
//!
//! Only the fields the operator reads or writes are modelled for third-party
//! kinds; everything else on the live object is left alone.

pub mod condition;
pub mod gpu_addon;
pub mod mellanox;
pub mod nvidia;
pub mod olm;

pub use condition::*;
pub use gpu_addon::*;
pub use mellanox::*;
pub use nvidia::*;
pub use olm::*;
