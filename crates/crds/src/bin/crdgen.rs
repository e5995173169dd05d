//! Prints the GPUAddon CustomResourceDefinition as YAML.
//!
//! Usage: `cargo run -p crds --bin crdgen > config/crd/gpuaddon.yaml`
//!
//! Third-party kinds (ClusterPolicy, NicClusterPolicy, ...) are installed by
//! their own operators and are not emitted.

use crds::GPUAddon;
use kube::CustomResourceExt;

fn main() -> anyhow::Result<()> {
    print!("{}", serde_yaml::to_string(&GPUAddon::crd())?);
    Ok(())
}
