use super::{Container, LaunchSpec, PortTable};
use anyhow::Result;
use std::fmt::Debug;

/// Trait for container runtime operations
pub trait ContainerRuntime: Send + Sync + Debug {
    /// Check that the runtime is reachable
    fn ping(&self) -> Result<()>;

    /// Launch a detached container from a spec
    fn run_container(&self, spec: &LaunchSpec) -> Result<Container>;

    /// Read the host ports published for a container
    fn published_ports(&self, container: &Container) -> Result<PortTable>;

    /// Force-remove a container together with its anonymous volumes
    fn purge_container(&self, container: &Container) -> Result<()>;
}
