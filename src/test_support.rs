use crate::domain::{Container, ContainerRuntime, LaunchSpec, PortTable};
use anyhow::{Result, bail};
use std::collections::HashMap;
use std::sync::RwLock;

/// First fake host port handed out by [`MockRuntime`].
pub const MOCK_PORT_BASE: u16 = 41000;

#[derive(Debug, Clone)]
pub struct MockContainer {
    pub id: String,
    pub image: String,
    pub env: Vec<String>,
    pub labels: Vec<String>,
    pub ports: PortTable,
}

/// In-memory [`ContainerRuntime`] that records every call.
#[derive(Debug)]
pub struct MockRuntime {
    containers: RwLock<HashMap<String, MockContainer>>,
    commands: RwLock<Vec<String>>,
    fail_on: RwLock<Option<String>>,
    unpublished: RwLock<Vec<u16>>,
    next_id: RwLock<u32>,
}

impl MockRuntime {
    pub fn new() -> Self {
        Self {
            containers: RwLock::new(HashMap::new()),
            commands: RwLock::new(Vec::new()),
            fail_on: RwLock::new(None),
            unpublished: RwLock::new(Vec::new()),
            next_id: RwLock::new(0),
        }
    }

    /// Makes the named operation (`ping`, `run`, `ports`, `purge`) fail.
    pub fn set_fail_on(&self, operation: &str) {
        *self.fail_on.write().unwrap() = Some(operation.to_string());
    }

    /// Leaves a container port out of the published table.
    pub fn skip_port(&self, container_port: u16) {
        self.unpublished.write().unwrap().push(container_port);
    }

    pub fn get_commands(&self) -> Vec<String> {
        self.commands.read().unwrap().clone()
    }

    pub fn container_exists(&self, id: &str) -> bool {
        self.containers.read().unwrap().contains_key(id)
    }

    pub fn running(&self) -> usize {
        self.containers.read().unwrap().len()
    }

    pub fn get_container(&self, id: &str) -> Option<MockContainer> {
        self.containers.read().unwrap().get(id).cloned()
    }

    fn record_command(&self, cmd: &str) {
        self.commands.write().unwrap().push(cmd.to_string());
    }

    fn check_fail(&self, operation: &str) -> Result<()> {
        if let Some(ref fail_on) = *self.fail_on.read().unwrap() {
            if fail_on == operation {
                bail!("Mock failure on: {}", operation);
            }
        }
        Ok(())
    }
}

impl Default for MockRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerRuntime for MockRuntime {
    fn ping(&self) -> Result<()> {
        self.record_command("ping");
        self.check_fail("ping")
    }

    fn run_container(&self, spec: &LaunchSpec) -> Result<Container> {
        self.record_command(&format!("run:{}", spec.image));
        self.check_fail("run")?;

        let id = {
            let mut next = self.next_id.write().unwrap();
            *next += 1;
            format!("{:012}{}", *next, "f".repeat(52))
        };

        let unpublished = self.unpublished.read().unwrap().clone();
        let ports = spec
            .ports
            .iter()
            .enumerate()
            .filter(|(_, port)| !unpublished.contains(port))
            .map(|(idx, port)| (*port, MOCK_PORT_BASE + idx as u16))
            .collect();

        self.containers.write().unwrap().insert(
            id.clone(),
            MockContainer {
                id: id.clone(),
                image: spec.image.to_string(),
                env: spec.env.to_vec(),
                labels: spec.labels.iter().map(|l| l.to_string()).collect(),
                ports,
            },
        );

        Ok(Container::new(id))
    }

    fn published_ports(&self, container: &Container) -> Result<PortTable> {
        self.record_command(&format!("ports:{}", container.short_id()));
        self.check_fail("ports")?;

        match self.containers.read().unwrap().get(container.id()) {
            Some(found) => Ok(found.ports.clone()),
            None => bail!("no such container: {}", container.id()),
        }
    }

    fn purge_container(&self, container: &Container) -> Result<()> {
        self.record_command(&format!("purge:{}", container.short_id()));
        self.check_fail("purge")?;

        if self
            .containers
            .write()
            .unwrap()
            .remove(container.id())
            .is_none()
        {
            bail!("no such container: {}", container.id());
        }
        Ok(())
    }
}
