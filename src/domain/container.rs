use std::collections::HashMap;

/// Label attached to every container this crate launches.
pub const MANAGED_LABEL: &str = "stackbox.managed=true";

/// Handle to a launched container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    id: String,
}

impl Container {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// First 12 characters, the way `docker ps` shows ids.
    pub fn short_id(&self) -> &str {
        let end = self
            .id
            .char_indices()
            .nth(12)
            .map(|(idx, _)| idx)
            .unwrap_or(self.id.len());
        &self.id[..end]
    }
}

#[derive(Debug, Clone)]
pub struct LaunchSpec<'a> {
    pub image: &'a str,
    pub env: &'a [String],
    /// Container ports to publish on dynamic host ports.
    pub ports: &'a [u16],
    pub labels: &'a [&'a str],
}

/// Container port to published host port. Captured once after launch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortTable {
    ports: HashMap<u16, u16>,
}

impl PortTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps the first binding seen for a container port, so an IPv4 binding
    /// listed before its IPv6 twin wins.
    pub fn insert(&mut self, container_port: u16, host_port: u16) {
        self.ports.entry(container_port).or_insert(host_port);
    }

    pub fn host_port(&self, container_port: u16) -> Option<u16> {
        self.ports.get(&container_port).copied()
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }
}

impl FromIterator<(u16, u16)> for PortTable {
    fn from_iter<T: IntoIterator<Item = (u16, u16)>>(iter: T) -> Self {
        let mut table = Self::new();
        for (container_port, host_port) in iter {
            table.insert(container_port, host_port);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_id() {
        let container = Container::new("0123456789abcdef0123");
        assert_eq!(container.short_id(), "0123456789ab");
        assert_eq!(Container::new("abc").short_id(), "abc");
    }

    #[test]
    fn test_port_table_first_binding_wins() {
        let table: PortTable = [(4572, 32768), (4572, 40000), (4576, 32769)]
            .into_iter()
            .collect();

        assert_eq!(table.len(), 2);
        assert_eq!(table.host_port(4572), Some(32768));
        assert_eq!(table.host_port(4576), Some(32769));
        assert_eq!(table.host_port(4566), None);
    }
}
