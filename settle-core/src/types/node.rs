use std::fmt;

use serde::{Deserialize, Serialize};

/// One addressable remote host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub host: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
}

impl Node {
    pub fn new(name: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            user: None,
            port: None,
            roles: Vec::new(),
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// `user@host`, or just `host` when no user is configured.
    pub fn destination(&self) -> String {
        match &self.user {
            Some(user) => format!("{user}@{}", self.host),
            None => self.host.clone(),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// The cluster under test.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    pub nodes: Vec<Node>,
}

impl Inventory {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// Nodes carrying `role`, in inventory order.
    pub fn with_role(&self, role: &str) -> Vec<Node> {
        self.nodes.iter().filter(|n| n.has_role(role)).cloned().collect()
    }

    pub fn first_with_role(&self, role: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.has_role(role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destination_includes_user() {
        let n = Node::new("installer", "10.0.0.10").with_user("cephuser");
        assert_eq!(n.destination(), "cephuser@10.0.0.10");
        assert_eq!(Node::new("c1", "c1.lab").destination(), "c1.lab");
    }

    #[test]
    fn inventory_filters_by_role() {
        let inv = Inventory::new(vec![
            Node::new("installer", "10.0.0.10").with_role("installer"),
            Node::new("c1", "10.0.0.21").with_role("client"),
            Node::new("c2", "10.0.0.22").with_role("client"),
        ]);
        let clients = inv.with_role("client");
        assert_eq!(clients.len(), 2);
        assert_eq!(clients[0].name, "c1");
        assert_eq!(inv.first_with_role("installer").map(|n| n.name.as_str()), Some("installer"));
        assert!(inv.get("nope").is_none());
    }
}
