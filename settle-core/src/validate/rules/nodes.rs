use std::collections::BTreeSet;

use crate::types::Node;
use crate::validate::validator::{Validator, NAME_RE};

pub(crate) fn validate_nodes(v: &mut Validator, nodes: &[Node], path: &str) {
    let mut seen = BTreeSet::new();
    for (i, node) in nodes.iter().enumerate() {
        let node_path = format!("{path}[{i}]");
        if node.name.trim().is_empty() {
            v.push(format!("{node_path}.name"), "must not be empty");
        } else if !NAME_RE.is_match(&node.name) {
            v.push(
                format!("{node_path}.name"),
                "must match regex ^[A-Za-z0-9_.\\-]+$",
            );
        } else if !seen.insert(node.name.as_str()) {
            v.push(format!("{node_path}.name"), format!("duplicate node name `{}`", node.name));
        }

        if node.host.trim().is_empty() {
            v.push(format!("{node_path}.host"), "must not be empty");
        }
        if node.port == Some(0) {
            v.push(format!("{node_path}.port"), "must be in 1..=65535");
        }
        for (j, role) in node.roles.iter().enumerate() {
            if !NAME_RE.is_match(role) {
                v.push(format!("{node_path}.roles[{j}]"), "must match regex ^[A-Za-z0-9_.\\-]+$");
            }
        }
    }
}
