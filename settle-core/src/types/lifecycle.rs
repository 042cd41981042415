use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::InvalidTransition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Cluster,
    Export,
    Mount,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cluster => "cluster",
            Self::Export => "export",
            Self::Mount => "mount",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceState {
    Absent,
    Creating,
    Active,
    Degraded,
    Deleting,
}

impl ResourceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::Creating => "creating",
            Self::Active => "active",
            Self::Degraded => "degraded",
            Self::Deleting => "deleting",
        }
    }

    pub fn can_transition_to(self, next: ResourceState) -> bool {
        use ResourceState::*;
        matches!(
            (self, next),
            (Absent, Creating)
                | (Creating, Active)
                // failed setup rolls back
                | (Creating, Absent)
                | (Active, Degraded)
                | (Degraded, Active)
                | (Active, Deleting)
                | (Degraded, Deleting)
                | (Deleting, Absent)
        )
    }
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cluster, export or mount tracked through `absent -> creating -> active -> deleting -> absent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resource {
    pub kind: ResourceKind,
    pub name: String,
    state: ResourceState,
}

impl Resource {
    pub fn new(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            state: ResourceState::Absent,
        }
    }

    pub fn state(&self) -> ResourceState {
        self.state
    }

    /// Move to `to`, returning the previous state.
    pub fn transition(&mut self, to: ResourceState) -> Result<ResourceState, InvalidTransition> {
        let from = self.state;
        if !from.can_transition_to(to) {
            return Err(InvalidTransition {
                kind: self.kind,
                name: self.name.clone(),
                from,
                to,
            });
        }
        self.state = to;
        Ok(from)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.name)
    }
}
