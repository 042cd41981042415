use serde::{Deserialize, Serialize};

/// One row of `ceph orch ls --format json`. Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub service_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
    #[serde(default)]
    pub status: ServiceCounts,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCounts {
    #[serde(default)]
    pub running: u32,
    #[serde(default)]
    pub size: u32,
}

impl ServiceStatus {
    /// Every requested daemon is running.
    pub fn is_converged(&self) -> bool {
        self.status.running == self.status.size
    }

    pub fn is_stopped(&self) -> bool {
        self.status.running == 0
    }

    pub fn summary(&self) -> String {
        format!(
            "{} running {}/{}",
            self.service_name, self.status.running, self.status.size
        )
    }
}

/// Printed by `orch ls` instead of `[]` when nothing matches.
const NO_SERVICES_NOTICE: &str = "No services reported";

/// Decode `orch ls` output. Empty output and the no-services notice are an empty list; any
/// other non-JSON output is an error.
pub fn parse_service_list(output: &str) -> Result<Vec<ServiceStatus>, serde_json::Error> {
    let trimmed = output.trim();
    if trimmed.is_empty() || trimmed == NO_SERVICES_NOTICE {
        return Ok(Vec::new());
    }
    serde_json::from_str(trimmed)
}
