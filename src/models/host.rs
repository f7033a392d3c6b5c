// Static host identity (captured once at startup)

use serde::{Deserialize, Serialize};

/// Placeholder for any identity field the platform could not provide.
pub const UNKNOWN: &str = "Unknown";

/// One-time host facts; not part of the recurring snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticHostInfo {
    pub host_name: String,
    pub os_name: String,
    pub os_release: String,
    pub os_build: String,
    pub cpu_model: String,
    pub microarchitecture: String,
    /// `None` when the platform cannot tell physical cores apart.
    pub physical_cores: Option<usize>,
    pub logical_cores: usize,
    pub total_memory_bytes: u64,
}

impl StaticHostInfo {
    /// Every field degraded to its placeholder.
    pub fn unknown() -> Self {
        Self {
            host_name: UNKNOWN.into(),
            os_name: UNKNOWN.into(),
            os_release: UNKNOWN.into(),
            os_build: UNKNOWN.into(),
            cpu_model: UNKNOWN.into(),
            microarchitecture: UNKNOWN.into(),
            physical_cores: None,
            logical_cores: 0,
            total_memory_bytes: 0,
        }
    }

    /// "`<os> <release> build <build>`", the OS frame line.
    pub fn os_label(&self) -> String {
        format!("{} {} build {}", self.os_name, self.os_release, self.os_build)
    }
}
