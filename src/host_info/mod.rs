// One-shot static host identification via sysinfo

mod linux;

use crate::models::{StaticHostInfo, UNKNOWN};
use sysinfo::System;
use tracing::instrument;

fn known(value: Option<String>) -> String {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| UNKNOWN.into())
}

/// Blocking collection of host identity. Any field the platform cannot provide degrades
/// to "Unknown"; this never fails.
pub fn collect_blocking() -> StaticHostInfo {
    let mut sys = System::new();
    sys.refresh_cpu_all();
    sys.refresh_memory();

    let cpu_model = known(linux::read_cpu_model_linux().or_else(|| {
        sys.cpus()
            .first()
            .map(|c| c.brand().to_string())
            .filter(|s| !s.is_empty() && s != "cpu0")
    }));
    let microarchitecture = linux::read_microarchitecture_linux()
        .unwrap_or_else(|| std::env::consts::ARCH.to_string());

    StaticHostInfo {
        host_name: known(System::host_name()),
        os_name: known(System::name().or_else(|| Some(std::env::consts::OS.into()))),
        os_release: known(System::kernel_version()),
        os_build: known(System::os_version()),
        cpu_model,
        microarchitecture,
        physical_cores: System::physical_core_count(),
        logical_cores: sys.cpus().len(),
        total_memory_bytes: sys.total_memory(),
    }
}

/// Collect host identity on the blocking pool.
#[instrument(fields(operation = "collect_host_info"))]
pub async fn collect() -> StaticHostInfo {
    match tokio::task::spawn_blocking(collect_blocking).await {
        Ok(info) => info,
        Err(e) => {
            tracing::warn!(error = %e, "host info task failed; using placeholders");
            StaticHostInfo::unknown()
        }
    }
}
