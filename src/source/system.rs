// Host sources via sysinfo

use super::{CPU_AGGREGATE, CPU_PER_CORE, MEMORY, MetricSource};
use crate::models::{MemoryStatus, MetricResult};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use sysinfo::System;

const MEMORY_HINT: Duration = Duration::from_millis(100);

fn clamp_percent(v: f32) -> f64 {
    if v.is_finite() {
        (v as f64).clamp(0.0, 100.0)
    } else {
        0.0
    }
}

fn lock(sys: &Mutex<System>) -> Result<MutexGuard<'_, System>, MetricResult> {
    sys.lock()
        .map_err(|e| MetricResult::failure(format!("sysinfo lock poisoned: {}", e)))
}

fn cpu_system() -> Mutex<System> {
    let mut sys = System::new();
    sys.refresh_cpu_all();
    Mutex::new(sys)
}

/// Refresh, wait out the window, refresh again; usage is the delta over the window.
fn measure_window(sys: &mut System, window: Duration) {
    sys.refresh_cpu_usage();
    std::thread::sleep(window);
    sys.refresh_cpu_usage();
}

/// Overall CPU utilization over a sampling window.
pub struct CpuAggregateSource {
    sys: Mutex<System>,
    window: Duration,
}

impl CpuAggregateSource {
    /// `window` is raised to sysinfo's minimum refresh interval if shorter.
    pub fn new(window: Duration) -> Self {
        Self {
            sys: cpu_system(),
            window: window.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL),
        }
    }
}

impl MetricSource for CpuAggregateSource {
    fn key(&self) -> &str {
        CPU_AGGREGATE
    }

    fn duration_hint(&self) -> Duration {
        self.window
    }

    fn sample(&self) -> MetricResult {
        let mut sys = match lock(&self.sys) {
            Ok(s) => s,
            Err(failed) => return failed,
        };
        if sys.cpus().is_empty() {
            return MetricResult::failure("no CPUs reported");
        }
        measure_window(&mut sys, self.window);
        MetricResult::percent(clamp_percent(sys.global_cpu_usage()))
    }
}

/// Per logical core utilization over a sampling window.
pub struct CpuPerCoreSource {
    sys: Mutex<System>,
    window: Duration,
}

impl CpuPerCoreSource {
    pub fn new(window: Duration) -> Self {
        Self {
            sys: cpu_system(),
            window: window.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL),
        }
    }
}

impl MetricSource for CpuPerCoreSource {
    fn key(&self) -> &str {
        CPU_PER_CORE
    }

    fn duration_hint(&self) -> Duration {
        self.window
    }

    fn sample(&self) -> MetricResult {
        let mut sys = match lock(&self.sys) {
            Ok(s) => s,
            Err(failed) => return failed,
        };
        if sys.cpus().is_empty() {
            return MetricResult::failure("no CPUs reported");
        }
        measure_window(&mut sys, self.window);
        let per_core = sys
            .cpus()
            .iter()
            .map(|c| clamp_percent(c.cpu_usage()))
            .collect();
        MetricResult::per_core(per_core)
    }
}

/// Instantaneous memory usage.
pub struct MemorySource {
    sys: Mutex<System>,
}

impl Default for MemorySource {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySource {
    pub fn new() -> Self {
        Self {
            sys: Mutex::new(System::new()),
        }
    }
}

impl MetricSource for MemorySource {
    fn key(&self) -> &str {
        MEMORY
    }

    fn duration_hint(&self) -> Duration {
        MEMORY_HINT
    }

    fn sample(&self) -> MetricResult {
        let mut sys = match lock(&self.sys) {
            Ok(s) => s,
            Err(failed) => return failed,
        };
        sys.refresh_memory();
        match MemoryStatus::from_counters(sys.total_memory(), sys.available_memory()) {
            Some(status) => MetricResult::memory(status),
            None => MetricResult::failure("memory counters unavailable"),
        }
    }
}
