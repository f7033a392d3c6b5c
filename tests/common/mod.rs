// Shared test helpers
#![allow(dead_code)]

use pcstatus::error::ScheduleError;
use pcstatus::models::*;
use pcstatus::scheduler::SchedulerConfig;
use pcstatus::sink::SnapshotSink;
use pcstatus::source::{CPU_AGGREGATE, CPU_PER_CORE, FnSource, MEMORY, MetricSource};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const FAST_HINT: Duration = Duration::from_millis(5);

/// Records everything it receives and counts overlapping `on_snapshot` calls.
#[derive(Default)]
pub struct RecordingSink {
    snapshots: Mutex<Vec<Arc<Snapshot>>>,
    errors: Mutex<Vec<ScheduleError>>,
    active: AtomicBool,
    overlaps: AtomicUsize,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn snapshots(&self) -> Vec<Arc<Snapshot>> {
        self.snapshots.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<ScheduleError> {
        self.errors.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.snapshots.lock().unwrap().len()
    }

    pub fn overlaps(&self) -> usize {
        self.overlaps.load(Ordering::SeqCst)
    }

    /// Poll until at least `n` snapshots arrived; false on timeout.
    pub async fn wait_for(&self, n: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if self.count() >= n {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        self.count() >= n
    }
}

impl SnapshotSink for RecordingSink {
    fn on_snapshot(&self, snapshot: Arc<Snapshot>) {
        if self.active.swap(true, Ordering::SeqCst) {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        self.snapshots.lock().unwrap().push(snapshot);
        self.active.store(false, Ordering::SeqCst);
    }

    fn on_error(&self, error: ScheduleError) {
        self.errors.lock().unwrap().push(error);
    }
}

pub fn fixed_memory() -> MemoryStatus {
    MemoryStatus {
        used_bytes: 8_000_000_000,
        available_bytes: 8_000_000_000,
        used_percent: 50.0,
    }
}

/// The three-source host from the end-to-end example: 42% overall, two cores, half memory used.
pub fn example_sources() -> Vec<Arc<dyn MetricSource>> {
    vec![
        Arc::new(FnSource::new(CPU_AGGREGATE, FAST_HINT, || {
            MetricResult::percent(42.0)
        })),
        Arc::new(FnSource::new(CPU_PER_CORE, FAST_HINT, || {
            MetricResult::per_core(vec![10.0, 74.0])
        })),
        Arc::new(FnSource::new(MEMORY, FAST_HINT, || {
            MetricResult::memory(fixed_memory())
        })),
    ]
}

pub fn fast_config(period_ms: u64) -> SchedulerConfig {
    SchedulerConfig {
        period: Duration::from_millis(period_ms),
        deadline_grace: Duration::from_millis(200),
        ..SchedulerConfig::default()
    }
}

pub fn example_host() -> StaticHostInfo {
    StaticHostInfo {
        host_name: "box".into(),
        os_name: "Linux".into(),
        os_release: "6.1.0".into(),
        os_build: "12".into(),
        cpu_model: "Test CPU 3000".into(),
        microarchitecture: "Kaby Lake".into(),
        physical_cores: Some(2),
        logical_cores: 2,
        total_memory_bytes: 16_000_000_000,
    }
}
