// Pluggable metric sources: one blocking measurement each

mod system;

pub use system::{CpuAggregateSource, CpuPerCoreSource, MemorySource};

use crate::models::MetricResult;
use std::sync::Arc;
use std::time::Duration;

/// Overall CPU utilization percent.
pub const CPU_AGGREGATE: &str = "cpu.aggregate";
/// Per logical core utilization percent, ordered by core index.
pub const CPU_PER_CORE: &str = "cpu.percore";
/// Used / available memory.
pub const MEMORY: &str = "memory";

/// A single blocking measurement of one host statistic.
///
/// `sample` may block for up to [`MetricSource::duration_hint`] and must not panic; platform
/// errors come back as [`MetricResult::Failed`]. The scheduler never runs two calls on the same
/// instance at once, so any previous-vs-current counter state can live inside the source.
pub trait MetricSource: Send + Sync + 'static {
    /// Stable key under which results appear in a snapshot.
    fn key(&self) -> &str;

    /// Nominal time one `sample` call takes; used to size the tick deadline.
    fn duration_hint(&self) -> Duration;

    fn sample(&self) -> MetricResult;
}

/// Closure-backed source, for substituting platform calls.
pub struct FnSource<F> {
    key: String,
    hint: Duration,
    f: F,
}

impl<F> FnSource<F>
where
    F: Fn() -> MetricResult + Send + Sync + 'static,
{
    pub fn new(key: impl Into<String>, hint: Duration, f: F) -> Self {
        Self {
            key: key.into(),
            hint,
            f,
        }
    }
}

impl<F> MetricSource for FnSource<F>
where
    F: Fn() -> MetricResult + Send + Sync + 'static,
{
    fn key(&self) -> &str {
        &self.key
    }

    fn duration_hint(&self) -> Duration {
        self.hint
    }

    fn sample(&self) -> MetricResult {
        (self.f)()
    }
}

/// The three host sources: aggregate CPU, per-core CPU (both over `cpu_window`) and memory.
pub fn default_sources(cpu_window: Duration) -> Vec<Arc<dyn MetricSource>> {
    vec![
        Arc::new(CpuAggregateSource::new(cpu_window)),
        Arc::new(CpuPerCoreSource::new(cpu_window)),
        Arc::new(MemorySource::new()),
    ]
}
