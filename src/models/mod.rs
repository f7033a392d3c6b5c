// Domain models: per-source results, snapshots, host identity

mod host;
mod metric;
mod snapshot;

pub use host::{StaticHostInfo, UNKNOWN};
pub use metric::{MemoryStatus, MetricResult, MetricValue, SampleFailure};
pub use snapshot::Snapshot;
