// Scheduler configuration and runtime fault types

use thiserror::Error;

/// Invalid scheduler configuration; returned synchronously from `start`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("duplicate metric source key: {0}")]
    DuplicateKey(String),
    #[error("sampling period must be > 0")]
    NonPositivePeriod,
    #[error("worker pool size must be > 0")]
    NoWorkers,
    #[error("no metric sources registered")]
    NoSources,
}

/// Pool-level fault; reported to the sink's error channel while ticking continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("worker pool closed; {key} not sampled on tick {sequence}")]
    PoolClosed { key: String, sequence: u64 },
}
