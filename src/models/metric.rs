// Per-source sample outcomes

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Memory usage at the moment of sampling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryStatus {
    pub used_bytes: u64,
    pub available_bytes: u64,
    pub used_percent: f64,
}

impl MemoryStatus {
    /// Derive usage from total/available counters (used = total - available).
    /// Returns `None` when the platform reports no memory at all.
    pub fn from_counters(total: u64, available: u64) -> Option<Self> {
        if total == 0 {
            return None;
        }
        let available = available.min(total);
        let used = total - available;
        Some(Self {
            used_bytes: used,
            available_bytes: available,
            used_percent: (used as f64 / total as f64) * 100.0,
        })
    }
}

/// Typed value produced by a successful sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum MetricValue {
    /// Percent in [0, 100].
    Percent(f64),
    /// One percent per logical core, ordered by core index.
    PerCore(Vec<f64>),
    Memory(MemoryStatus),
}

/// Why a key has no value for a tick.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "camelCase")]
pub enum SampleFailure {
    /// The platform call failed (error, permission denied, unsupported counter).
    #[error("source failure: {0}")]
    Source(String),
    /// No result before the tick deadline; a late result is discarded.
    #[error("timed out after {deadline_ms} ms")]
    Timeout { deadline_ms: u64 },
    /// The previous call for this source was abandoned and has not returned yet.
    #[error("previous sample still in flight")]
    Busy,
    /// The worker pool was closed before this source got a slot.
    #[error("rejected by worker pool")]
    Rejected,
}

/// Outcome of one source for one tick. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "camelCase")]
pub enum MetricResult {
    Ok(MetricValue),
    Failed(SampleFailure),
}

impl MetricResult {
    pub fn percent(value: f64) -> Self {
        Self::Ok(MetricValue::Percent(value))
    }

    pub fn per_core(values: Vec<f64>) -> Self {
        Self::Ok(MetricValue::PerCore(values))
    }

    pub fn memory(status: MemoryStatus) -> Self {
        Self::Ok(MetricValue::Memory(status))
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failed(SampleFailure::Source(reason.into()))
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    pub fn value(&self) -> Option<&MetricValue> {
        match self {
            Self::Ok(v) => Some(v),
            Self::Failed(_) => None,
        }
    }

    pub fn failure_reason(&self) -> Option<&SampleFailure> {
        match self {
            Self::Ok(_) => None,
            Self::Failed(f) => Some(f),
        }
    }
}

impl From<SampleFailure> for MetricResult {
    fn from(failure: SampleFailure) -> Self {
        Self::Failed(failure)
    }
}
