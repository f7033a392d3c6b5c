// Snapshot consumers

use crate::error::ScheduleError;
use crate::models::Snapshot;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Receives completed snapshots and scheduler faults.
///
/// Called from the scheduler task, one call at a time, in sequence order. Delivery is inline:
/// a slow `on_snapshot` delays the dispatch of the next tick, so implementations should hand
/// the snapshot off rather than do heavy work.
pub trait SnapshotSink: Send + Sync + 'static {
    fn on_snapshot(&self, snapshot: Arc<Snapshot>);

    fn on_error(&self, error: ScheduleError);
}

/// What a [`BroadcastSink`] forwards to its receivers.
#[derive(Debug, Clone)]
pub enum SamplerEvent {
    Snapshot(Arc<Snapshot>),
    Error(ScheduleError),
}

/// Forwards events to a broadcast channel (e.g. a display task). Never blocks; a lagging
/// receiver loses the oldest events.
pub struct BroadcastSink {
    tx: broadcast::Sender<SamplerEvent>,
}

impl BroadcastSink {
    pub fn new(tx: broadcast::Sender<SamplerEvent>) -> Self {
        Self { tx }
    }

    /// Sink plus a first receiver.
    pub fn channel(capacity: usize) -> (Self, broadcast::Receiver<SamplerEvent>) {
        let (tx, rx) = broadcast::channel(capacity);
        (Self { tx }, rx)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SamplerEvent> {
        self.tx.subscribe()
    }
}

impl SnapshotSink for BroadcastSink {
    fn on_snapshot(&self, snapshot: Arc<Snapshot>) {
        if self.tx.send(SamplerEvent::Snapshot(snapshot)).is_err() {
            tracing::debug!(
                operation = "broadcast_snapshot",
                "no active receivers for snapshot"
            );
        }
    }

    fn on_error(&self, error: ScheduleError) {
        tracing::warn!(error = %error, "scheduler fault");
        let _ = self.tx.send(SamplerEvent::Error(error));
    }
}

/// Tracing observer: logs each snapshot at DEBUG and each fault at WARN.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl SnapshotSink for LogSink {
    fn on_snapshot(&self, snapshot: Arc<Snapshot>) {
        tracing::debug!(
            sequence = snapshot.sequence(),
            entries = snapshot.len(),
            failed = snapshot.failed_count(),
            "snapshot"
        );
    }

    fn on_error(&self, error: ScheduleError) {
        tracing::warn!(error = %error, "scheduler fault");
    }
}
