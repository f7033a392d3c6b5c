// Fixed-cadence sampler: each tick fans out to every source on a bounded blocking pool,
// joins against a per-tick deadline, and delivers exactly one complete snapshot.
// Ticks are serialized on one task; delivery is inline, so a slow sink delays the next dispatch.

use crate::error::{ConfigError, ScheduleError};
use crate::models::{MetricResult, SampleFailure, Snapshot};
use crate::sink::SnapshotSink;
use crate::source::MetricSource;
use futures_util::future::join_all;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{AcquireError, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval, interval_at, timeout_at};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Default tick period.
pub const DEFAULT_PERIOD: Duration = Duration::from_millis(500);
/// Added on top of the slowest source's duration hint to form the tick deadline.
pub const DEFAULT_DEADLINE_GRACE: Duration = Duration::from_millis(500);
/// Upper bound for the default pool size (one slot per source otherwise).
pub const MAX_DEFAULT_WORKERS: usize = 10;
/// Upper bound on the per-tick deadline, whatever the duration hints say.
pub const MAX_TICK_DEADLINE: Duration = Duration::from_secs(3600);
const DEFAULT_STATS_LOG_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub period: Duration,
    /// Pool size; `None` means one slot per source, capped at [`MAX_DEFAULT_WORKERS`].
    pub max_workers: Option<usize>,
    pub deadline_grace: Duration,
    /// How often to log scheduler counters at INFO.
    pub stats_log_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            period: DEFAULT_PERIOD,
            max_workers: None,
            deadline_grace: DEFAULT_DEADLINE_GRACE,
            stats_log_interval: DEFAULT_STATS_LOG_INTERVAL,
        }
    }
}

impl SchedulerConfig {
    pub fn with_period(period: Duration) -> Self {
        Self {
            period,
            ..Self::default()
        }
    }

    fn worker_count(&self, source_count: usize) -> usize {
        self.max_workers
            .unwrap_or_else(|| source_count.clamp(1, MAX_DEFAULT_WORKERS))
    }
}

/// Running counters, readable while the scheduler ticks.
#[derive(Debug, Default)]
pub struct SchedulerStats {
    ticks: AtomicU64,
    overruns: AtomicU64,
    source_failures: AtomicU64,
    timeouts: AtomicU64,
    busy: AtomicU64,
    rejections: AtomicU64,
}

impl SchedulerStats {
    /// Snapshots delivered to the sink.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Ticks whose collection took longer than the period.
    pub fn overruns(&self) -> u64 {
        self.overruns.load(Ordering::Relaxed)
    }

    pub fn source_failures(&self) -> u64 {
        self.source_failures.load(Ordering::Relaxed)
    }

    pub fn timeouts(&self) -> u64 {
        self.timeouts.load(Ordering::Relaxed)
    }

    /// Slots skipped because the source's previous call had not returned.
    pub fn busy(&self) -> u64 {
        self.busy.load(Ordering::Relaxed)
    }

    /// Slots not dispatched because the pool was closed by `stop`.
    pub fn rejections(&self) -> u64 {
        self.rejections.load(Ordering::Relaxed)
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn log(&self) {
        tracing::info!(
            ticks = self.ticks(),
            overruns = self.overruns(),
            source_failures = self.source_failures(),
            timeouts = self.timeouts(),
            busy = self.busy(),
            rejections = self.rejections(),
            "scheduler stats"
        );
    }
}

/// Serializes sink calls against `stop`: once closed, no callback starts.
struct DeliveryGate {
    sink: Arc<dyn SnapshotSink>,
    open: Mutex<bool>,
}

impl DeliveryGate {
    fn deliver(&self, snapshot: Arc<Snapshot>) -> bool {
        let open = self.open.lock().unwrap_or_else(PoisonError::into_inner);
        if !*open {
            return false;
        }
        self.sink.on_snapshot(snapshot);
        true
    }

    fn report(&self, error: ScheduleError) {
        let open = self.open.lock().unwrap_or_else(PoisonError::into_inner);
        if *open {
            self.sink.on_error(error);
        }
    }

    fn close(&self) {
        *self.open.lock().unwrap_or_else(PoisonError::into_inner) = false;
    }
}

/// Clears a source's in-flight flag when its blocking call ends (or is never run).
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

struct Slot {
    key: String,
    source: Arc<dyn MetricSource>,
    in_flight: Arc<AtomicBool>,
}

/// One source's call for one tick.
struct Job {
    source: Arc<dyn MetricSource>,
    in_flight: Arc<AtomicBool>,
}

impl Job {
    /// Wait for a pool permit, then run `sample()` on the blocking pool, all before `deadline`.
    /// `Err` only when the pool has been closed.
    async fn run(
        self,
        pool: Arc<Semaphore>,
        deadline: Instant,
        deadline_ms: u64,
    ) -> Result<MetricResult, AcquireError> {
        let permit = match timeout_at(deadline, pool.acquire_owned()).await {
            Ok(permit) => permit?,
            Err(_) => return Ok(SampleFailure::Timeout { deadline_ms }.into()),
        };
        self.in_flight.store(true, Ordering::Release);
        let guard = InFlightGuard(self.in_flight);
        let source = self.source;
        let handle: JoinHandle<MetricResult> = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let _guard = guard;
            source.sample()
        });

        // A dropped handle detaches the blocking call; its result goes nowhere.
        Ok(match timeout_at(deadline, handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) if e.is_panic() => MetricResult::failure("sample panicked"),
            Ok(Err(e)) => MetricResult::failure(format!("worker cancelled: {}", e)),
            Err(_) => SampleFailure::Timeout { deadline_ms }.into(),
        })
    }
}

/// State owned by the scheduler task.
struct Ticker {
    slots: Vec<Slot>,
    pool: Arc<Semaphore>,
    period: Duration,
    deadline: Duration,
    stats_log_interval: Duration,
    gate: Arc<DeliveryGate>,
    stats: Arc<SchedulerStats>,
    cancel: CancellationToken,
    /// Last known health per key, for edge-triggered logging.
    healthy: HashMap<String, bool>,
}

impl Ticker {
    async fn run(mut self) {
        let mut tick = interval(self.period);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut stats_tick = interval_at(
            Instant::now() + self.stats_log_interval,
            self.stats_log_interval,
        );
        stats_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut sequence: u64 = 0;
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = stats_tick.tick() => {
                    self.stats.log();
                    continue;
                }
                _ = tick.tick() => {}
            }

            let next = sequence + 1;
            let started = Instant::now();
            let timestamp = unix_millis();
            let results = self.collect(next).await;
            if started.elapsed() > self.period {
                SchedulerStats::bump(&self.stats.overruns);
            }

            let snapshot = Arc::new(Snapshot::assemble(
                next,
                timestamp,
                self.slots.iter().map(|s| s.key.as_str()),
                results,
            ));
            if !self.gate.deliver(snapshot) {
                tracing::debug!(sequence = next, "delivery gate closed; snapshot discarded");
                break;
            }
            sequence = next;
            SchedulerStats::bump(&self.stats.ticks);
        }
        tracing::debug!(last_sequence = sequence, "scheduler stopped");
    }

    /// One tick: dispatch every idle source, then wait for each result until the deadline.
    /// Sources beyond the pool size queue for a permit; waiting counts against the same deadline.
    async fn collect(&mut self, sequence: u64) -> Vec<(String, MetricResult)> {
        let deadline = Instant::now() + self.deadline;
        let deadline_ms = self.deadline.as_millis() as u64;
        let mut results = Vec::with_capacity(self.slots.len());
        let mut pending = Vec::with_capacity(self.slots.len());

        for slot in &self.slots {
            if slot.in_flight.load(Ordering::Acquire) {
                results.push((slot.key.clone(), SampleFailure::Busy.into()));
                continue;
            }
            let job = Job {
                source: slot.source.clone(),
                in_flight: slot.in_flight.clone(),
            };
            let pool = self.pool.clone();
            let key = slot.key.clone();
            pending.push(async move {
                let outcome = job.run(pool, deadline, deadline_ms).await;
                (key, outcome)
            });
        }

        for (key, outcome) in join_all(pending).await {
            let result = match outcome {
                Ok(result) => result,
                Err(_) => {
                    SchedulerStats::bump(&self.stats.rejections);
                    self.gate.report(ScheduleError::PoolClosed {
                        key: key.clone(),
                        sequence,
                    });
                    SampleFailure::Rejected.into()
                }
            };
            results.push((key, result));
        }

        for (key, result) in &results {
            self.record(key, result);
        }
        results
    }

    fn record(&mut self, key: &str, result: &MetricResult) {
        let was_healthy = self
            .healthy
            .insert(key.to_string(), result.is_ok())
            .unwrap_or(true);
        let Some(failure) = result.failure_reason() else {
            if !was_healthy {
                tracing::info!(key, "metric recovered");
            }
            return;
        };
        match failure {
            SampleFailure::Source(_) => SchedulerStats::bump(&self.stats.source_failures),
            SampleFailure::Timeout { .. } => SchedulerStats::bump(&self.stats.timeouts),
            SampleFailure::Busy => SchedulerStats::bump(&self.stats.busy),
            SampleFailure::Rejected => {}
        }
        if was_healthy {
            tracing::warn!(key, reason = %failure, "metric unavailable");
        } else {
            tracing::debug!(key, reason = %failure, "metric still unavailable");
        }
    }
}

fn unix_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, operation = "get_timestamp", "system time error");
            0
        })
}

/// Handle to a running tick loop. Dropping it stops ticking.
pub struct SampleScheduler {
    cancel: CancellationToken,
    gate: Arc<DeliveryGate>,
    pool: Arc<Semaphore>,
    stats: Arc<SchedulerStats>,
    task: Option<JoinHandle<()>>,
}

impl SampleScheduler {
    /// Validate the configuration and spawn the tick loop; returns without waiting for a tick.
    /// Must be called within a tokio runtime.
    pub fn start(
        sources: Vec<Arc<dyn MetricSource>>,
        config: SchedulerConfig,
        sink: Arc<dyn SnapshotSink>,
    ) -> Result<Self, ConfigError> {
        if config.period.is_zero() {
            return Err(ConfigError::NonPositivePeriod);
        }
        if sources.is_empty() {
            return Err(ConfigError::NoSources);
        }
        {
            let mut seen = HashSet::with_capacity(sources.len());
            for source in &sources {
                if !seen.insert(source.key()) {
                    return Err(ConfigError::DuplicateKey(source.key().to_string()));
                }
            }
        }
        let workers = config.worker_count(sources.len());
        if workers == 0 {
            return Err(ConfigError::NoWorkers);
        }

        let deadline = sources
            .iter()
            .map(|s| s.duration_hint())
            .max()
            .unwrap_or_default()
            .saturating_add(config.deadline_grace)
            .min(MAX_TICK_DEADLINE);
        let slots = sources
            .into_iter()
            .map(|source| Slot {
                key: source.key().to_string(),
                source,
                in_flight: Arc::new(AtomicBool::new(false)),
            })
            .collect::<Vec<_>>();

        let cancel = CancellationToken::new();
        let gate = Arc::new(DeliveryGate {
            sink,
            open: Mutex::new(true),
        });
        let stats = Arc::new(SchedulerStats::default());
        let pool = Arc::new(Semaphore::new(workers));

        let span = tracing::info_span!(
            "scheduler",
            period_ms = config.period.as_millis() as u64,
            deadline_ms = deadline.as_millis() as u64,
            workers
        );
        tracing::info!(
            parent: &span,
            sources = slots.len(),
            keys = ?slots.iter().map(|s| s.key.as_str()).collect::<Vec<_>>(),
            "scheduler starting"
        );

        let ticker = Ticker {
            slots,
            pool: pool.clone(),
            period: config.period,
            deadline,
            stats_log_interval: config.stats_log_interval,
            gate: gate.clone(),
            stats: stats.clone(),
            cancel: cancel.clone(),
            healthy: HashMap::new(),
        };
        let task = tokio::spawn(ticker.run().instrument(span));

        Ok(Self {
            cancel,
            gate,
            pool,
            stats,
            task: Some(task),
        })
    }

    /// Stop ticking. No sink callback starts after this returns. Idempotent.
    /// Sources still queued for a pool slot in the current tick are not dispatched.
    ///
    /// Must not be called from inside a sink callback.
    pub fn stop(&self) {
        self.gate.close();
        self.pool.close();
        if !self.cancel.is_cancelled() {
            tracing::debug!("scheduler stop requested");
            self.cancel.cancel();
        }
    }

    /// Stop, then wait for the tick loop to drain its in-flight tick (bounded by the tick deadline).
    pub async fn shutdown(mut self) {
        self.stop();
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            tracing::warn!(error = %e, "scheduler task ended abnormally");
        }
    }

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled() && self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    pub fn stats(&self) -> Arc<SchedulerStats> {
        self.stats.clone()
    }
}

impl Drop for SampleScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
