// Wires sources to the scheduler and owns shutdown ordering

use crate::config::SamplingConfig;
use crate::error::ConfigError;
use crate::scheduler::{SampleScheduler, SchedulerConfig, SchedulerStats};
use crate::sink::SnapshotSink;
use crate::source::{self, MetricSource};
use std::sync::Arc;

/// Source set plus scheduler settings, ready to run.
pub struct Orchestrator {
    sources: Vec<Arc<dyn MetricSource>>,
    config: SchedulerConfig,
}

impl Orchestrator {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            sources: Vec::new(),
            config,
        }
    }

    /// CPU aggregate, CPU per-core and memory sources with the configured timings.
    pub fn with_default_sources(sampling: &SamplingConfig) -> Self {
        let mut orchestrator = Self::new(sampling.scheduler_config());
        for s in source::default_sources(sampling.cpu_window()) {
            orchestrator.register(s);
        }
        orchestrator
    }

    pub fn register(&mut self, source: Arc<dyn MetricSource>) -> &mut Self {
        self.sources.push(source);
        self
    }

    pub fn keys(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.key()).collect()
    }

    /// Start ticking into `sink`. Fails on invalid configuration (duplicate keys, zero period).
    pub fn run(self, sink: Arc<dyn SnapshotSink>) -> Result<OrchestratorHandle, ConfigError> {
        let scheduler = SampleScheduler::start(self.sources.clone(), self.config, sink)?;
        Ok(OrchestratorHandle {
            scheduler,
            sources: self.sources,
        })
    }
}

/// Running orchestrator. Sources are released only after the scheduler has drained.
pub struct OrchestratorHandle {
    scheduler: SampleScheduler,
    sources: Vec<Arc<dyn MetricSource>>,
}

impl OrchestratorHandle {
    /// Stop delivering immediately without waiting for the in-flight tick. Idempotent.
    pub fn stop(&self) {
        self.scheduler.stop();
    }

    /// Stop the scheduler, wait for it to drain, then release the sources.
    /// No snapshot is delivered once this has been called.
    pub async fn shutdown(self) {
        let Self { scheduler, sources } = self;
        let stats = scheduler.stats();
        scheduler.shutdown().await;
        drop(sources);
        tracing::info!(ticks = stats.ticks(), "orchestrator shut down");
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn stats(&self) -> Arc<SchedulerStats> {
        self.scheduler.stats()
    }
}
