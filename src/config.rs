use crate::scheduler::{DEFAULT_DEADLINE_GRACE, DEFAULT_PERIOD, SchedulerConfig};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SamplingConfig {
    #[serde(default = "default_period_ms")]
    pub period_ms: u64,
    /// Measurement window for the CPU utilization sources.
    #[serde(default = "default_cpu_window_ms")]
    pub cpu_window_ms: u64,
    /// Worker pool size; defaults to one slot per source (max 10).
    #[serde(default)]
    pub max_workers: Option<usize>,
    /// Slack added to the slowest source's window to form the tick deadline.
    #[serde(default = "default_deadline_grace_ms")]
    pub deadline_grace_ms: u64,
    /// How often to log scheduler counters at INFO level.
    #[serde(default = "default_stats_log_interval_secs")]
    pub stats_log_interval_secs: u64,
}

fn default_period_ms() -> u64 {
    DEFAULT_PERIOD.as_millis() as u64
}

fn default_cpu_window_ms() -> u64 {
    1000
}

fn default_deadline_grace_ms() -> u64 {
    DEFAULT_DEADLINE_GRACE.as_millis() as u64
}

fn default_stats_log_interval_secs() -> u64 {
    60
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            period_ms: default_period_ms(),
            cpu_window_ms: default_cpu_window_ms(),
            max_workers: None,
            deadline_grace_ms: default_deadline_grace_ms(),
            stats_log_interval_secs: default_stats_log_interval_secs(),
        }
    }
}

impl SamplingConfig {
    pub fn cpu_window(&self) -> Duration {
        Duration::from_millis(self.cpu_window_ms)
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            period: Duration::from_millis(self.period_ms),
            max_workers: self.max_workers,
            deadline_grace: Duration::from_millis(self.deadline_grace_ms),
            stats_log_interval: Duration::from_secs(self.stats_log_interval_secs),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayFormat {
    #[default]
    Text,
    /// One JSON object per snapshot.
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    #[serde(default)]
    pub format: DisplayFormat,
    /// Redraw in place (text format only).
    #[serde(default = "default_clear_screen")]
    pub clear_screen: bool,
    /// Events buffered for the display task before it starts skipping snapshots.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_clear_screen() -> bool {
    true
}

fn default_channel_capacity() -> usize {
    16
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            format: DisplayFormat::default(),
            clear_screen: default_clear_screen(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl AppConfig {
    /// Load from `$CONFIG_FILE` (default `config.toml`). A missing file yields defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        Self::load_from_path(&path)
    }

    pub fn load_from_path(path: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(s) => Self::load_from_str(&s),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path, "config file not found; using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!("reading {}: {}", path, e)),
        }
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.sampling.period_ms > 0,
            "sampling.period_ms must be > 0, got {}",
            self.sampling.period_ms
        );
        anyhow::ensure!(
            self.sampling.cpu_window_ms > 0,
            "sampling.cpu_window_ms must be > 0, got {}",
            self.sampling.cpu_window_ms
        );
        if let Some(workers) = self.sampling.max_workers {
            anyhow::ensure!(
                workers > 0,
                "sampling.max_workers must be > 0, got {}",
                workers
            );
        }
        anyhow::ensure!(
            self.sampling.stats_log_interval_secs > 0,
            "sampling.stats_log_interval_secs must be > 0, got {}",
            self.sampling.stats_log_interval_secs
        );
        anyhow::ensure!(
            self.display.channel_capacity > 0,
            "display.channel_capacity must be > 0, got {}",
            self.display.channel_capacity
        );
        Ok(())
    }
}
