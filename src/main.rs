use anyhow::Result;
use pcstatus::config::{AppConfig, DisplayConfig, DisplayFormat};
use pcstatus::models::StaticHostInfo;
use pcstatus::sink::{BroadcastSink, SamplerEvent};
use pcstatus::*;
use std::io::Write;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

/// Render every event until the sink side of the channel is gone.
async fn display_loop(
    mut rx: broadcast::Receiver<SamplerEvent>,
    info: StaticHostInfo,
    config: DisplayConfig,
) {
    let mut stdout = std::io::stdout();
    loop {
        let event = match rx.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "display lagging; skipped snapshots");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };
        let rendered = match event {
            SamplerEvent::Snapshot(snapshot) => match config.format {
                DisplayFormat::Text => {
                    display::render_frame(&info, &snapshot, config.clear_screen)
                }
                DisplayFormat::Json => match display::render_json(&snapshot) {
                    Ok(line) => line + "\n",
                    Err(e) => {
                        tracing::warn!(error = %e, "snapshot serialization failed");
                        continue;
                    }
                },
            },
            SamplerEvent::Error(e) => {
                if config.format == DisplayFormat::Json {
                    continue;
                }
                display::render_error(&e) + "\n"
            }
        };
        if let Err(e) = stdout
            .write_all(rendered.as_bytes())
            .and_then(|_| stdout.flush())
        {
            tracing::warn!(error = %e, "stdout write failed; stopping display");
            break;
        }
    }
    tracing::debug!("display task finished");
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = match tokio::signal::unix::signal(
            tokio::signal::unix::SignalKind::terminate(),
        ) {
            Ok(s) => s,
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    tracing::info!(name = version::NAME, version = version::VERSION, "starting");

    let app_config = AppConfig::load()?;
    let info = host_info::collect().await;
    tracing::info!(
        os = %info.os_label(),
        cpu = %info.cpu_model,
        logical_cores = info.logical_cores,
        "host identified"
    );

    let (sink, rx) = BroadcastSink::channel(app_config.display.channel_capacity);
    let display_handle = tokio::spawn(display_loop(
        rx,
        info,
        app_config.display.clone(),
    ));

    let handle = orchestrator::Orchestrator::with_default_sources(&app_config.sampling)
        .run(Arc::new(sink))
        .map_err(|e| anyhow::anyhow!("scheduler config: {}", e))?;

    shutdown_signal().await;
    tracing::info!("Received shutdown signal");
    handle.shutdown().await;
    let _ = display_handle.await;

    Ok(())
}
