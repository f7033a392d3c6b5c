// Terminal rendering of host identity + latest snapshot

use crate::error::ScheduleError;
use crate::models::{MemoryStatus, MetricResult, MetricValue, Snapshot, StaticHostInfo};
use crate::source::{CPU_AGGREGATE, CPU_PER_CORE, MEMORY};
use std::fmt::Write;

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Bytes to GiB, rounded to one decimal.
pub fn bytes_to_gib(bytes: u64) -> f64 {
    (bytes as f64 / 1024.0 / 1024.0 / 1024.0 * 10.0).round() / 10.0
}

fn unavailable(result: Option<&MetricResult>) -> String {
    match result {
        Some(MetricResult::Failed(f)) => format!("unavailable ({})", f),
        Some(MetricResult::Ok(_)) => "unavailable (unexpected value)".into(),
        None => "unavailable (not sampled)".into(),
    }
}

fn aggregate_line(snapshot: &Snapshot) -> String {
    match snapshot.value(CPU_AGGREGATE) {
        Some(MetricValue::Percent(p)) => format!("{:.1}%", p),
        _ => unavailable(snapshot.get(CPU_AGGREGATE)),
    }
}

fn per_core_rows(snapshot: &Snapshot, out: &mut String) {
    match snapshot.value(CPU_PER_CORE) {
        Some(MetricValue::PerCore(cores)) => {
            let _ = writeln!(out, "  {:<10}{:>8}", "Core", "Percent");
            for (i, p) in cores.iter().enumerate() {
                let _ = writeln!(out, "  {:<10}{:>7.1}%", format!("Core {}", i), p);
            }
        }
        _ => {
            let _ = writeln!(out, "  Per core : {}", unavailable(snapshot.get(CPU_PER_CORE)));
        }
    }
}

fn memory_row(snapshot: &Snapshot, out: &mut String) {
    match snapshot.value(MEMORY) {
        Some(MetricValue::Memory(MemoryStatus {
            used_bytes,
            available_bytes,
            used_percent,
        })) => {
            let _ = writeln!(out, "  {:<12}{:<12}{:>8}", "Used", "Available", "Percent");
            let _ = writeln!(
                out,
                "  {:<12}{:<12}{:>7.1}%",
                format!("{}GB", bytes_to_gib(*used_bytes)),
                format!("{}GB", bytes_to_gib(*available_bytes)),
                used_percent
            );
        }
        _ => {
            let _ = writeln!(out, "  Usage : {}", unavailable(snapshot.get(MEMORY)));
        }
    }
}

fn local_time(timestamp_ms: u64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms as i64)
        .map(|t| {
            t.with_timezone(&chrono::Local)
                .format("%H:%M:%S%.3f")
                .to_string()
        })
        .unwrap_or_else(|| "?".into())
}

/// OS / CPU / Memory frames for one snapshot. Failed metrics render as "unavailable (...)".
pub fn render_text(info: &StaticHostInfo, snapshot: &Snapshot) -> String {
    let mut out = String::new();
    let physical = info
        .physical_cores
        .map(|n| n.to_string())
        .unwrap_or_else(|| "?".into());

    let _ = writeln!(out, "OS");
    let _ = writeln!(out, "  {}", info.os_label());
    let _ = writeln!(out, "CPU");
    let _ = writeln!(out, "  {}", info.cpu_model);
    let _ = writeln!(out, "  Micro Architecture : {}", info.microarchitecture);
    let _ = writeln!(
        out,
        "  Physical / Logical : {} Core / {} Core",
        physical, info.logical_cores
    );
    let _ = writeln!(out, "  Used : {}", aggregate_line(snapshot));
    per_core_rows(snapshot, &mut out);
    let _ = writeln!(out, "Memory");
    let _ = writeln!(
        out,
        "  RAM Capacity: {}GB",
        bytes_to_gib(info.total_memory_bytes)
    );
    memory_row(snapshot, &mut out);
    let _ = writeln!(
        out,
        "#{} at {}",
        snapshot.sequence(),
        local_time(snapshot.timestamp())
    );
    out
}

/// Text frame prefixed with a clear-screen sequence when redrawing in place.
pub fn render_frame(info: &StaticHostInfo, snapshot: &Snapshot, clear_screen: bool) -> String {
    let body = render_text(info, snapshot);
    if clear_screen {
        format!("{}{}", CLEAR_SCREEN, body)
    } else {
        body
    }
}

/// One JSON object per snapshot.
pub fn render_json(snapshot: &Snapshot) -> serde_json::Result<String> {
    serde_json::to_string(snapshot)
}

pub fn render_error(error: &ScheduleError) -> String {
    format!("scheduler: {}", error)
}
