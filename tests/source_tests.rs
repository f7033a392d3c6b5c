// Host sources via sysinfo (range checks only; values depend on the machine)

use pcstatus::models::*;
use pcstatus::source::{
    CPU_AGGREGATE, CPU_PER_CORE, CpuAggregateSource, CpuPerCoreSource, FnSource, MEMORY,
    MemorySource, MetricSource, default_sources,
};
use std::time::Duration;

const WINDOW: Duration = Duration::from_millis(250);

#[test]
fn memory_source_reports_consistent_usage() {
    let source = MemorySource::new();
    assert_eq!(source.key(), MEMORY);
    match source.sample() {
        MetricResult::Ok(MetricValue::Memory(m)) => {
            assert!((0.0..=100.0).contains(&m.used_percent));
            assert!(m.used_bytes + m.available_bytes > 0);
        }
        MetricResult::Ok(other) => panic!("unexpected value: {:?}", other),
        MetricResult::Failed(f) => assert!(matches!(f, SampleFailure::Source(_))),
    }
}

#[test]
fn cpu_aggregate_source_reports_percent() {
    let source = CpuAggregateSource::new(WINDOW);
    assert_eq!(source.key(), CPU_AGGREGATE);
    assert_eq!(source.duration_hint(), WINDOW);
    match source.sample() {
        MetricResult::Ok(MetricValue::Percent(p)) => assert!((0.0..=100.0).contains(&p)),
        MetricResult::Ok(other) => panic!("unexpected value: {:?}", other),
        MetricResult::Failed(f) => assert!(matches!(f, SampleFailure::Source(_))),
    }
}

#[test]
fn cpu_per_core_source_reports_one_value_per_core() {
    let source = CpuPerCoreSource::new(WINDOW);
    assert_eq!(source.key(), CPU_PER_CORE);
    match source.sample() {
        MetricResult::Ok(MetricValue::PerCore(cores)) => {
            assert!(!cores.is_empty());
            assert!(cores.iter().all(|p| (0.0..=100.0).contains(p)));
        }
        MetricResult::Ok(other) => panic!("unexpected value: {:?}", other),
        MetricResult::Failed(f) => assert!(matches!(f, SampleFailure::Source(_))),
    }
}

#[test]
fn fn_source_passes_through_key_hint_and_result() {
    let source = FnSource::new("custom", Duration::from_millis(7), || {
        MetricResult::failure("unsupported counter")
    });
    assert_eq!(source.key(), "custom");
    assert_eq!(source.duration_hint(), Duration::from_millis(7));
    assert_eq!(
        source.sample(),
        MetricResult::Failed(SampleFailure::Source("unsupported counter".into()))
    );
}

#[test]
fn default_sources_use_the_cpu_window() {
    let sources = default_sources(WINDOW);
    let keys: Vec<&str> = sources.iter().map(|s| s.key()).collect();
    assert_eq!(keys, vec![CPU_AGGREGATE, CPU_PER_CORE, MEMORY]);
    assert_eq!(sources[0].duration_hint(), WINDOW);
    assert_eq!(sources[1].duration_hint(), WINDOW);
    assert!(sources[2].duration_hint() < WINDOW);
}
