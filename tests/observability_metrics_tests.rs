use geoprobe::core::ErrorContext;
use geoprobe::observability::SamplerMetrics;
use std::sync::Arc;

#[test]
fn test_metrics_creation() {
    let metrics = SamplerMetrics::new();
    assert_eq!(metrics.cycles(), 0);
    assert_eq!(metrics.samples_written(), 0);
    assert_eq!(metrics.avg_latency_us(), 0);
}

#[test]
fn test_failure_counters_by_context() {
    let metrics = Arc::new(SamplerMetrics::new());

    metrics.record_failure(ErrorContext::Location, true);
    metrics.record_failure(ErrorContext::Location, false);
    metrics.record_failure(ErrorContext::Persistence, true);
    metrics.record_sample_written();

    assert_eq!(metrics.failures_in(ErrorContext::Location), 2);
    assert_eq!(metrics.failures_in(ErrorContext::Address), 0);
    assert_eq!(metrics.failures_in(ErrorContext::Persistence), 1);
    assert_eq!(metrics.failures_recorded(), 2);
    assert_eq!(metrics.failures_dropped(), 1);

    let summary = metrics.summary();
    assert!(summary.contains("samples=1"));
    assert!(summary.contains("location=2"));
}

#[tokio::test]
async fn test_cycle_latency_tracking() {
    let metrics = SamplerMetrics::new();

    let start = metrics.start_cycle();
    tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
    metrics.finish_cycle(start);

    assert_eq!(metrics.cycles(), 1);
    assert!(metrics.avg_latency_us() >= 10_000);
}
