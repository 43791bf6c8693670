use geoprobe::core::{ErrorContext, LocationReading};
use geoprobe::engine::{CycleOutcome, Sampler, SamplerConfig};
use geoprobe::resilience::RetryPolicy;
use geoprobe::sink::mock::MemorySink;
use geoprobe::sink::Persister;
use geoprobe::sources::mock::{ScriptedLocationSource, StaticAddressSource};
use std::sync::Arc;
use std::time::Duration;

fn san_francisco() -> LocationReading {
    LocationReading {
        accuracy: Some(5.0),
        altitude: Some(0.0),
        address: Some("San Francisco, CA".to_string()),
        ..LocationReading::new(37.7749, -122.4194)
    }
}

fn sampler_with(
    location: ScriptedLocationSource,
    address: StaticAddressSource,
    sink: &MemorySink,
) -> Sampler {
    let persister = Persister::new(
        Box::new(sink.clone()),
        RetryPolicy::fixed(3, Duration::from_millis(1)),
    );
    Sampler::new(
        SamplerConfig {
            interval: Duration::from_secs(1),
        },
        Box::new(location),
        Box::new(address),
        persister,
    )
}

#[tokio::test]
async fn test_scenario_merges_reading_and_address() {
    let sink = MemorySink::new();
    let mut sampler = sampler_with(
        ScriptedLocationSource::fixed(san_francisco()),
        StaticAddressSource::new("203.0.113.42"),
        &sink,
    );

    let before = chrono::Utc::now();
    let outcome = sampler.run_cycle().await;
    let after = chrono::Utc::now();

    assert!(outcome.is_recorded());
    let samples = sink.samples();
    assert_eq!(samples.len(), 1);
    assert!(sink.failures().is_empty());

    let sample = &samples[0];
    assert_eq!(sample.latitude(), 37.7749);
    assert_eq!(sample.longitude(), -122.4194);
    assert_eq!(sample.accuracy(), Some(5.0));
    assert_eq!(sample.altitude(), Some(0.0));
    assert_eq!(sample.address(), Some("San Francisco, CA"));
    assert_eq!(sample.public_ip(), "203.0.113.42");
    // Millisecond truncation may put the stamp just before `before`
    assert!(sample.timestamp() >= before - chrono::Duration::milliseconds(1));
    assert!(sample.timestamp() <= after);
}

#[tokio::test]
async fn test_sentinel_values_pass_through() {
    let reading = LocationReading {
        speed: Some(-1.0),
        direction: Some(-1.0),
        vertical_accuracy: Some(-1.0),
        ..san_francisco()
    };
    let sink = MemorySink::new();
    let mut sampler = sampler_with(
        ScriptedLocationSource::fixed(reading),
        StaticAddressSource::new("203.0.113.42"),
        &sink,
    );

    match sampler.run_cycle().await {
        CycleOutcome::Recorded(sample) => {
            assert_eq!(sample.speed(), Some(-1.0));
            assert_eq!(sample.direction(), Some(-1.0));
            assert_eq!(sample.vertical_accuracy(), Some(-1.0));
        }
        other => panic!("expected a sample, got {:?}", other),
    }
    assert_eq!(sink.samples()[0].speed(), Some(-1.0));
}

#[tokio::test]
async fn test_location_failure_records_failure_only() {
    let sink = MemorySink::new();
    let address = Arc::new(StaticAddressSource::new("203.0.113.42"));
    let persister = Persister::new(Box::new(sink.clone()), RetryPolicy::once());
    let mut sampler = Sampler::new(
        SamplerConfig::default(),
        Box::new(ScriptedLocationSource::failing("corelocationcli failed with exit code 1")),
        Box::new(address.clone()),
        persister,
    );

    let outcome = sampler.run_cycle().await;

    assert_eq!(outcome.failure_context(), Some(ErrorContext::Location));
    assert!(sink.samples().is_empty());
    let failures = sink.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].error_context(), ErrorContext::Location);
    assert!(failures[0].error_message().contains("exit code 1"));
    // Address lookup is skipped once location has failed
    assert_eq!(address.calls(), 0);
}

#[tokio::test]
async fn test_address_failure_records_address_context() {
    let sink = MemorySink::new();
    let mut sampler = sampler_with(
        ScriptedLocationSource::fixed(san_francisco()),
        StaticAddressSource::failing("connection timed out"),
        &sink,
    );

    let outcome = sampler.run_cycle().await;

    assert!(matches!(outcome, CycleOutcome::Failed { persisted: true, .. }));
    assert_eq!(outcome.failure_context(), Some(ErrorContext::Address));
    assert!(sink.samples().is_empty());
    assert_eq!(sink.failures().len(), 1);
}

#[tokio::test]
async fn test_rejected_sample_becomes_persistence_failure() {
    let sink = MemorySink::new();
    sink.reject_samples(true);
    let mut sampler = sampler_with(
        ScriptedLocationSource::fixed(san_francisco()),
        StaticAddressSource::new("203.0.113.42"),
        &sink,
    );

    let outcome = sampler.run_cycle().await;

    assert_eq!(outcome.failure_context(), Some(ErrorContext::Persistence));
    assert!(sink.samples().is_empty());
    let failures = sink.failures();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].error_message().contains("sample insert rejected"));
}

#[tokio::test]
async fn test_unwritable_failure_record_does_not_stop_loop() {
    let sink = MemorySink::new();
    sink.reject_failures(true);
    let location = ScriptedLocationSource::fixed(san_francisco())
        .then(Err("location services disabled".to_string()));
    let mut sampler = sampler_with(location, StaticAddressSource::new("203.0.113.42"), &sink);
    let metrics = sampler.metrics();

    let first = sampler.run_cycle().await;
    assert!(matches!(first, CycleOutcome::Failed { persisted: false, .. }));

    // The next cycle proceeds normally
    let second = sampler.run_cycle().await;
    assert!(second.is_recorded());

    assert_eq!(sink.samples().len(), 1);
    assert!(sink.failures().is_empty());
    assert_eq!(metrics.cycles(), 2);
    assert_eq!(metrics.failures_dropped(), 1);
    assert_eq!(metrics.samples_written(), 1);
}

#[tokio::test]
async fn test_every_cycle_produces_exactly_one_record() {
    let sink = MemorySink::new();
    let location = ScriptedLocationSource::fixed(san_francisco())
        .then(Ok(san_francisco()))
        .then(Err("timeout".to_string()))
        .then(Ok(san_francisco()))
        .then(Err("not authorized".to_string()));
    let mut sampler = sampler_with(location, StaticAddressSource::new("203.0.113.42"), &sink);

    let mut recorded = 0;
    let mut failed = 0;
    for _ in 0..6 {
        match sampler.run_cycle().await {
            CycleOutcome::Recorded(_) => recorded += 1,
            CycleOutcome::Failed { .. } => failed += 1,
        }
    }

    assert_eq!(recorded, 4);
    assert_eq!(failed, 2);
    assert_eq!(sink.samples().len(), recorded);
    assert_eq!(sink.failures().len(), failed);
}

#[tokio::test]
async fn test_reading_without_optional_fields_is_a_sample() {
    let sink = MemorySink::new();
    let mut sampler = sampler_with(
        ScriptedLocationSource::fixed(LocationReading::new(51.5, -0.12)),
        StaticAddressSource::new("198.51.100.9"),
        &sink,
    );

    let outcome = sampler.run_cycle().await;

    assert!(outcome.is_recorded());
    let sample = &sink.samples()[0];
    assert_eq!(sample.address(), None);
    assert_eq!(sample.speed(), None);
}
