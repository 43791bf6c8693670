use crate::core::ErrorContext;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Running counters for the sampler. Shared through `Arc`, updated with
/// relaxed atomics since readers only need a rough snapshot.
#[derive(Debug, Default)]
pub struct SamplerMetrics {
    cycles: AtomicU64,
    samples_written: AtomicU64,
    failures_recorded: AtomicU64,
    failures_dropped: AtomicU64,
    location_failures: AtomicU64,
    address_failures: AtomicU64,
    persistence_failures: AtomicU64,
    total_latency_us: AtomicU64,
}

impl SamplerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_cycle(&self) -> Instant {
        Instant::now()
    }

    pub fn finish_cycle(&self, start: Instant) {
        let latency_us = start.elapsed().as_micros() as u64;
        self.total_latency_us.fetch_add(latency_us, Ordering::Relaxed);
        self.cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sample_written(&self) {
        self.samples_written.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a failed cycle; `persisted` says whether its record reached the sink
    pub fn record_failure(&self, context: ErrorContext, persisted: bool) {
        self.counter_for(context).fetch_add(1, Ordering::Relaxed);
        if persisted {
            self.failures_recorded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failures_dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn counter_for(&self, context: ErrorContext) -> &AtomicU64 {
        match context {
            ErrorContext::Location => &self.location_failures,
            ErrorContext::Address => &self.address_failures,
            ErrorContext::Persistence => &self.persistence_failures,
        }
    }

    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }

    pub fn samples_written(&self) -> u64 {
        self.samples_written.load(Ordering::Relaxed)
    }

    pub fn failures_recorded(&self) -> u64 {
        self.failures_recorded.load(Ordering::Relaxed)
    }

    pub fn failures_dropped(&self) -> u64 {
        self.failures_dropped.load(Ordering::Relaxed)
    }

    pub fn failures_in(&self, context: ErrorContext) -> u64 {
        self.counter_for(context).load(Ordering::Relaxed)
    }

    pub fn avg_latency_us(&self) -> u64 {
        let cycles = self.cycles();
        if cycles == 0 {
            return 0;
        }
        self.total_latency_us.load(Ordering::Relaxed) / cycles
    }

    pub fn summary(&self) -> String {
        let by_context = ErrorContext::ALL
            .iter()
            .map(|c| format!("{}={}", c, self.failures_in(*c)))
            .collect::<Vec<_>>()
            .join(" ");
        format!(
            "cycles={} samples={} failures_recorded={} failures_dropped={} [{}] avg_cycle={}ms",
            self.cycles(),
            self.samples_written(),
            self.failures_recorded(),
            self.failures_dropped(),
            by_context,
            self.avg_latency_us() / 1000
        )
    }
}
