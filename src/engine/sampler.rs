use crate::core::{ErrorContext, FailureRecord, Sample};
use crate::observability::SamplerMetrics;
use crate::sink::Persister;
use crate::sources::{AddressSource, LocationSource};
use log::{debug, error, info, warn};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerConfig {
    /// Time between cycle starts
    pub interval: Duration,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
        }
    }
}

/// What one cycle produced. Exactly one of the two, never both.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// The sample was written to the data partition
    Recorded(Sample),

    /// No sample; `persisted` says whether the failure record was written
    Failed {
        record: FailureRecord,
        persisted: bool,
    },
}

impl CycleOutcome {
    pub fn is_recorded(&self) -> bool {
        matches!(self, CycleOutcome::Recorded(_))
    }

    pub fn failure_context(&self) -> Option<ErrorContext> {
        match self {
            CycleOutcome::Recorded(_) => None,
            CycleOutcome::Failed { record, .. } => Some(record.error_context()),
        }
    }
}

/// The periodic sample-and-persist loop.
///
/// Cycles run strictly one after another on the caller's task; a cycle never
/// starts before the previous one's persistence attempt has finished.
pub struct Sampler {
    config: SamplerConfig,
    location: Box<dyn LocationSource>,
    address: Box<dyn AddressSource>,
    persister: Persister,
    metrics: Arc<SamplerMetrics>,
}

impl Sampler {
    pub fn new(
        config: SamplerConfig,
        location: Box<dyn LocationSource>,
        address: Box<dyn AddressSource>,
        persister: Persister,
    ) -> Self {
        Self {
            config,
            location,
            address,
            persister,
            metrics: Arc::new(SamplerMetrics::new()),
        }
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    pub fn metrics(&self) -> Arc<SamplerMetrics> {
        self.metrics.clone()
    }

    /// Run one cycle to completion. Failures are recorded, never returned.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let start = self.metrics.start_cycle();

        let outcome = match self.capture().await {
            Ok(sample) => match self.persister.write_sample(&sample).await {
                Ok(()) => {
                    self.metrics.record_sample_written();
                    info!(
                        "Recorded sample lat={} lon={} ip={}",
                        sample.latitude(),
                        sample.longitude(),
                        sample.public_ip()
                    );
                    CycleOutcome::Recorded(sample)
                }
                Err(e) => self.record_failure(ErrorContext::Persistence, e).await,
            },
            Err((context, e)) => self.record_failure(context, e).await,
        };

        self.metrics.finish_cycle(start);
        debug!("{}", self.metrics.summary());
        outcome
    }

    async fn capture(&self) -> Result<Sample, (ErrorContext, anyhow::Error)> {
        let reading = self
            .location
            .read_location()
            .await
            .map_err(|e| (ErrorContext::Location, e))?;
        let public_ip = self
            .address
            .public_address()
            .await
            .map_err(|e| (ErrorContext::Address, e))?;
        Ok(Sample::merge(reading, public_ip))
    }

    /// Best effort: a failure record that cannot be written is only logged.
    async fn record_failure(&mut self, context: ErrorContext, e: anyhow::Error) -> CycleOutcome {
        let record = FailureRecord::from_error(context, &e);
        warn!("Cycle failed during {}: {}", context, record.error_message());

        let persisted = match self.persister.write_failure(&record).await {
            Ok(()) => true,
            Err(write_error) => {
                error!(
                    "Could not persist {} failure record: {:#}",
                    context, write_error
                );
                false
            }
        };

        self.metrics.record_failure(context, persisted);
        CycleOutcome::Failed { record, persisted }
    }

    /// Run cycles on the configured cadence until `shutdown` resolves.
    ///
    /// Shutdown is only observed between cycles. Returns the number of
    /// cycles run.
    pub async fn run_until<F>(&mut self, shutdown: F) -> u64
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(self.config.interval);
        // An overlong cycle pushes the schedule back instead of causing a burst
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!(
            "Sampler started: interval {:?}, sink {}",
            self.config.interval,
            self.persister.backend()
        );

        let mut cycles = 0;
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = ticker.tick() => {}
            }
            self.run_cycle().await;
            cycles += 1;
        }

        info!("Sampler stopped after {} cycles: {}", cycles, self.metrics.summary());
        cycles
    }

    /// Run forever
    pub async fn run(&mut self) {
        self.run_until(std::future::pending()).await;
    }
}
