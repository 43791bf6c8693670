//! In-memory sink for tests and dry runs.

use super::{SinkConnection, SinkConnector};
use crate::core::{FailureRecord, Sample};
use crate::sources::mock::{lock, Journal};
use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct MemoryState {
    samples: Vec<Sample>,
    failures: Vec<FailureRecord>,
    connect_attempts: usize,
    failing_connects: usize,
    reject_samples: bool,
    reject_failures: bool,
}

/// Records everything written to it. Cloning shares the same storage, so a
/// test keeps one handle while the persister owns another.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    state: Arc<Mutex<MemoryState>>,
    journal: Option<Journal>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Fail the next `count` connect attempts
    pub fn fail_next_connects(&self, count: usize) {
        lock(&self.state).failing_connects = count;
    }

    /// Make sample inserts fail while set
    pub fn reject_samples(&self, reject: bool) {
        lock(&self.state).reject_samples = reject;
    }

    /// Make failure-record inserts fail while set
    pub fn reject_failures(&self, reject: bool) {
        lock(&self.state).reject_failures = reject;
    }

    pub fn samples(&self) -> Vec<Sample> {
        lock(&self.state).samples.clone()
    }

    pub fn failures(&self) -> Vec<FailureRecord> {
        lock(&self.state).failures.clone()
    }

    pub fn connect_attempts(&self) -> usize {
        lock(&self.state).connect_attempts
    }

    fn note(&self, event: &str) {
        if let Some(journal) = &self.journal {
            journal.record(event);
        }
    }
}

#[async_trait]
impl SinkConnector for MemorySink {
    fn backend(&self) -> &str {
        "memory"
    }

    async fn connect(&self) -> Result<Box<dyn SinkConnection>> {
        self.note("connect");
        let mut state = lock(&self.state);
        state.connect_attempts += 1;
        if state.failing_connects > 0 {
            state.failing_connects -= 1;
            bail!("connection refused (attempt {})", state.connect_attempts);
        }
        drop(state);
        Ok(Box::new(self.clone()))
    }
}

#[async_trait]
impl SinkConnection for MemorySink {
    async fn insert_sample(&self, sample: &Sample) -> Result<()> {
        self.note("insert_sample");
        let mut state = lock(&self.state);
        if state.reject_samples {
            bail!("sample insert rejected");
        }
        state.samples.push(sample.clone());
        Ok(())
    }

    async fn insert_failure(&self, record: &FailureRecord) -> Result<()> {
        self.note("insert_failure");
        let mut state = lock(&self.state);
        if state.reject_failures {
            bail!("failure insert rejected");
        }
        state.failures.push(record.clone());
        Ok(())
    }
}
