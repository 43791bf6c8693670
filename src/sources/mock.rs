//! Deterministic sources for tests and dry runs.

use super::{AddressSource, LocationSource};
use crate::core::LocationReading;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

/// Shared, ordered record of calls made across fakes
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<(Instant, String)>>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: impl Into<String>) {
        lock(&self.entries).push((Instant::now(), event.into()));
    }

    pub fn events(&self) -> Vec<String> {
        lock(&self.entries).iter().map(|(_, e)| e.clone()).collect()
    }

    pub fn entries(&self) -> Vec<(Instant, String)> {
        lock(&self.entries).clone()
    }

    /// Instants at which `event` was recorded
    pub fn times_of(&self, event: &str) -> Vec<Instant> {
        lock(&self.entries)
            .iter()
            .filter(|(_, e)| e == event)
            .map(|(t, _)| *t)
            .collect()
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Replays a script of readings and failures, then repeats the fallback.
pub struct ScriptedLocationSource {
    script: Mutex<VecDeque<Result<LocationReading, String>>>,
    fallback: Result<LocationReading, String>,
    delay: Duration,
    journal: Option<Journal>,
    calls: Mutex<usize>,
}

impl ScriptedLocationSource {
    /// Always returns `reading`
    pub fn fixed(reading: LocationReading) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Ok(reading),
            delay: Duration::ZERO,
            journal: None,
            calls: Mutex::new(0),
        }
    }

    /// Always fails with `message`
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            fallback: Err(message.into()),
            ..Self::fixed(LocationReading::default())
        }
    }

    /// Queue one outcome ahead of the fallback
    pub fn then(self, outcome: Result<LocationReading, String>) -> Self {
        lock(&self.script).push_back(outcome);
        self
    }

    /// Simulate a slow utility
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn calls(&self) -> usize {
        *lock(&self.calls)
    }
}

#[async_trait]
impl LocationSource for ScriptedLocationSource {
    fn name(&self) -> &str {
        "scripted-location"
    }

    async fn read_location(&self) -> Result<LocationReading> {
        if let Some(journal) = &self.journal {
            journal.record("location");
        }
        *lock(&self.calls) += 1;

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let next = lock(&self.script).pop_front();
        match next.unwrap_or_else(|| self.fallback.clone()) {
            Ok(reading) => Ok(reading),
            Err(message) => Err(anyhow!(message)),
        }
    }
}

/// Returns a fixed address, or a fixed failure.
pub struct StaticAddressSource {
    outcome: Result<String, String>,
    journal: Option<Journal>,
    calls: Mutex<usize>,
}

impl StaticAddressSource {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            outcome: Ok(address.into()),
            journal: None,
            calls: Mutex::new(0),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            outcome: Err(message.into()),
            journal: None,
            calls: Mutex::new(0),
        }
    }

    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn calls(&self) -> usize {
        *lock(&self.calls)
    }
}

#[async_trait]
impl AddressSource for StaticAddressSource {
    fn name(&self) -> &str {
        "static-address"
    }

    async fn public_address(&self) -> Result<String> {
        if let Some(journal) = &self.journal {
            journal.record("address");
        }
        *lock(&self.calls) += 1;

        self.outcome.clone().map_err(|message| anyhow!(message))
    }
}
