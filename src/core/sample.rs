use super::LocationReading;
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// A successful cycle: one location reading merged with the public address.
///
/// Fields are private; a `Sample` is built once by [`Sample::merge`] and only
/// ever read afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    timestamp: DateTime<Utc>,
    latitude: f64,
    longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    accuracy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    direction: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    altitude: Option<f64>,
    #[serde(
        rename = "verticalAccuracy",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    vertical_accuracy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    address: Option<String>,
    public_ip: String,
}

impl Sample {
    /// Merge a reading and an address, stamped with the current time.
    pub fn merge(reading: LocationReading, public_ip: impl Into<String>) -> Self {
        Self::merge_at(reading, public_ip, Utc::now())
    }

    /// Same as [`Sample::merge`] with an explicit capture instant, truncated
    /// to milliseconds.
    pub fn merge_at(
        reading: LocationReading,
        public_ip: impl Into<String>,
        captured_at: DateTime<Utc>,
    ) -> Self {
        Self {
            timestamp: captured_at.trunc_subsecs(3),
            latitude: reading.latitude,
            longitude: reading.longitude,
            accuracy: reading.accuracy,
            speed: reading.speed,
            direction: reading.direction,
            altitude: reading.altitude,
            vertical_accuracy: reading.vertical_accuracy,
            address: reading.address,
            public_ip: public_ip.into(),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn accuracy(&self) -> Option<f64> {
        self.accuracy
    }

    pub fn speed(&self) -> Option<f64> {
        self.speed
    }

    pub fn direction(&self) -> Option<f64> {
        self.direction
    }

    pub fn altitude(&self) -> Option<f64> {
        self.altitude
    }

    pub fn vertical_accuracy(&self) -> Option<f64> {
        self.vertical_accuracy
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn public_ip(&self) -> &str {
        &self.public_ip
    }
}
