use crate::core::{FailureRecord, Sample};
use anyhow::Result;
use async_trait::async_trait;

/// Opens connections to a storage backend.
///
/// A connector is bound to one device's partitions at construction.
#[async_trait]
pub trait SinkConnector: Send + Sync {
    /// Backend identifier (e.g., "mongodb", "jsonl")
    fn backend(&self) -> &str;

    /// Establish and verify a connection
    async fn connect(&self) -> Result<Box<dyn SinkConnection>>;
}

/// An open connection able to write both record kinds
#[async_trait]
pub trait SinkConnection: Send + Sync {
    /// Write to the data partition
    async fn insert_sample(&self, sample: &Sample) -> Result<()>;

    /// Write to the errors partition
    async fn insert_failure(&self, record: &FailureRecord) -> Result<()>;
}
