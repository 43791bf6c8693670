use super::{SinkConnection, SinkConnector};
use crate::core::{FailureRecord, Partitions, Sample};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::{self, doc, Document};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection};
use std::time::Duration;

pub const DEFAULT_DATABASE: &str = "macbook_location";

/// Connects to MongoDB and writes into `<database>.location_<id>` and
/// `<database>.error_<id>`.
pub struct MongoConnector {
    uri: String,
    database: String,
    partitions: Partitions,
    timeout: Duration,
}

impl MongoConnector {
    pub fn new(
        uri: impl Into<String>,
        database: impl Into<String>,
        partitions: Partitions,
        timeout: Duration,
    ) -> Self {
        Self {
            uri: uri.into(),
            database: database.into(),
            partitions,
            timeout,
        }
    }
}

#[async_trait]
impl SinkConnector for MongoConnector {
    fn backend(&self) -> &str {
        "mongodb"
    }

    async fn connect(&self) -> Result<Box<dyn SinkConnection>> {
        let mut options = ClientOptions::parse(self.uri.as_str())
            .await
            .context("Failed to parse MongoDB connection string")?;
        options.app_name = Some("geoprobe".to_string());
        options.connect_timeout = Some(self.timeout);
        options.server_selection_timeout = Some(self.timeout);

        let client = Client::with_options(options).context("Failed to create MongoDB client")?;

        // Client construction is lazy; ping to prove the server is reachable
        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .context("MongoDB ping failed")?;

        let db = client.database(&self.database);
        Ok(Box::new(MongoConnection {
            data: db.collection(&self.partitions.data),
            errors: db.collection(&self.partitions.errors),
        }))
    }
}

struct MongoConnection {
    data: Collection<Document>,
    errors: Collection<Document>,
}

#[async_trait]
impl SinkConnection for MongoConnection {
    async fn insert_sample(&self, sample: &Sample) -> Result<()> {
        let document = sample_document(sample)?;
        self.data
            .insert_one(document)
            .await
            .with_context(|| format!("Failed to insert into {}", self.data.name()))?;
        Ok(())
    }

    async fn insert_failure(&self, record: &FailureRecord) -> Result<()> {
        let document = failure_document(record)?;
        self.errors
            .insert_one(document)
            .await
            .with_context(|| format!("Failed to insert into {}", self.errors.name()))?;
        Ok(())
    }
}

/// BSON form of a sample, with `timestamp` stored as a native date
pub fn sample_document(sample: &Sample) -> Result<Document> {
    let mut document = bson::to_document(sample).context("Failed to encode sample")?;
    document.insert("timestamp", bson_date(sample.timestamp()));
    Ok(document)
}

/// BSON form of a failure record, with `timestamp` stored as a native date
pub fn failure_document(record: &FailureRecord) -> Result<Document> {
    let mut document = bson::to_document(record).context("Failed to encode failure record")?;
    document.insert("timestamp", bson_date(record.timestamp()));
    Ok(document)
}

fn bson_date(at: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(at.timestamp_millis())
}
