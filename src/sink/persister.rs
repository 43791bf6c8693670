use super::{SinkConnection, SinkConnector};
use crate::core::{FailureRecord, Sample};
use crate::resilience::RetryPolicy;
use anyhow::{anyhow, Result};
use log::{info, warn};
use std::time::Duration;
use tokio::time::timeout;

pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Copy)]
enum Record<'a> {
    Sample(&'a Sample),
    Failure(&'a FailureRecord),
}

impl Record<'_> {
    fn kind(&self) -> &'static str {
        match self {
            Record::Sample(_) => "sample",
            Record::Failure(_) => "failure record",
        }
    }
}

/// Writes records through a connector, reusing one connection across cycles.
///
/// Connecting follows the retry policy. Any failed insert drops the cached
/// connection so the next write starts from a fresh connect.
pub struct Persister {
    connector: Box<dyn SinkConnector>,
    retry: RetryPolicy,
    operation_timeout: Duration,
    connection: Option<Box<dyn SinkConnection>>,
}

impl Persister {
    pub fn new(connector: Box<dyn SinkConnector>, retry: RetryPolicy) -> Self {
        Self {
            connector,
            retry,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
            connection: None,
        }
    }

    /// Upper bound for each connect attempt and each insert
    pub fn with_operation_timeout(mut self, operation_timeout: Duration) -> Self {
        self.operation_timeout = operation_timeout;
        self
    }

    pub fn backend(&self) -> &str {
        self.connector.backend()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub async fn write_sample(&mut self, sample: &Sample) -> Result<()> {
        self.write(Record::Sample(sample)).await
    }

    pub async fn write_failure(&mut self, record: &FailureRecord) -> Result<()> {
        self.write(Record::Failure(record)).await
    }

    async fn write(&mut self, record: Record<'_>) -> Result<()> {
        let connection = match self.connection.take() {
            Some(connection) => connection,
            None => self.connect().await?,
        };

        let insert = async {
            match record {
                Record::Sample(sample) => connection.insert_sample(sample).await,
                Record::Failure(failure) => connection.insert_failure(failure).await,
            }
        };
        // A timed-out insert may still land on the server
        let result = match timeout(self.operation_timeout, insert).await {
            Ok(result) => result,
            Err(_) => Err(anyhow!(
                "{} insert timed out after {:?}; outcome unknown, the record may have been stored",
                record.kind(),
                self.operation_timeout
            )),
        };

        match result {
            Ok(()) => {
                self.connection = Some(connection);
                Ok(())
            }
            Err(e) => {
                warn!(
                    "Dropping {} connection after failed {} insert",
                    self.connector.backend(),
                    record.kind()
                );
                Err(e.context(format!("failed to insert {}", record.kind())))
            }
        }
    }

    async fn connect(&self) -> Result<Box<dyn SinkConnection>> {
        let connector = self.connector.as_ref();
        let operation_timeout = self.operation_timeout;
        let label = format!("{} connect", connector.backend());

        let connection = self
            .retry
            .run(&label, |_attempt| async move {
                match timeout(operation_timeout, connector.connect()).await {
                    Ok(result) => result,
                    Err(_) => Err(anyhow!("connect timed out after {:?}", operation_timeout)),
                }
            })
            .await?;

        info!("Connected to {} sink", connector.backend());
        Ok(connection)
    }
}
