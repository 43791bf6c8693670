use super::{SinkConnection, SinkConnector};
use crate::core::{FailureRecord, Partitions, Sample};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Appends one JSON object per line to `<dir>/location_<id>.jsonl` and
/// `<dir>/error_<id>.jsonl`.
pub struct JsonLinesConnector {
    dir: PathBuf,
    partitions: Partitions,
}

impl JsonLinesConnector {
    pub fn new(dir: impl Into<PathBuf>, partitions: Partitions) -> Self {
        Self {
            dir: dir.into(),
            partitions,
        }
    }

    pub fn data_path(&self) -> PathBuf {
        partition_path(&self.dir, &self.partitions.data)
    }

    pub fn errors_path(&self) -> PathBuf {
        partition_path(&self.dir, &self.partitions.errors)
    }
}

fn partition_path(dir: &Path, partition: &str) -> PathBuf {
    dir.join(format!("{partition}.jsonl"))
}

#[async_trait]
impl SinkConnector for JsonLinesConnector {
    fn backend(&self) -> &str {
        "jsonl"
    }

    async fn connect(&self) -> Result<Box<dyn SinkConnection>> {
        fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create sink directory {:?}", self.dir))?;

        let connection = JsonLinesConnection {
            data: self.data_path(),
            errors: self.errors_path(),
        };
        // Opening both files up front surfaces permission problems at connect time
        open_append(&connection.data).await?;
        open_append(&connection.errors).await?;

        Ok(Box::new(connection))
    }
}

struct JsonLinesConnection {
    data: PathBuf,
    errors: PathBuf,
}

#[async_trait]
impl SinkConnection for JsonLinesConnection {
    async fn insert_sample(&self, sample: &Sample) -> Result<()> {
        append_line(&self.data, sample).await
    }

    async fn insert_failure(&self, record: &FailureRecord) -> Result<()> {
        append_line(&self.errors, record).await
    }
}

async fn open_append(path: &Path) -> Result<fs::File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .with_context(|| format!("Failed to open {:?}", path))
}

async fn append_line<T: Serialize + Sync>(path: &Path, record: &T) -> Result<()> {
    let mut line = serde_json::to_string(record).context("Failed to serialize record")?;
    line.push('\n');

    let mut file = open_append(path).await?;
    file.write_all(line.as_bytes())
        .await
        .with_context(|| format!("Failed to append to {:?}", path))?;
    file.flush().await?;
    Ok(())
}
