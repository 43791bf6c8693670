use super::LocationSource;
use crate::core::LocationReading;
use crate::error::SourceError;
use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

pub const DEFAULT_COMMAND: &str = "/opt/homebrew/bin/corelocationcli";

/// Runs the CoreLocation command line utility and parses its JSON output.
pub struct CoreLocationSource {
    command: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl CoreLocationSource {
    pub fn new(command: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            args: vec!["--json".to_string()],
            timeout,
        }
    }

    /// Replace the default `--json` argument list
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    fn command_name(&self) -> String {
        self.command.display().to_string()
    }
}

#[async_trait]
impl LocationSource for CoreLocationSource {
    fn name(&self) -> &str {
        self.command
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("location command")
    }

    async fn read_location(&self) -> Result<LocationReading> {
        let mut command = Command::new(&self.command);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        // The child is killed if the timeout drops the future
        let output = match timeout(self.timeout, command.output()).await {
            Err(_) => {
                return Err(SourceError::Timeout {
                    what: "location command",
                    after: self.timeout,
                }
                .into())
            }
            Ok(Err(source)) => {
                return Err(SourceError::Spawn {
                    command: self.command_name(),
                    source,
                }
                .into())
            }
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(SourceError::ExitStatus {
                command: self.command_name(),
                code: output
                    .status
                    .code()
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "signal".to_string()),
                stderr: if stderr.is_empty() {
                    "No error message".to_string()
                } else {
                    stderr
                },
            }
            .into());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(LocationReading::from_json(stdout.trim())?)
    }
}
