//! Process-local diagnostic log.
//!
//! Lines go to stderr and, when it can be opened, an append-only file in the
//! configured log directory. Nothing here is part of the durable record.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use env_logger::{Builder, Env, Target};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Log file name for a process started at `started`
pub fn log_file_name(started: DateTime<Utc>) -> String {
    format!("geoprobe-{}.log", started.format("%Y-%m-%d-%H-%M-%S"))
}

/// Writes every buffer to the console and to the log file, if any.
///
/// Console errors are ignored; file errors are returned to the caller.
pub(crate) struct Tee<C, F> {
    console: C,
    file: Option<F>,
}

impl<C: Write, F: Write> Tee<C, F> {
    pub(crate) fn new(console: C, file: Option<F>) -> Self {
        Self { console, file }
    }
}

impl<C: Write, F: Write> Write for Tee<C, F> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let _ = self.console.write_all(buf);
        if let Some(file) = &mut self.file {
            file.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let _ = self.console.flush();
        if let Some(file) = &mut self.file {
            file.flush()?;
        }
        Ok(())
    }
}

/// Install the global logger. Level defaults to `info`, overridable with
/// `RUST_LOG`.
///
/// Returns the log file path, or `None` when only stderr is in use.
pub fn init(log_dir: &Path) -> Result<Option<PathBuf>> {
    let path = log_dir.join(log_file_name(Utc::now()));
    let opened = std::fs::create_dir_all(log_dir)
        .and_then(|_| OpenOptions::new().create(true).append(true).open(&path));

    let (file, file_error) = match opened {
        Ok(file) => (Some(file), None),
        Err(e) => (None, Some(e)),
    };

    Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} {:<5} {}: {}",
                Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(Target::Pipe(Box::new(Tee::new(io::stderr(), file))))
        .try_init()
        .context("Failed to install logger")?;

    match file_error {
        None => Ok(Some(path)),
        Some(e) => {
            log::warn!("Could not open log file {:?}, logging to stderr only: {}", path, e);
            Ok(None)
        }
    }
}
