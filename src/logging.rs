// SPDX-License-Identifier: GPL-3.0-only
//! Log sink handed to each component at construction
//!
//! Components never call the global `tracing` macros on the event path; they
//! log through the [`LogSink`] they were built with. In production that is a
//! [`TracingSink`], in tests a recording sink.

use std::fs::{self, File};
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Mutex;

use crate::error::{AppError, Result};

/// Severity accepted by a [`LogSink`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Error,
}

pub trait LogSink {
    fn log(&self, level: LogLevel, message: &str);

    fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }
}

/// Forwards to `tracing`, tagging every event with the owning component
pub struct TracingSink {
    component: &'static str,
}

impl TracingSink {
    pub fn new(component: &'static str) -> Self {
        Self { component }
    }

    /// Convenience constructor for the shared handle components take
    pub fn shared(component: &'static str) -> Rc<dyn LogSink> {
        Rc::new(Self::new(component))
    }
}

impl LogSink for TracingSink {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Debug => debug!(component = self.component, "{}", message),
            LogLevel::Info => info!(component = self.component, "{}", message),
            LogLevel::Error => error!(component = self.component, "{}", message),
        }
    }
}

/// Install the global subscriber: terminal, log file and journald (when reachable)
pub fn setup_logs() {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter_layer = EnvFilter::try_from_default_env().unwrap_or(EnvFilter::new(format!(
        "warn,{}=debug",
        env!("CARGO_CRATE_NAME")
    )));
    let fmt_layer = fmt::layer().with_target(false);

    let file_layer = match open_log_file() {
        Ok(file) => Some(
            fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        ),
        Err(err) => {
            eprintln!("File logging disabled: {err}");
            None
        }
    };

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .with(file_layer)
        .with(tracing_journald::layer().ok())
        .init();
}

/// Location of the log file, creating its directory if needed
pub fn log_file_name() -> Result<PathBuf> {
    let log_dir = dirs::data_local_dir()
        .ok_or_else(|| AppError::Config("Data-local directory not found".to_string()))?
        .join("display-switch");
    fs::create_dir_all(&log_dir)?;
    Ok(log_dir.join("display-switch.log"))
}

fn open_log_file() -> Result<File> {
    Ok(File::create(log_file_name()?)?)
}
