// SPDX-License-Identifier: GPL-3.0-only
//! Error types for the agent
//!
//! Only startup failures (configuration, instance lock, hotplug subscription)
//! ever reach `main`. Everything raised while handling an event is logged and
//! dropped by the orchestrator.

use std::path::PathBuf;

use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration file could not be located or is semantically invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file could not be read
    #[error("Failed to read configuration file {path:?}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML or has unexpected keys
    #[error("Failed to parse configuration file {path:?}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// udev monitor setup or polling failed
    #[error("USB hotplug monitoring error: {0}")]
    Hotplug(#[source] std::io::Error),

    /// DDC/CI communication error
    #[error("DDC/CI communication error on display {id}: {source}")]
    DdcCi {
        id: String,
        #[source]
        source: anyhow::Error,
    },

    /// D-Bus error (screen wake-up)
    #[error("D-Bus error: {0}")]
    DBus(#[from] zbus::Error),

    /// Another agent already holds the instance lock
    #[error("Another instance is already running (lock held on {0:?})")]
    AlreadyRunning(PathBuf),

    /// Post-switch command could not be run or exited unsuccessfully
    #[error("Command `{command}` failed: {reason}")]
    Hook { command: String, reason: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for AppError
pub type Result<T> = std::result::Result<T, AppError>;
