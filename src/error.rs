//! # Error Types
//!
//! Each layer converts the errors of the layer below into its own kind, so
//! the print session only ever sees [`DiscoveryError`], [`ConnectionError`]
//! and [`TransmissionError`], never raw platform errors.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::session::FailureReason;

/// Errors raised by a Bluetooth adapter or printer link implementation.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// An external tool (bluetoothctl, rfcomm) could not be run or failed
    #[error("{program} failed: {detail}")]
    Command { program: String, detail: String },

    /// The platform returned something the adapter could not interpret
    #[error("Platform error: {0}")]
    Platform(String),

    /// The link to the printer is no longer usable
    #[error("Link closed")]
    LinkClosed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AdapterError {
    pub fn command(program: impl Into<String>, detail: impl ToString) -> Self {
        AdapterError::Command {
            program: program.into(),
            detail: detail.to_string(),
        }
    }
}

/// Discovery failures. An empty result is not an error.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Failed to enable Bluetooth: {0}")]
    AdapterEnable(#[source] AdapterError),

    #[error("Bluetooth is disabled")]
    BluetoothDisabled,

    #[error("Failed to scan for devices: {0}")]
    Scan(String),
}

/// Connection failures.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Printer {address} refused the connection")]
    Refused { address: String },

    #[error("Failed to connect to {address}: {source}")]
    Adapter {
        address: String,
        #[source]
        source: AdapterError,
    },

    #[error("No answer from {address} within {}s", .timeout.as_secs())]
    Timeout { address: String, timeout: Duration },
}

/// Failures while sending a command sequence.
///
/// `sent` is the number of commands the printer accepted before the failure.
#[derive(Debug, Error)]
pub enum TransmissionError {
    #[error("Command {} of {total} failed: {source}", .sent + 1)]
    Write {
        sent: usize,
        total: usize,
        #[source]
        source: AdapterError,
    },

    #[error("Printer stopped responding after {sent} of {total} commands")]
    Timeout { sent: usize, total: usize },
}

impl TransmissionError {
    pub fn sent(&self) -> usize {
        match self {
            TransmissionError::Write { sent, .. } | TransmissionError::Timeout { sent, .. } => {
                *sent
            }
        }
    }

    pub fn total(&self) -> usize {
        match self {
            TransmissionError::Write { total, .. } | TransmissionError::Timeout { total, .. } => {
                *total
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid setting: {0}")]
    Invalid(String),
}

/// Main error type for the CLI and HTTP surfaces
#[derive(Debug, Error)]
pub enum TicketPrinterError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    /// A print attempt ended in a failure state
    #[error("Print failed: {0}")]
    Print(FailureReason),

    #[error("Invalid ticket: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
