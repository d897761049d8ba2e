//! # Bluetooth Adapter Layer
//!
//! The adapter is a process-wide resource shared by discovery and
//! connection. It is injected as an `Arc<dyn BluetoothAdapter>`.
//!
//! ## Available Adapters
//!
//! - [`bluez`]: Linux, via `bluetoothctl` and RFCOMM serial devices
//! - [`mock`]: Scripted adapter for tests and the demo server
//!
//! ## Scan events
//!
//! [`BluetoothAdapter::start_scan`] returns a channel. Results arrive as
//! [`ScanEvent::Found`] and [`ScanEvent::Paired`], and the scan ends with
//! exactly one [`ScanEvent::Complete`] (or [`ScanEvent::Failed`]).

pub mod bluez;
pub mod mock;
pub mod rfcomm;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::device::{PairedPayload, RawDevice};
use crate::error::AdapterError;

pub use bluez::BluezAdapter;
pub use mock::MockAdapter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    /// A device seen during the scan
    Found(RawDevice),
    /// A device the adapter reports as paired
    Paired(RawDevice),
    Failed(String),
    Complete,
}

/// Result of a connection attempt that reached the device.
pub enum ConnectOutcome {
    Connected(Box<dyn PrinterLink>),
    /// The platform answered but reported no connection.
    Refused,
}

impl fmt::Debug for ConnectOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectOutcome::Connected(_) => f.write_str("Connected"),
            ConnectOutcome::Refused => f.write_str("Refused"),
        }
    }
}

/// Bluetooth adapter primitives.
#[async_trait]
pub trait BluetoothAdapter: Send + Sync {
    async fn is_enabled(&self) -> Result<bool, AdapterError>;

    /// Power the adapter on. Returns the paired-device list.
    async fn enable(&self) -> Result<PairedPayload, AdapterError>;

    async fn paired_devices(&self) -> Result<PairedPayload, AdapterError>;

    /// Start an active scan bounded by `duration`.
    async fn start_scan(&self, duration: Duration)
    -> Result<mpsc::Receiver<ScanEvent>, AdapterError>;

    async fn stop_scan(&self) -> Result<(), AdapterError>;

    async fn connect(&self, address: &str) -> Result<ConnectOutcome, AdapterError>;
}

/// A live byte link to a printer.
#[async_trait]
pub trait PrinterLink: Send {
    async fn write(&mut self, bytes: &[u8]) -> Result<(), AdapterError>;

    /// Disconnect. Further writes fail with [`AdapterError::LinkClosed`].
    async fn close(&mut self) -> Result<(), AdapterError>;
}
