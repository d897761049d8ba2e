//! # Printer Connection
//!
//! Opens the link to a selected printer and sends receipts over it.
//!
//! ```text
//! connect(device) ──► ConnectionHandle ──► transmit(commands) ──► disconnect()
//! ```
//!
//! A handle is owned by exactly one print attempt and must be closed with
//! [`ConnectionHandle::disconnect`] on every path. Dropping an open handle
//! is logged.

use std::sync::Arc;
use std::time::Duration;

use crate::adapter::{BluetoothAdapter, ConnectOutcome, PrinterLink};
use crate::device::Device;
use crate::error::{ConnectionError, TransmissionError};
use crate::ir::Command;

pub struct PrinterConnection {
    adapter: Arc<dyn BluetoothAdapter>,
    connect_timeout: Duration,
}

impl PrinterConnection {
    pub fn new(adapter: Arc<dyn BluetoothAdapter>, connect_timeout: Duration) -> Self {
        Self {
            adapter,
            connect_timeout,
        }
    }

    /// Connect to `device`. No retries.
    pub async fn connect(&self, device: &Device) -> Result<ConnectionHandle, ConnectionError> {
        let address = device.address.clone();
        tracing::info!(%address, name = %device.name, "Connecting to printer");

        let outcome = tokio::time::timeout(self.connect_timeout, self.adapter.connect(&address))
            .await
            .map_err(|_| ConnectionError::Timeout {
                address: address.clone(),
                timeout: self.connect_timeout,
            })?
            .map_err(|source| ConnectionError::Adapter {
                address: address.clone(),
                source,
            })?;

        match outcome {
            ConnectOutcome::Connected(link) => {
                tracing::info!(%address, "Connected");
                Ok(ConnectionHandle {
                    device: device.clone(),
                    link,
                    open: true,
                })
            }
            ConnectOutcome::Refused => Err(ConnectionError::Refused { address }),
        }
    }
}

/// A live connection for one print attempt.
pub struct ConnectionHandle {
    device: Device,
    link: Box<dyn PrinterLink>,
    open: bool,
}

impl ConnectionHandle {
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Send `commands` in order, one write per command.
    ///
    /// Returns the number of commands sent. The whole sequence must finish
    /// within `timeout`.
    pub async fn transmit(
        &mut self,
        commands: &[Command],
        timeout: Duration,
    ) -> Result<usize, TransmissionError> {
        let total = commands.len();
        let mut sent = 0;

        let result = tokio::time::timeout(timeout, async {
            for command in commands {
                self.link
                    .write(&command.encode())
                    .await
                    .map_err(|source| TransmissionError::Write {
                        sent,
                        total,
                        source,
                    })?;
                sent += 1;
            }
            Ok(())
        })
        .await;

        match result {
            Ok(Ok(())) => {
                tracing::info!(total, address = %self.device.address, "Receipt sent");
                Ok(total)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(TransmissionError::Timeout { sent, total }),
        }
    }

    /// Close the link. Errors are logged, not returned.
    pub async fn disconnect(mut self) {
        self.open = false;
        match self.link.close().await {
            Ok(()) => tracing::debug!(address = %self.device.address, "Disconnected"),
            Err(e) => tracing::warn!(address = %self.device.address, error = %e, "Disconnect failed"),
        }
    }
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        if self.open {
            tracing::warn!(address = %self.device.address, "Connection dropped without disconnect");
        }
    }
}
