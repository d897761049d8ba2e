//! # Print Session
//!
//! Runs one print attempt from permission check to disconnect:
//!
//! ```text
//! Idle ─► RequestingPermission ─► Discovering ─► AwaitingSelection
//!                                                     │
//!      Succeeded ◄─ Transmitting ◄─ Formatting ◄─ Connecting
//! ```
//!
//! Any step can end the attempt in `Failed(reason)`. Cancelling the device
//! selection returns the session to `Idle` instead, and is reported as a
//! silent [`FailureReason::SelectionCancelled`].
//!
//! Side effects happen strictly in order: nothing connects before a device
//! is chosen and nothing is sent before the connection is up. An opened
//! connection is always closed before `start` returns.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;

use crate::adapter::BluetoothAdapter;
use crate::config::SessionConfig;
use crate::connection::PrinterConnection;
use crate::device::Device;
use crate::discovery::{DeviceDiscovery, ScanOutcome};
use crate::error::{ConnectionError, DiscoveryError, TransmissionError};
use crate::permission::{PermissionGate, PermissionPlatform};
use crate::receipt::ReceiptFormatter;
use crate::selector::{DeviceSelector, Selection, SelectionPrompt};
use crate::ticket::Ticket;

/// Why a print attempt ended without printing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureReason {
    #[error("Bluetooth permissions not granted")]
    PermissionDenied,

    #[error("Bluetooth is turned off")]
    BluetoothDisabled,

    #[error("Failed to scan for devices: {0}")]
    DiscoveryFailed(String),

    #[error("No Bluetooth devices found")]
    NoDevicesFound,

    #[error("Printer selection cancelled")]
    SelectionCancelled,

    #[error("Failed to connect: {0}")]
    ConnectionFailed(String),

    /// `sent` commands reached the printer before the failure.
    #[error("Printing failed after {sent} of {total} commands: {detail}")]
    TransmissionFailed {
        sent: usize,
        total: usize,
        detail: String,
    },

    #[error("A print is already in progress")]
    Busy,
}

impl FailureReason {
    /// Stable identifier for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            FailureReason::PermissionDenied => "permission_denied",
            FailureReason::BluetoothDisabled => "bluetooth_disabled",
            FailureReason::DiscoveryFailed(_) => "discovery_failed",
            FailureReason::NoDevicesFound => "no_devices_found",
            FailureReason::SelectionCancelled => "selection_cancelled",
            FailureReason::ConnectionFailed(_) => "connection_failed",
            FailureReason::TransmissionFailed { .. } => "transmission_failed",
            FailureReason::Busy => "busy",
        }
    }

    /// Silent reasons are not shown to the operator.
    pub fn is_silent(&self) -> bool {
        matches!(self, FailureReason::SelectionCancelled)
    }

    /// Whether part of a ticket may already be on paper.
    pub fn partial_print_possible(&self) -> bool {
        matches!(self, FailureReason::TransmissionFailed { sent, .. } if *sent > 0)
    }

    /// What the operator should do next.
    pub fn hint(&self) -> Option<&'static str> {
        Some(match self {
            FailureReason::PermissionDenied => {
                "Open Settings and allow Bluetooth access for this app."
            }
            FailureReason::BluetoothDisabled => "Turn on Bluetooth and try again.",
            FailureReason::DiscoveryFailed(_) => "Try scanning again.",
            FailureReason::NoDevicesFound => {
                "Make sure the printer is switched on and paired, then scan again."
            }
            FailureReason::SelectionCancelled => return None,
            FailureReason::ConnectionFailed(_) => {
                "Switch the printer off and on again, then retry."
            }
            FailureReason::TransmissionFailed { sent, .. } if *sent > 0 => {
                "Part of the ticket may have printed. Check the paper before printing again."
            }
            FailureReason::TransmissionFailed { .. } => {
                "Switch the printer off and on again, then retry."
            }
            FailureReason::Busy => "Wait for the current print to finish.",
        })
    }
}

impl From<DiscoveryError> for FailureReason {
    fn from(e: DiscoveryError) -> Self {
        match e {
            DiscoveryError::BluetoothDisabled => FailureReason::BluetoothDisabled,
            // The stack failed while the radio may well be on.
            e @ DiscoveryError::AdapterEnable(_) => FailureReason::DiscoveryFailed(e.to_string()),
            DiscoveryError::Scan(detail) => FailureReason::DiscoveryFailed(detail),
        }
    }
}

impl From<ConnectionError> for FailureReason {
    fn from(e: ConnectionError) -> Self {
        FailureReason::ConnectionFailed(e.to_string())
    }
}

impl From<TransmissionError> for FailureReason {
    fn from(e: TransmissionError) -> Self {
        FailureReason::TransmissionFailed {
            sent: e.sent(),
            total: e.total(),
            detail: e.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    RequestingPermission,
    Discovering,
    AwaitingSelection,
    Connecting,
    Formatting,
    Transmitting,
    Succeeded,
    Failed(FailureReason),
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::RequestingPermission => "requesting_permission",
            SessionState::Discovering => "discovering",
            SessionState::AwaitingSelection => "awaiting_selection",
            SessionState::Connecting => "connecting",
            SessionState::Formatting => "formatting",
            SessionState::Transmitting => "transmitting",
            SessionState::Succeeded => "succeeded",
            SessionState::Failed(_) => "failed",
        }
    }
}

/// Summary of a successful print.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintReport {
    pub device: Device,
    pub commands: usize,
    pub bytes: usize,
}

/// Clears the busy flag when an attempt ends, however it ends.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct PrintSession {
    permissions: PermissionGate,
    discovery: DeviceDiscovery,
    connection: PrinterConnection,
    formatter: ReceiptFormatter,
    transmit_timeout: Duration,
    printers_only: bool,
    busy: AtomicBool,
    state: watch::Sender<SessionState>,
    history: Mutex<Vec<SessionState>>,
}

impl PrintSession {
    pub fn new(
        adapter: Arc<dyn BluetoothAdapter>,
        permissions: Arc<dyn PermissionPlatform>,
        config: &SessionConfig,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::Idle);
        Self {
            permissions: PermissionGate::new(permissions),
            discovery: DeviceDiscovery::new(Arc::clone(&adapter), config.discovery()),
            connection: PrinterConnection::new(adapter, config.connect_timeout()),
            formatter: ReceiptFormatter::new(config.layout.clone(), config.printer()),
            transmit_timeout: config.transmit_timeout(),
            printers_only: false,
            busy: AtomicBool::new(false),
            state,
            history: Mutex::new(vec![SessionState::Idle]),
        }
    }

    /// Start the selector with the printers-only filter on.
    pub fn with_printers_only(mut self, printers_only: bool) -> Self {
        self.printers_only = printers_only;
        self
    }

    pub fn formatter(&self) -> &ReceiptFormatter {
        &self.formatter
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// States visited by the latest attempt, starting with `Idle`.
    pub fn history(&self) -> Vec<SessionState> {
        self.history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    fn transition(&self, next: SessionState) {
        match &next {
            SessionState::Failed(reason) => {
                tracing::warn!(state = next.name(), %reason, "Print session")
            }
            _ => tracing::info!(state = next.name(), "Print session"),
        }
        self.history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(next.clone());
        self.state.send_replace(next);
    }

    /// Run one print attempt for `ticket`.
    ///
    /// A call made while another attempt is running returns
    /// [`FailureReason::Busy`] and leaves the running attempt alone.
    pub async fn start<P>(&self, ticket: &Ticket, prompt: &mut P) -> Result<PrintReport, FailureReason>
    where
        P: SelectionPrompt + ?Sized,
    {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!("Print requested while another print is running");
            return Err(FailureReason::Busy);
        }
        let _busy = BusyGuard(&self.busy);

        *self
            .history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Vec::new();
        self.transition(SessionState::Idle);

        let result = self.run(ticket, prompt).await;
        match &result {
            Ok(report) => {
                tracing::info!(
                    device = %report.device.address,
                    commands = report.commands,
                    bytes = report.bytes,
                    "Ticket printed"
                );
                self.transition(SessionState::Succeeded);
            }
            Err(FailureReason::SelectionCancelled) => self.transition(SessionState::Idle),
            Err(reason) => self.transition(SessionState::Failed(reason.clone())),
        }
        result
    }

    async fn run<P>(&self, ticket: &Ticket, prompt: &mut P) -> Result<PrintReport, FailureReason>
    where
        P: SelectionPrompt + ?Sized,
    {
        self.transition(SessionState::RequestingPermission);
        if !self.permissions.ensure().await {
            return Err(FailureReason::PermissionDenied);
        }

        self.transition(SessionState::Discovering);
        let mut selector = DeviceSelector::new().with_printers_only(self.printers_only);
        selector.begin_scan();
        let scan = self.discovery.scan().await;
        selector.finish_scan(&scan);
        if scan? == ScanOutcome::NoDevicesFound {
            return Err(FailureReason::NoDevicesFound);
        }

        self.transition(SessionState::AwaitingSelection);
        let address = match prompt.choose(&mut selector).await {
            Selection::Chosen(address) => address,
            Selection::Cancelled => return Err(FailureReason::SelectionCancelled),
        };
        let Some(device) = selector.find(&address).cloned() else {
            tracing::warn!(%address, "Selected address is not in the device list");
            return Err(FailureReason::SelectionCancelled);
        };

        self.transition(SessionState::Connecting);
        let mut handle = self.connection.connect(&device).await?;

        self.transition(SessionState::Formatting);
        let program = self.formatter.render(ticket);
        let bytes = program.iter().map(|c| c.encode().len()).sum();

        self.transition(SessionState::Transmitting);
        let sent = handle
            .transmit(&program.commands, self.transmit_timeout)
            .await;
        handle.disconnect().await;

        Ok(PrintReport {
            device,
            commands: sent?,
            bytes,
        })
    }
}
