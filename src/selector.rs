//! # Device Selector
//!
//! Presentation state for picking a printer: the latest device list, a
//! printers-only filter and the scan status. The visible list is derived
//! on every read, so toggling the filter twice gives back the same list.

use async_trait::async_trait;
use serde::Serialize;

use crate::device::Device;
use crate::discovery::ScanOutcome;
use crate::error::DiscoveryError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorStatus {
    Scanning,
    Ready,
    Error(String),
}

/// What the operator should see right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "camelCase")]
pub enum SelectorView {
    Scanning,
    Error {
        message: String,
    },
    #[serde(rename_all = "camelCase")]
    Empty {
        printers_only: bool,
    },
    Devices {
        devices: Vec<Device>,
    },
}

impl SelectorView {
    /// Text for the non-list views.
    pub fn message(&self) -> Option<String> {
        match self {
            SelectorView::Scanning => Some("Scanning for devices...".into()),
            SelectorView::Error { message } => Some(format!("Error: {}", message)),
            SelectorView::Empty {
                printers_only: true,
            } => Some("No printers found. Show all devices to see other devices.".into()),
            SelectorView::Empty {
                printers_only: false,
            } => Some("No Bluetooth devices found".into()),
            SelectorView::Devices { .. } => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DeviceSelector {
    devices: Vec<Device>,
    printers_only: bool,
    status: SelectorStatus,
}

impl Default for DeviceSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceSelector {
    pub fn new() -> Self {
        Self {
            devices: Vec::new(),
            printers_only: false,
            status: SelectorStatus::Ready,
        }
    }

    pub fn with_printers_only(mut self, printers_only: bool) -> Self {
        self.printers_only = printers_only;
        self
    }

    pub fn begin_scan(&mut self) {
        self.status = SelectorStatus::Scanning;
    }

    /// Record a scan result. Failures keep the previous list.
    pub fn finish_scan(&mut self, result: &Result<ScanOutcome, DiscoveryError>) {
        match result {
            Ok(outcome) => self.set_devices(outcome.devices().to_vec()),
            Err(e) => self.status = SelectorStatus::Error(e.to_string()),
        }
    }

    pub fn set_devices(&mut self, devices: Vec<Device>) {
        self.devices = devices;
        self.status = SelectorStatus::Ready;
    }

    pub fn status(&self) -> &SelectorStatus {
        &self.status
    }

    pub fn printers_only(&self) -> bool {
        self.printers_only
    }

    pub fn set_printers_only(&mut self, printers_only: bool) {
        self.printers_only = printers_only;
    }

    pub fn toggle_printers_only(&mut self) {
        self.printers_only = !self.printers_only;
    }

    /// Every device from the last scan, unfiltered.
    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn visible(&self) -> Vec<&Device> {
        self.devices
            .iter()
            .filter(|d| !self.printers_only || d.is_printer)
            .collect()
    }

    pub fn view(&self) -> SelectorView {
        match &self.status {
            SelectorStatus::Scanning => SelectorView::Scanning,
            SelectorStatus::Error(message) => SelectorView::Error {
                message: message.clone(),
            },
            SelectorStatus::Ready => {
                let visible = self.visible();
                if visible.is_empty() {
                    SelectorView::Empty {
                        printers_only: self.printers_only,
                    }
                } else {
                    SelectorView::Devices {
                        devices: visible.into_iter().cloned().collect(),
                    }
                }
            }
        }
    }

    /// Look up a device among the visible ones.
    pub fn resolve(&self, address: &str) -> Option<&Device> {
        self.visible()
            .into_iter()
            .find(|d| d.address.eq_ignore_ascii_case(address))
    }

    /// Look up a device regardless of the filter.
    pub fn find(&self, address: &str) -> Option<&Device> {
        self.devices
            .iter()
            .find(|d| d.address.eq_ignore_ascii_case(address))
    }
}

/// The operator's answer to a selection prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Chosen(String),
    Cancelled,
}

/// Something that lets the operator pick a device from the selector.
///
/// Implementations may change the selector's filter while prompting.
#[async_trait]
pub trait SelectionPrompt: Send {
    async fn choose(&mut self, selector: &mut DeviceSelector) -> Selection;
}

/// Selects a known address without asking. Cancels if the device was not
/// discovered.
#[derive(Debug, Clone)]
pub struct FixedAddress(pub String);

#[async_trait]
impl SelectionPrompt for FixedAddress {
    async fn choose(&mut self, selector: &mut DeviceSelector) -> Selection {
        match selector.find(&self.0) {
            Some(device) => Selection::Chosen(device.address.clone()),
            None => {
                tracing::warn!(address = %self.0, "Requested printer was not discovered");
                Selection::Cancelled
            }
        }
    }
}

/// Picks the first visible printer, if any.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstPrinter;

#[async_trait]
impl SelectionPrompt for FirstPrinter {
    async fn choose(&mut self, selector: &mut DeviceSelector) -> Selection {
        selector
            .visible()
            .into_iter()
            .find(|d| d.is_printer)
            .map(|d| Selection::Chosen(d.address.clone()))
            .unwrap_or(Selection::Cancelled)
    }
}
