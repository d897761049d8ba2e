//! # Device Discovery
//!
//! Produces the device list for one print attempt:
//!
//! 1. Make sure the adapter is on (enabling it if configured to)
//! 2. Read and normalize the paired-device list
//! 3. Run a bounded active scan, always stopped explicitly afterwards
//! 4. Merge paired then scanned devices, first record per address wins
//!
//! Only one scan runs at a time in the process. A second caller waits for
//! the first to finish.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tokio::time::Instant;

use crate::adapter::{BluetoothAdapter, ScanEvent};
use crate::device::{Device, RawDevice, merge_devices};
use crate::error::DiscoveryError;

/// Extra time allowed past the scan duration for the adapter to report
/// completion.
const SCAN_GRACE: Duration = Duration::from_secs(2);

fn scan_lock() -> &'static Mutex<()> {
    static SCAN_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    SCAN_LOCK.get_or_init(|| Mutex::new(()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryConfig {
    pub scan_duration: Duration,
    pub auto_enable: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            scan_duration: Duration::from_secs(8),
            auto_enable: true,
        }
    }
}

/// Result of a successful scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Found(Vec<Device>),
    NoDevicesFound,
}

impl ScanOutcome {
    pub fn devices(&self) -> &[Device] {
        match self {
            ScanOutcome::Found(devices) => devices,
            ScanOutcome::NoDevicesFound => &[],
        }
    }
}

pub struct DeviceDiscovery {
    adapter: Arc<dyn BluetoothAdapter>,
    config: DiscoveryConfig,
}

impl DeviceDiscovery {
    pub fn new(adapter: Arc<dyn BluetoothAdapter>, config: DiscoveryConfig) -> Self {
        Self { adapter, config }
    }

    pub async fn scan(&self) -> Result<ScanOutcome, DiscoveryError> {
        let _guard = scan_lock().lock().await;

        let paired = self.paired_devices().await?;
        tracing::debug!(count = paired.len(), "Paired devices");

        let scanned = self.run_scan().await?;
        tracing::debug!(count = scanned.len(), "Scanned devices");

        let devices = merge_devices(paired.into_iter().chain(scanned));
        if devices.is_empty() {
            tracing::info!("No Bluetooth devices found");
            return Ok(ScanOutcome::NoDevicesFound);
        }
        tracing::info!(
            count = devices.len(),
            printers = devices.iter().filter(|d| d.is_printer).count(),
            "Discovery finished"
        );
        Ok(ScanOutcome::Found(devices))
    }

    async fn paired_devices(&self) -> Result<Vec<Device>, DiscoveryError> {
        let enabled = self
            .adapter
            .is_enabled()
            .await
            .map_err(DiscoveryError::AdapterEnable)?;

        let payload = if enabled {
            self.adapter
                .paired_devices()
                .await
                .map_err(|e| DiscoveryError::Scan(e.to_string()))?
        } else if self.config.auto_enable {
            tracing::info!("Bluetooth is off, enabling");
            let payload = self
                .adapter
                .enable()
                .await
                .map_err(DiscoveryError::AdapterEnable)?;
            let enabled = self
                .adapter
                .is_enabled()
                .await
                .map_err(DiscoveryError::AdapterEnable)?;
            if !enabled {
                return Err(DiscoveryError::BluetoothDisabled);
            }
            payload
        } else {
            return Err(DiscoveryError::BluetoothDisabled);
        };

        tracing::debug!(?payload, "Paired payload");
        Ok(payload
            .normalize()
            .iter()
            .filter_map(|raw| Device::from_raw(raw, true))
            .collect())
    }

    async fn run_scan(&self) -> Result<Vec<Device>, DiscoveryError> {
        let mut events = self
            .adapter
            .start_scan(self.config.scan_duration)
            .await
            .map_err(|e| DiscoveryError::Scan(e.to_string()))?;

        let collected = collect_events(&mut events, self.config.scan_duration + SCAN_GRACE).await;

        if let Err(e) = self.adapter.stop_scan().await {
            tracing::warn!(error = %e, "Failed to stop scan");
        }

        collected
    }
}

/// Read scan events until `Complete` or the deadline.
///
/// Devices are returned found-first, then paired; a device counts as paired
/// when the scan reported it as such.
async fn collect_events(
    events: &mut mpsc::Receiver<ScanEvent>,
    limit: Duration,
) -> Result<Vec<Device>, DiscoveryError> {
    let deadline = Instant::now() + limit;
    let mut found: Vec<RawDevice> = Vec::new();
    let mut paired: Vec<RawDevice> = Vec::new();

    loop {
        match tokio::time::timeout_at(deadline, events.recv()).await {
            Ok(Some(ScanEvent::Found(raw))) => found.push(raw),
            Ok(Some(ScanEvent::Paired(raw))) => paired.push(raw),
            Ok(Some(ScanEvent::Failed(detail))) => return Err(DiscoveryError::Scan(detail)),
            Ok(Some(ScanEvent::Complete)) => break,
            Ok(None) => {
                return Err(DiscoveryError::Scan(
                    "scan ended without completing".into(),
                ));
            }
            Err(_) => {
                tracing::warn!(
                    found = found.len(),
                    "Scan did not report completion, using partial results"
                );
                break;
            }
        }
    }

    let is_paired = |raw: &RawDevice| {
        raw.address.as_deref().is_some_and(|address| {
            paired
                .iter()
                .filter_map(|p| p.address.as_deref())
                .any(|p| p.eq_ignore_ascii_case(address))
        })
    };

    Ok(found
        .iter()
        .chain(paired.iter())
        .filter_map(|raw| Device::from_raw(raw, is_paired(raw)))
        .collect())
}
