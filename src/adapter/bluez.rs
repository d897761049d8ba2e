//! # BlueZ Adapter
//!
//! Linux adapter driven through `bluetoothctl`.
//!
//! | Operation | Command |
//! |-----------|---------|
//! | `is_enabled` | `bluetoothctl show` (`Powered: yes`) |
//! | `enable` | `bluetoothctl power on` |
//! | `paired_devices` | `bluetoothctl devices Paired` |
//! | `start_scan` | `bluetoothctl --timeout N scan on` |
//! | `stop_scan` | `bluetoothctl scan off` |
//! | `connect` | RFCOMM bind + raw TTY, see [`super::rfcomm`] |

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;

use super::rfcomm::{self, BindResult, RfcommLink};
use super::{BluetoothAdapter, ConnectOutcome, ScanEvent};
use crate::device::{PairedPayload, RawDevice};
use crate::error::AdapterError;

const BLUETOOTHCTL: &str = "bluetoothctl";

#[derive(Debug, Default, Clone)]
pub struct BluezAdapter;

impl BluezAdapter {
    pub fn new() -> Self {
        Self
    }
}

async fn bluetoothctl(args: &[&str]) -> Result<String, AdapterError> {
    let output = Command::new(BLUETOOTHCTL)
        .args(args)
        .output()
        .await
        .map_err(|e| AdapterError::command(BLUETOOTHCTL, e))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AdapterError::command(
            format!("{} {}", BLUETOOTHCTL, args.join(" ")),
            stderr.trim(),
        ));
    }
    Ok(strip_ansi(&String::from_utf8_lossy(&output.stdout)))
}

/// Remove terminal color sequences (`ESC [ ... m`) from bluetoothctl output.
fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            for c in chars.by_ref() {
                if c.is_ascii_alphabetic() {
                    break;
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Parse a `Device XX:XX:XX:XX:XX:XX Name` line.
///
/// BlueZ uses the dashed address as the name of devices that reported none.
fn parse_device_line(line: &str) -> Option<RawDevice> {
    let rest = &line[line.find("Device ")? + "Device ".len()..];
    let (address, name) = match rest.split_once(' ') {
        Some((address, name)) => (address, name.trim()),
        None => (rest.trim(), ""),
    };
    if !rfcomm::is_valid_mac(address) {
        return None;
    }
    let placeholder = address.replace(':', "-");
    let name = (!name.is_empty() && !name.eq_ignore_ascii_case(&placeholder)).then_some(name);
    Some(RawDevice::new(name, address))
}

fn parse_powered(show: &str) -> bool {
    show.lines()
        .filter_map(|line| line.trim().strip_prefix("Powered:"))
        .any(|value| value.trim() == "yes")
}

fn to_payload(devices: Vec<RawDevice>) -> PairedPayload {
    if devices.is_empty() {
        return PairedPayload::Empty;
    }
    PairedPayload::Objects(
        devices
            .into_iter()
            .map(|d| json!({ "name": d.name, "address": d.address }))
            .collect::<Vec<Value>>(),
    )
}

async fn list_paired() -> Result<Vec<RawDevice>, AdapterError> {
    let stdout = match bluetoothctl(&["devices", "Paired"]).await {
        Ok(stdout) => stdout,
        // BlueZ < 5.65
        Err(_) => bluetoothctl(&["paired-devices"]).await?,
    };
    Ok(stdout.lines().filter_map(parse_device_line).collect())
}

#[async_trait]
impl BluetoothAdapter for BluezAdapter {
    async fn is_enabled(&self) -> Result<bool, AdapterError> {
        Ok(parse_powered(&bluetoothctl(&["show"]).await?))
    }

    async fn enable(&self) -> Result<PairedPayload, AdapterError> {
        tracing::info!("Powering on Bluetooth adapter");
        bluetoothctl(&["power", "on"]).await?;
        self.paired_devices().await
    }

    async fn paired_devices(&self) -> Result<PairedPayload, AdapterError> {
        Ok(to_payload(list_paired().await?))
    }

    async fn start_scan(
        &self,
        duration: Duration,
    ) -> Result<mpsc::Receiver<ScanEvent>, AdapterError> {
        let mut child = Command::new(BLUETOOTHCTL)
            .arg("--timeout")
            .arg(duration.as_secs().max(1).to_string())
            .args(["scan", "on"])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AdapterError::command(BLUETOOTHCTL, e))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AdapterError::Platform("scan output unavailable".into()))?;

        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = strip_ansi(&line);
                        if !line.contains("NEW") {
                            continue;
                        }
                        if let Some(device) = parse_device_line(&line) {
                            if tx.send(ScanEvent::Found(device)).await.is_err() {
                                return;
                            }
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        let _ = tx.send(ScanEvent::Failed(e.to_string())).await;
                        return;
                    }
                }
            }

            match child.wait().await {
                Ok(status) if status.success() => {}
                Ok(status) => {
                    let _ = tx
                        .send(ScanEvent::Failed(format!("scan exited with {}", status)))
                        .await;
                    return;
                }
                Err(e) => {
                    let _ = tx.send(ScanEvent::Failed(e.to_string())).await;
                    return;
                }
            }

            match list_paired().await {
                Ok(paired) => {
                    for device in paired {
                        if tx.send(ScanEvent::Paired(device)).await.is_err() {
                            return;
                        }
                    }
                    let _ = tx.send(ScanEvent::Complete).await;
                }
                Err(e) => {
                    let _ = tx.send(ScanEvent::Failed(e.to_string())).await;
                }
            }
        });

        Ok(rx)
    }

    async fn stop_scan(&self) -> Result<(), AdapterError> {
        bluetoothctl(&["scan", "off"]).await.map(|_| ())
    }

    async fn connect(&self, address: &str) -> Result<ConnectOutcome, AdapterError> {
        if !rfcomm::is_valid_mac(address) {
            return Err(AdapterError::Platform(format!(
                "invalid Bluetooth address '{}'",
                address
            )));
        }

        let path = match rfcomm::find_rfcomm_for_mac(address).await? {
            Some(path) => path,
            None => match rfcomm::bind(address).await? {
                BindResult::Bound(path) => path,
                BindResult::Unreachable(detail) => {
                    tracing::warn!(address, %detail, "Printer not reachable");
                    return Ok(ConnectOutcome::Refused);
                }
            },
        };

        tracing::debug!(address, device = %path, "Opening RFCOMM device");
        let link = RfcommLink::open(&path)?;
        Ok(ConnectOutcome::Connected(Box::new(link)))
    }
}
