//! # RFCOMM Serial Link
//!
//! Classic Bluetooth printers expose the Serial Port Profile. On Linux the
//! printer is bound to an RFCOMM device node and written to like a serial
//! port:
//!
//! ```bash
//! $ bluetoothctl pair 00:11:62:XX:XX:XX
//! $ sudo rfcomm bind 0 00:11:62:XX:XX:XX 1
//! # creates /dev/rfcomm0
//! ```
//!
//! ## TTY Configuration
//!
//! The device is opened in raw mode so ESC/POS bytes pass unmodified:
//!
//! - **No input processing**: IGNBRK, BRKINT, PARMRK, ISTRIP, ...
//! - **No output processing**: OPOST off (no CR/LF translation)
//! - **8-bit characters**: CS8, no parity
//! - **Non-canonical mode**: ICANON and ECHO off
//!
//! ## Chunked Writes
//!
//! Writes larger than [`CHUNK_SIZE`] are split with a short pause between
//! chunks. Cheap printers have small receive buffers.

use std::fs::OpenOptions;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::PrinterLink;
use crate::error::AdapterError;

/// Bytes per write.
pub const CHUNK_SIZE: usize = 512;

const CHUNK_DELAY: Duration = Duration::from_millis(20);

/// Highest `/dev/rfcommN` index tried when binding.
const MAX_RFCOMM_DEVICES: u8 = 8;

/// SPP channel used by ESC/POS printers.
const SPP_CHANNEL: &str = "1";

/// Validate a Bluetooth MAC address format (XX:XX:XX:XX:XX:XX).
pub fn is_valid_mac(mac: &str) -> bool {
    let parts: Vec<&str> = mac.split(':').collect();
    if parts.len() != 6 {
        return false;
    }
    parts
        .iter()
        .all(|part| part.len() == 2 && part.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Device node named by an `rfcomm` listing line bound to `mac`.
///
/// Lines look like `rfcomm0: 00:11:22:33:44:55 channel 1 clean`.
fn device_for_line(line: &str, mac_upper: &str) -> Option<String> {
    if !line.to_uppercase().contains(mac_upper) {
        return None;
    }
    let dev_name = line.split(':').next()?.trim();
    if dev_name.starts_with("rfcomm") {
        Some(format!("/dev/{}", dev_name))
    } else {
        None
    }
}

/// Find an RFCOMM device already bound to `mac`.
pub async fn find_rfcomm_for_mac(mac: &str) -> Result<Option<String>, AdapterError> {
    let mac_upper = mac.to_uppercase();

    if let Ok(contents) = tokio::fs::read_to_string("/proc/net/rfcomm").await {
        let found = contents
            .lines()
            .filter_map(|line| device_for_line(line, &mac_upper))
            .find(|path| Path::new(path).exists());
        if found.is_some() {
            return Ok(found);
        }
    }

    let output = Command::new("rfcomm")
        .arg("-a")
        .output()
        .await
        .map_err(|e| AdapterError::command("rfcomm -a", e))?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout
        .lines()
        .filter_map(|line| device_for_line(line, &mac_upper))
        .find(|path| Path::new(path).exists()))
}

/// First `/dev/rfcommN` index that is not in use.
fn free_channel() -> Option<u8> {
    (0..MAX_RFCOMM_DEVICES).find(|n| !Path::new(&format!("/dev/rfcomm{}", n)).exists())
}

/// Outcome of [`bind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindResult {
    Bound(String),
    /// The device did not answer a ping.
    Unreachable(String),
}

/// Bind an RFCOMM device node to `mac`.
///
/// Runs `bluetoothctl connect`, `l2ping -c 1` and `rfcomm bind`. Binding
/// needs root or `CAP_NET_ADMIN`.
pub async fn bind(mac: &str) -> Result<BindResult, AdapterError> {
    let mac_upper = mac.to_uppercase();
    let channel = free_channel().ok_or_else(|| {
        AdapterError::Platform(format!("all {} rfcomm devices in use", MAX_RFCOMM_DEVICES))
    })?;
    let device_path = format!("/dev/rfcomm{}", channel);

    let output = Command::new("bluetoothctl")
        .arg("connect")
        .arg(&mac_upper)
        .output()
        .await
        .map_err(|e| AdapterError::command("bluetoothctl connect", e))?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    if !(stdout.contains("Connection successful") || stdout.contains("already connected")) {
        // l2ping below decides whether the device is usable
        tracing::debug!(output = %stdout.trim(), "bluetoothctl connect");
    }

    tokio::time::sleep(Duration::from_millis(500)).await;

    let output = Command::new("l2ping")
        .args(["-c", "1"])
        .arg(&mac_upper)
        .output()
        .await
        .map_err(|e| AdapterError::command("l2ping", e))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Ok(BindResult::Unreachable(stderr.trim().to_string()));
    }

    tracing::info!(mac = %mac_upper, device = %device_path, "Binding RFCOMM");
    let output = Command::new("rfcomm")
        .arg("bind")
        .arg(channel.to_string())
        .arg(&mac_upper)
        .arg(SPP_CHANNEL)
        .output()
        .await
        .map_err(|e| AdapterError::command("rfcomm bind", e))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AdapterError::command("rfcomm bind", stderr.trim()));
    }

    tokio::time::sleep(Duration::from_millis(500)).await;

    if !Path::new(&device_path).exists() {
        return Err(AdapterError::Platform(format!(
            "{} was not created",
            device_path
        )));
    }
    Ok(BindResult::Bound(device_path))
}

/// Configure a file descriptor for raw TTY mode.
///
/// IXON/IXOFF/IXANY are cleared too: 0x11 and 0x13 occur in QR payload
/// lengths and must not be taken as flow control.
#[cfg(unix)]
fn configure_tty_raw(fd: i32) -> Result<(), AdapterError> {
    use std::mem::MaybeUninit;

    let mut termios = MaybeUninit::uninit();
    let result = unsafe { libc::tcgetattr(fd, termios.as_mut_ptr()) };
    if result != 0 {
        return Err(AdapterError::Io(std::io::Error::last_os_error()));
    }
    let mut termios = unsafe { termios.assume_init() };

    termios.c_iflag &= !(libc::IGNBRK
        | libc::BRKINT
        | libc::PARMRK
        | libc::ISTRIP
        | libc::INLCR
        | libc::IGNCR
        | libc::ICRNL
        | libc::IXON
        | libc::IXOFF
        | libc::IXANY);
    termios.c_oflag &= !libc::OPOST;
    termios.c_lflag &= !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);
    termios.c_cflag &= !(libc::CSIZE | libc::PARENB);
    termios.c_cflag |= libc::CS8;

    let result = unsafe { libc::tcsetattr(fd, libc::TCSANOW, &termios) };
    if result != 0 {
        return Err(AdapterError::Io(std::io::Error::last_os_error()));
    }

    Ok(())
}

#[cfg(not(unix))]
fn configure_tty_raw(_fd: i32) -> Result<(), AdapterError> {
    Ok(())
}

/// An open RFCOMM device node.
pub struct RfcommLink {
    path: String,
    file: Option<tokio::fs::File>,
}

impl RfcommLink {
    pub fn open(path: &str) -> Result<Self, AdapterError> {
        let file = OpenOptions::new().write(true).open(path)?;

        #[cfg(unix)]
        {
            use std::os::unix::io::AsRawFd;
            configure_tty_raw(file.as_raw_fd())?;
        }

        Ok(Self {
            path: path.to_string(),
            file: Some(tokio::fs::File::from_std(file)),
        })
    }
}

#[async_trait]
impl PrinterLink for RfcommLink {
    async fn write(&mut self, bytes: &[u8]) -> Result<(), AdapterError> {
        let file = self.file.as_mut().ok_or(AdapterError::LinkClosed)?;
        let mut chunks = bytes.chunks(CHUNK_SIZE).peekable();
        while let Some(chunk) = chunks.next() {
            file.write_all(chunk).await?;
            if chunks.peek().is_some() {
                tokio::time::sleep(CHUNK_DELAY).await;
            }
        }
        file.flush().await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), AdapterError> {
        if let Some(mut file) = self.file.take() {
            file.flush().await?;
            tracing::debug!(device = %self.path, "Closed RFCOMM link");
        }
        Ok(())
    }
}
