//! # Mock Adapter
//!
//! A scripted [`BluetoothAdapter`] that records every call. Used by the test
//! suite and by `serve --mock` for trying the HTTP API without hardware.
//!
//! ```
//! use ticket_printer::adapter::{MockAdapter, ScanEvent};
//! use ticket_printer::device::RawDevice;
//!
//! let adapter = MockAdapter::new().scan_events(vec![
//!     ScanEvent::Found(RawDevice::new(Some("POS-58"), "00:11:22:33:44:55")),
//!     ScanEvent::Complete,
//! ]);
//! assert!(adapter.calls().is_empty());
//! ```

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{BluetoothAdapter, ConnectOutcome, PrinterLink, ScanEvent};
use crate::device::PairedPayload;
use crate::error::AdapterError;

/// How [`MockAdapter::connect`] answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectBehavior {
    Accept,
    Refuse,
    Fail,
    /// Never answers.
    Hang,
}

/// How the link handed out by `connect` behaves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LinkBehavior {
    #[default]
    Healthy,
    /// The write with this zero-based index fails.
    FailAt(usize),
    /// The write with this zero-based index never completes.
    HangAt(usize),
}

#[derive(Default)]
struct MockState {
    enabled: bool,
    calls: Vec<String>,
    written: Vec<Vec<u8>>,
    link_closed: bool,
    active_scans: usize,
    max_active_scans: usize,
    open_scan: Option<mpsc::Sender<ScanEvent>>,
}

fn lock(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct MockAdapter {
    state: Arc<Mutex<MockState>>,
    enable_fails: bool,
    enable_turns_on: bool,
    paired: PairedPayload,
    scan_events: Vec<ScanEvent>,
    scan_start_fails: bool,
    scan_hangs: bool,
    scan_delay: Duration,
    connect: ConnectBehavior,
    link: LinkBehavior,
}

impl Default for MockAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAdapter {
    /// An enabled adapter with no devices whose scan completes immediately.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                enabled: true,
                ..MockState::default()
            })),
            enable_fails: false,
            enable_turns_on: true,
            paired: PairedPayload::Empty,
            scan_events: vec![ScanEvent::Complete],
            scan_start_fails: false,
            scan_hangs: false,
            scan_delay: Duration::ZERO,
            connect: ConnectBehavior::Accept,
            link: LinkBehavior::Healthy,
        }
    }

    pub fn disabled(self) -> Self {
        lock(&self.state).enabled = false;
        self
    }

    pub fn enable_fails(mut self) -> Self {
        self.enable_fails = true;
        self
    }

    /// `enable` succeeds but the adapter stays off.
    pub fn enable_stays_off(mut self) -> Self {
        self.enable_turns_on = false;
        self
    }

    pub fn paired(mut self, payload: PairedPayload) -> Self {
        self.paired = payload;
        self
    }

    /// Events delivered by the next scans. Include [`ScanEvent::Complete`]
    /// to end the scan normally.
    pub fn scan_events(mut self, events: Vec<ScanEvent>) -> Self {
        self.scan_events = events;
        self
    }

    pub fn scan_start_fails(mut self) -> Self {
        self.scan_start_fails = true;
        self
    }

    /// The scan channel stays open after the scripted events.
    pub fn scan_hangs(mut self) -> Self {
        self.scan_hangs = true;
        self
    }

    /// Delay before the scripted events are delivered.
    pub fn scan_delay(mut self, delay: Duration) -> Self {
        self.scan_delay = delay;
        self
    }

    pub fn connect_behavior(mut self, behavior: ConnectBehavior) -> Self {
        self.connect = behavior;
        self
    }

    pub fn link_behavior(mut self, behavior: LinkBehavior) -> Self {
        self.link = behavior;
        self
    }

    /// Calls made so far, e.g. `"start_scan"` or `"connect 00:11:22:33:44:55"`.
    pub fn calls(&self) -> Vec<String> {
        lock(&self.state).calls.clone()
    }

    /// Every buffer written to a link, in order.
    pub fn written(&self) -> Vec<Vec<u8>> {
        lock(&self.state).written.clone()
    }

    pub fn link_closed(&self) -> bool {
        lock(&self.state).link_closed
    }

    /// Highest number of scans running at the same time.
    pub fn max_concurrent_scans(&self) -> usize {
        lock(&self.state).max_active_scans
    }

    fn record(&self, call: impl Into<String>) {
        lock(&self.state).calls.push(call.into());
    }
}

#[async_trait]
impl BluetoothAdapter for MockAdapter {
    async fn is_enabled(&self) -> Result<bool, AdapterError> {
        self.record("is_enabled");
        Ok(lock(&self.state).enabled)
    }

    async fn enable(&self) -> Result<PairedPayload, AdapterError> {
        self.record("enable");
        if self.enable_fails {
            return Err(AdapterError::Platform("adapter refused to power on".into()));
        }
        if self.enable_turns_on {
            lock(&self.state).enabled = true;
        }
        Ok(self.paired.clone())
    }

    async fn paired_devices(&self) -> Result<PairedPayload, AdapterError> {
        self.record("paired_devices");
        Ok(self.paired.clone())
    }

    async fn start_scan(
        &self,
        _duration: Duration,
    ) -> Result<mpsc::Receiver<ScanEvent>, AdapterError> {
        self.record("start_scan");
        if self.scan_start_fails {
            return Err(AdapterError::Platform("discovery could not start".into()));
        }

        {
            let mut state = lock(&self.state);
            state.active_scans += 1;
            state.max_active_scans = state.max_active_scans.max(state.active_scans);
        }

        let (tx, rx) = mpsc::channel(self.scan_events.len() + 1);
        let events = self.scan_events.clone();
        let delay = self.scan_delay;
        if self.scan_hangs {
            lock(&self.state).open_scan = Some(tx.clone());
        }
        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            for event in events {
                if tx.send(event).await.is_err() {
                    break;
                }
            }
        });
        Ok(rx)
    }

    async fn stop_scan(&self) -> Result<(), AdapterError> {
        self.record("stop_scan");
        let mut state = lock(&self.state);
        state.active_scans = state.active_scans.saturating_sub(1);
        state.open_scan = None;
        Ok(())
    }

    async fn connect(&self, address: &str) -> Result<ConnectOutcome, AdapterError> {
        self.record(format!("connect {}", address));
        match self.connect {
            ConnectBehavior::Accept => Ok(ConnectOutcome::Connected(Box::new(MockLink {
                state: Arc::clone(&self.state),
                behavior: self.link,
                writes: 0,
                closed: false,
            }))),
            ConnectBehavior::Refuse => Ok(ConnectOutcome::Refused),
            ConnectBehavior::Fail => Err(AdapterError::Platform("connection attempt failed".into())),
            ConnectBehavior::Hang => Ok(std::future::pending().await),
        }
    }
}

struct MockLink {
    state: Arc<Mutex<MockState>>,
    behavior: LinkBehavior,
    writes: usize,
    closed: bool,
}

#[async_trait]
impl PrinterLink for MockLink {
    async fn write(&mut self, bytes: &[u8]) -> Result<(), AdapterError> {
        if self.closed {
            return Err(AdapterError::LinkClosed);
        }
        let index = self.writes;
        self.writes += 1;
        match self.behavior {
            LinkBehavior::FailAt(n) if n == index => {
                return Err(AdapterError::Io(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "printer went away",
                )));
            }
            LinkBehavior::HangAt(n) if n == index => std::future::pending::<()>().await,
            _ => {}
        }
        lock(&self.state).written.push(bytes.to_vec());
        Ok(())
    }

    async fn close(&mut self) -> Result<(), AdapterError> {
        self.closed = true;
        let mut state = lock(&self.state);
        state.calls.push("close".into());
        state.link_closed = true;
        Ok(())
    }
}
