//! Server state and configuration.

use std::sync::Arc;

use crate::adapter::BluetoothAdapter;
use crate::config::SessionConfig;
use crate::discovery::DeviceDiscovery;
use crate::permission::PermissionPlatform;
use crate::session::PrintSession;
use crate::ticket::{Clock, SystemClock};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:8080")
    pub listen_addr: String,
}

/// Application state shared across handlers.
///
/// There is one print session for the whole server, so concurrent print
/// requests are rejected as busy rather than fighting over the adapter.
pub struct AppState {
    pub session: PrintSession,
    pub discovery: DeviceDiscovery,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(
        adapter: Arc<dyn BluetoothAdapter>,
        permissions: Arc<dyn PermissionPlatform>,
        config: &SessionConfig,
    ) -> Self {
        Self {
            discovery: DeviceDiscovery::new(Arc::clone(&adapter), config.discovery()),
            session: PrintSession::new(adapter, permissions, config),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}
