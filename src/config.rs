//! # Configuration
//!
//! Session settings, loaded from an optional JSON file. Every key is
//! optional:
//!
//! ```json
//! {
//!   "scan_timeout_secs": 8,
//!   "connect_timeout_secs": 10,
//!   "transmit_timeout_secs": 10,
//!   "auto_enable_bluetooth": true,
//!   "paper": "mm58",
//!   "layout": { "business_name": "RUKUNDO EGUMEHO TRANSPORTERS" }
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::discovery::DiscoveryConfig;
use crate::error::ConfigError;
use crate::printer::{PaperSize, PrinterConfig};
use crate::receipt::ReceiptLayout;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub scan_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub transmit_timeout_secs: u64,
    pub auto_enable_bluetooth: bool,
    pub paper: PaperSize,
    pub layout: ReceiptLayout,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            scan_timeout_secs: 8,
            connect_timeout_secs: 10,
            transmit_timeout_secs: 10,
            auto_enable_bluetooth: true,
            paper: PaperSize::default(),
            layout: ReceiptLayout::default(),
        }
    }
}

impl SessionConfig {
    /// Load from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("scan_timeout_secs", self.scan_timeout_secs),
            ("connect_timeout_secs", self.connect_timeout_secs),
            ("transmit_timeout_secs", self.transmit_timeout_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{} must be at least 1", name)));
            }
        }
        if self.layout.qr_size_px == 0 {
            return Err(ConfigError::Invalid("layout.qr_size_px must be positive".into()));
        }
        Ok(())
    }

    pub fn scan_timeout(&self) -> Duration {
        Duration::from_secs(self.scan_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn transmit_timeout(&self) -> Duration {
        Duration::from_secs(self.transmit_timeout_secs)
    }

    pub fn printer(&self) -> PrinterConfig {
        self.paper.config()
    }

    pub fn discovery(&self) -> DiscoveryConfig {
        DiscoveryConfig {
            scan_duration: self.scan_timeout(),
            auto_enable: self.auto_enable_bluetooth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
        assert_eq!(config.transmit_timeout(), Duration::from_secs(10));
        assert_eq!(config.printer(), PrinterConfig::MM58);
        assert!(config.discovery().auto_enable);
    }

    #[test]
    fn test_partial_json() {
        let config: SessionConfig =
            serde_json::from_str(r#"{"connect_timeout_secs": 4, "paper": "mm80"}"#).unwrap();
        assert_eq!(config.connect_timeout(), Duration::from_secs(4));
        assert_eq!(config.transmit_timeout(), Duration::from_secs(10));
        assert_eq!(config.printer().columns, 48);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = SessionConfig {
            transmit_timeout_secs: 0,
            ..SessionConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let err = SessionConfig::load(Path::new("/nonexistent/ticket-printer.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("ticket-printer-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"auto_enable_bluetooth": false}"#).unwrap();
        let config = SessionConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert!(!config.auto_enable_bluetooth);
    }

    #[test]
    fn test_load_or_default() {
        assert_eq!(
            SessionConfig::load_or_default(None).unwrap(),
            SessionConfig::default()
        );
    }
}
