//! # Devices
//!
//! Discovered Bluetooth devices and the normalization of the paired-device
//! payloads platforms hand back.
//!
//! ## Paired payload shapes
//!
//! | Shape | Example |
//! |-------|---------|
//! | null | `null` |
//! | JSON string | `"[{\"name\":\"POS-58\",\"address\":\"00:11:..\"}]"` |
//! | array of JSON strings | `["{\"name\":\"POS-58\",\"address\":\"00:11:..\"}"]` |
//! | array of objects | `[{"name":"POS-58","address":"00:11:.."}]` |
//!
//! All of them normalize to a `Vec<RawDevice>`. Entries that fail to parse
//! are logged and dropped.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name shown for devices that did not report one.
pub const UNKNOWN_DEVICE: &str = "Unknown Device";

/// Case-insensitive substrings that mark a device name as a printer.
pub const PRINTER_KEYWORDS: [&str; 5] = ["printer", "pos", "thermal", "receipt", "escpos"];

/// Name heuristic for printers.
///
/// This is a plain substring match, so `"My POS Phone"` counts as a printer
/// and a printer advertising only a model number does not.
pub fn is_printer_name(name: Option<&str>) -> bool {
    let Some(name) = name else {
        return false;
    };
    let name = name.to_lowercase();
    PRINTER_KEYWORDS.iter().any(|keyword| name.contains(keyword))
}

/// A device record as the platform reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawDevice {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl RawDevice {
    pub fn new(name: Option<&str>, address: &str) -> Self {
        Self {
            name: name.map(str::to_string),
            address: Some(address.to_string()),
        }
    }
}

/// A device as presented to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub address: String,
    pub name: String,
    pub paired: bool,
    pub is_printer: bool,
}

impl Device {
    /// Build a device from a raw record. Records without an address are
    /// unusable and yield `None`.
    pub fn from_raw(raw: &RawDevice, paired: bool) -> Option<Self> {
        let address = raw.address.as_deref().map(str::trim).filter(|a| !a.is_empty())?;
        let reported = raw.name.as_deref().filter(|n| !n.trim().is_empty());
        Some(Self {
            address: address.to_string(),
            name: reported.unwrap_or(UNKNOWN_DEVICE).to_string(),
            paired,
            is_printer: is_printer_name(reported),
        })
    }
}

/// The paired-device list in whichever shape the platform produced.
#[derive(Debug, Clone, PartialEq)]
pub enum PairedPayload {
    Empty,
    Json(String),
    JsonStrings(Vec<String>),
    Objects(Vec<Value>),
}

impl PairedPayload {
    /// Classify an arbitrary JSON value.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Null => PairedPayload::Empty,
            Value::String(s) if s.trim().is_empty() => PairedPayload::Empty,
            Value::String(s) => PairedPayload::Json(s),
            Value::Array(items) if items.is_empty() => PairedPayload::Empty,
            Value::Array(items) if items.iter().all(Value::is_string) => {
                PairedPayload::JsonStrings(
                    items
                        .into_iter()
                        .filter_map(|v| match v {
                            Value::String(s) => Some(s),
                            _ => None,
                        })
                        .collect(),
                )
            }
            Value::Array(items) => PairedPayload::Objects(items),
            other => PairedPayload::Objects(vec![other]),
        }
    }

    /// Normalize to raw device records.
    pub fn normalize(self) -> Vec<RawDevice> {
        match self {
            PairedPayload::Empty => Vec::new(),
            PairedPayload::Json(text) => match serde_json::from_str::<Value>(&text) {
                Ok(Value::Array(items)) => items.into_iter().filter_map(normalize_entry).collect(),
                Ok(Value::Null) => Vec::new(),
                Ok(other) => {
                    tracing::warn!(payload = %other, "Paired payload is not a list");
                    Vec::new()
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to parse paired devices");
                    Vec::new()
                }
            },
            PairedPayload::JsonStrings(items) => items
                .into_iter()
                .filter_map(|s| normalize_entry(Value::String(s)))
                .collect(),
            PairedPayload::Objects(items) => items.into_iter().filter_map(normalize_entry).collect(),
        }
    }
}

fn normalize_entry(value: Value) -> Option<RawDevice> {
    let value = match value {
        Value::String(s) => match serde_json::from_str::<Value>(&s) {
            Ok(parsed) => parsed,
            Err(_) => {
                tracing::warn!(entry = %s, "Failed to parse device string");
                return None;
            }
        },
        other => other,
    };
    if !value.is_object() {
        tracing::warn!(entry = %value, "Ignoring non-object device entry");
        return None;
    }
    match serde_json::from_value::<RawDevice>(value.clone()) {
        Ok(raw) => Some(raw),
        Err(e) => {
            tracing::warn!(entry = %value, error = %e, "Ignoring malformed device entry");
            None
        }
    }
}

/// Merge device lists in order, keeping the first record for each address.
pub fn merge_devices(lists: impl IntoIterator<Item = Device>) -> Vec<Device> {
    let mut merged: Vec<Device> = Vec::new();
    for device in lists {
        if !merged
            .iter()
            .any(|d| d.address.eq_ignore_ascii_case(&device.address))
        {
            merged.push(device);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn addresses(raw: &[RawDevice]) -> Vec<&str> {
        raw.iter().filter_map(|r| r.address.as_deref()).collect()
    }

    #[test]
    fn test_printer_keywords() {
        assert!(is_printer_name(Some("POS-58")));
        assert!(is_printer_name(Some("Thermal Printer")));
        assert!(is_printer_name(Some("MPT-II receipt")));
        assert!(is_printer_name(Some("ESCPOS_01")));
        assert!(!is_printer_name(Some("Galaxy Buds")));
        assert!(!is_printer_name(Some("")));
        assert!(!is_printer_name(None));
    }

    #[test]
    fn test_printer_heuristic_false_positive() {
        // Substring match: a phone with "POS" in its name is misclassified.
        assert!(is_printer_name(Some("My POS Phone")));
    }

    #[test]
    fn test_device_from_raw_defaults_name() {
        let device = Device::from_raw(&RawDevice::new(None, "AA:BB:CC:DD:EE:FF"), true).unwrap();
        assert_eq!(device.name, UNKNOWN_DEVICE);
        assert!(device.paired);
        assert!(!device.is_printer);
    }

    #[test]
    fn test_device_from_raw_requires_address() {
        let raw = RawDevice {
            name: Some("POS-58".into()),
            address: None,
        };
        assert_eq!(Device::from_raw(&raw, false), None);
        let blank = RawDevice::new(Some("POS-58"), "  ");
        assert_eq!(Device::from_raw(&blank, false), None);
    }

    #[test]
    fn test_normalize_null() {
        assert!(PairedPayload::from_value(Value::Null).normalize().is_empty());
        assert!(PairedPayload::Empty.normalize().is_empty());
    }

    #[test]
    fn test_normalize_json_string() {
        let payload = PairedPayload::from_value(json!(
            r#"[{"name":"POS-58","address":"00:11:22:33:44:55"}]"#
        ));
        let raw = payload.normalize();
        assert_eq!(raw.len(), 1);
        assert_eq!(raw[0].name.as_deref(), Some("POS-58"));
        assert_eq!(addresses(&raw), vec!["00:11:22:33:44:55"]);
    }

    #[test]
    fn test_normalize_json_strings() {
        let payload = PairedPayload::from_value(json!([
            r#"{"name":"POS-58","address":"00:11:22:33:44:55"}"#,
            "not json",
            r#"{"name":"Headset","address":"66:77:88:99:AA:BB"}"#
        ]));
        assert!(matches!(payload, PairedPayload::JsonStrings(_)));
        let raw = payload.normalize();
        assert_eq!(addresses(&raw), vec!["00:11:22:33:44:55", "66:77:88:99:AA:BB"]);
    }

    #[test]
    fn test_normalize_objects() {
        let payload = PairedPayload::from_value(json!([
            {"name": "POS-58", "address": "00:11:22:33:44:55"},
            42,
            {"address": "66:77:88:99:AA:BB"}
        ]));
        let raw = payload.normalize();
        assert_eq!(raw.len(), 2);
        assert_eq!(raw[1].name, None);
    }

    #[test]
    fn test_normalize_json_string_inside_json_string() {
        let inner = r#"{"name":"POS-58","address":"00:11:22:33:44:55"}"#;
        let outer = serde_json::to_string(&vec![inner]).unwrap();
        let raw = PairedPayload::Json(outer).normalize();
        assert_eq!(addresses(&raw), vec!["00:11:22:33:44:55"]);
    }

    #[test]
    fn test_normalize_garbage_is_not_fatal() {
        assert!(PairedPayload::Json("{{{".into()).normalize().is_empty());
        assert!(PairedPayload::Json(r#"{"name":"x"}"#.into()).normalize().is_empty());
    }

    #[test]
    fn test_merge_keeps_first_occurrence() {
        let paired = Device::from_raw(&RawDevice::new(Some("POS-58"), "00:11:22:33:44:55"), true);
        let scanned = Device::from_raw(&RawDevice::new(Some("Renamed"), "00:11:22:33:44:55"), false);
        let other = Device::from_raw(&RawDevice::new(None, "66:77:88:99:AA:BB"), false);
        let merged = merge_devices([paired, scanned, other].into_iter().flatten());
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].name, "POS-58");
        assert!(merged[0].paired);
    }

    #[test]
    fn test_merge_address_case_insensitive() {
        let a = Device::from_raw(&RawDevice::new(None, "aa:bb:cc:dd:ee:ff"), true);
        let b = Device::from_raw(&RawDevice::new(None, "AA:BB:CC:DD:EE:FF"), false);
        assert_eq!(merge_devices([a, b].into_iter().flatten()).len(), 1);
    }

    #[test]
    fn test_device_serializes_camel_case() {
        let device = Device::from_raw(&RawDevice::new(Some("POS-58"), "00:11:22:33:44:55"), true).unwrap();
        let json = serde_json::to_value(&device).unwrap();
        assert_eq!(json["isPrinter"], true);
        assert_eq!(json["paired"], true);
    }
}
