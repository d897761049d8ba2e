//! # Ticket Printer
//!
//! Prints bus tickets on generic Bluetooth ESC/POS thermal printers
//! (58mm and 80mm). It provides:
//!
//! - **Permission gating**: runtime Bluetooth permissions before any radio work
//! - **Discovery**: paired and nearby devices, merged and flagged as printers
//! - **Selection**: a filterable device list with scanning, empty and error views
//! - **Receipt layout**: a ticket rendered to an inspectable ESC/POS command list
//! - **Print sessions**: the whole flow as one observable state machine
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use ticket_printer::{
//!     adapter::BluezAdapter,
//!     config::SessionConfig,
//!     permission::HostPermissions,
//!     selector::FixedAddress,
//!     PrintSession, Ticket,
//! };
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let session = PrintSession::new(
//!     Arc::new(BluezAdapter::new()),
//!     Arc::new(HostPermissions),
//!     &SessionConfig::default(),
//! );
//!
//! let ticket: Ticket = serde_json::from_str(r#"{"clientName":"Jane Doe","ticketId":"ABC123XY"}"#)?;
//! let report = session
//!     .start(&ticket, &mut FixedAddress("00:11:22:33:44:55".into()))
//!     .await?;
//! println!("{} bytes sent to {}", report.bytes, report.device.name);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`permission`] | Runtime permission checks |
//! | [`adapter`] | Bluetooth backends (BlueZ, mock) |
//! | [`device`] | Device records, printer heuristic, paired-list normalization |
//! | [`discovery`] | Paired + scanned device discovery |
//! | [`selector`] | Device list state and selection prompts |
//! | [`connection`] | Connect, transmit, disconnect |
//! | [`ticket`] | Ticket record and generated fields |
//! | [`receipt`] | Ticket to command list, text preview |
//! | [`ir`] | Command list and byte encoding |
//! | [`protocol`] | ESC/POS command builders |
//! | [`session`] | The print flow state machine |
//! | [`server`] | HTTP API |

pub mod adapter;
pub mod config;
pub mod connection;
pub mod device;
pub mod discovery;
pub mod error;
pub mod ir;
pub mod permission;
pub mod printer;
pub mod protocol;
pub mod receipt;
pub mod selector;
pub mod server;
pub mod session;
pub mod ticket;

// Re-exports for convenience
pub use error::TicketPrinterError;
pub use printer::PrinterConfig;
pub use session::{FailureReason, PrintSession};
pub use ticket::Ticket;
