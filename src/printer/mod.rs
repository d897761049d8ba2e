//! # Printer Module
//!
//! - [`config`]: Paper and printer hardware profiles

pub mod config;

pub use config::{PaperSize, PrinterConfig};
