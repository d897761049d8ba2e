//! # ESC/POS Protocol Implementation
//!
//! Low-level command builders for the ESC/POS command set spoken by the
//! 58mm/80mm Bluetooth thermal printers used at ticket counters.
//!
//! ## Module Structure
//!
//! - [`commands`]: Printer control (init, feed)
//! - [`text`]: Alignment, font and character size
//! - [`barcode`]: QR codes (`GS ( k` function 49)
//! - [`cp437`]: Code Page 437 text encoding, and decoding for previews
//!
//! ## Usage Example
//!
//! ```
//! use ticket_printer::protocol::{barcode::qr, commands, text};
//!
//! let mut data = Vec::new();
//! data.extend(commands::init());
//! data.extend(text::align(text::Alignment::Center));
//! data.extend(text::size(2, 2));
//! data.extend(b"BUS TICKET\n");
//! data.extend(text::size(1, 1));
//! data.extend(qr::generate(b"TICKET:TKT-4F9Q2Z", 6, qr::QrErrorLevel::L));
//! data.extend(commands::feed_lines(3));
//! ```
//!
//! ## Protocol Reference
//!
//! Command layouts follow the Epson "ESC/POS Application Programming Guide";
//! the subset here is the one implemented by virtually every generic
//! Bluetooth receipt printer.

pub mod barcode;
pub mod commands;
pub mod cp437;
pub mod text;
