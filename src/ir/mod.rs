//! # Receipt Commands
//!
//! The command list sits between the receipt layout and raw ESC/POS bytes:
//!
//! ```text
//! ┌─────────────┐     ┌──────────────────┐     ┌──────────┐
//! │   Ticket    │ ──► │  Vec<Command>    │ ──► │ Codegen  │ ──► printer
//! │  (layout)   │     │  (inspectable)   │     │ (bytes)  │
//! └─────────────┘     └──────────────────┘     └──────────┘
//! ```
//!
//! Each [`Command`] encodes to a self-contained byte sequence (it re-states
//! its own alignment, font and size), so commands can be transmitted one by
//! one and a failure mid-sequence is attributable to a specific command.
//!
//! ## Example
//!
//! ```
//! use ticket_printer::ir::{Command, Program, TextBlock};
//!
//! let mut program = Program::with_init();
//! program.push(Command::Text(TextBlock::new("HELLO").center().size(2, 2)));
//! program.push(Command::Feed { lines: 3 });
//!
//! let bytes = program.to_bytes();
//! assert_eq!(&bytes[..2], &[0x1B, 0x40]);
//! ```

mod codegen;
mod ops;

pub use ops::*;
