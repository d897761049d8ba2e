//! # Code Generation
//!
//! Converts commands to ESC/POS bytes.

use super::ops::{Command, Program, QrBlock, TextBlock};
use crate::protocol::{barcode::qr, commands, cp437, text};

impl Command {
    /// Encode this command as a self-contained ESC/POS byte sequence.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Command::Init => {
                let mut out = commands::init();
                out.extend(text::codepage(0));
                out
            }
            Command::Text(block) => encode_text(block),
            Command::QrCode(block) => encode_qr(block),
            Command::Feed { lines } => commands::feed_lines(*lines),
        }
    }
}

fn encode_text(block: &TextBlock) -> Vec<u8> {
    let mut out = Vec::with_capacity(block.content.len() + 12);
    out.extend(text::align(block.align));
    out.extend(text::font(block.font));
    out.extend(text::size(block.width_scale, block.height_scale));
    out.extend(text::bold(block.bold));
    out.extend(cp437::encode(&block.content));
    out
}

fn encode_qr(block: &QrBlock) -> Vec<u8> {
    let payload = block.payload.as_bytes();
    let module = qr::module_size_for(payload, block.size_px, block.error_level);
    let mut out = text::align(block.align);
    out.extend(qr::generate(payload, module, block.error_level));
    out.push(commands::LF);
    out
}

impl Program {
    /// Compile the whole program to one byte buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.commands.iter().flat_map(Command::encode).collect()
    }
}
