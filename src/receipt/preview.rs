//! # Text Preview
//!
//! Renders a command list as the printer would lay it out on a line-based
//! display: wrapped to the paper's column count, aligned, and with the QR
//! symbol drawn in Unicode half blocks.

use qrcode::QrCode;
use qrcode::render::unicode;

use crate::ir::{Command, Program, QrBlock, TextBlock};
use crate::protocol::cp437;
use crate::protocol::text::Alignment;

/// Render `program` as text lines `columns` wide.
pub fn render_text(program: &Program, columns: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    for command in program {
        match command {
            Command::Init => {}
            Command::Text(block) => text_lines(block, columns, &mut lines),
            Command::QrCode(block) => qr_lines(block, columns, &mut lines),
            Command::Feed { lines: n } => {
                lines.extend(std::iter::repeat_n(String::new(), *n as usize));
            }
        }
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn place(line: &str, display_width: usize, align: Alignment, columns: usize) -> String {
    let pad = match align {
        Alignment::Left => 0,
        Alignment::Center => columns.saturating_sub(display_width) / 2,
        Alignment::Right => columns.saturating_sub(display_width),
    };
    format!("{}{}", " ".repeat(pad), line).trim_end().to_string()
}

fn text_lines(block: &TextBlock, columns: usize, out: &mut Vec<String>) {
    let scale = block.width_scale.max(1) as usize;
    let per_line = (columns / scale).max(1);

    // Show what the printer receives: unmapped characters come out as '?'.
    let printed = cp437::decode(&cp437::encode(&block.content));
    let content = printed.strip_suffix('\n').unwrap_or(&printed);
    for line in content.split('\n') {
        let chars: Vec<char> = line.chars().collect();
        if chars.is_empty() {
            out.push(String::new());
            continue;
        }
        for chunk in chars.chunks(per_line) {
            let text: String = chunk.iter().collect();
            out.push(place(&text, chunk.len() * scale, block.align, columns));
        }
    }
}

fn qr_lines(block: &QrBlock, columns: usize, out: &mut Vec<String>) {
    let code = match QrCode::with_error_correction_level(
        block.payload.as_bytes(),
        block.error_level.ec_level(),
    ) {
        Ok(code) => code,
        Err(e) => {
            tracing::warn!(error = %e, "QR preview unavailable");
            out.push(place(&format!("[QR: {}]", block.payload), block.payload.len() + 6, block.align, columns));
            return;
        }
    };
    let image = code
        .render::<unicode::Dense1x2>()
        .quiet_zone(false)
        .build();
    for line in image.lines() {
        out.push(place(line, line.chars().count(), block.align, columns));
    }
}
