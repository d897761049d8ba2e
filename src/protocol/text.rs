//! # ESC/POS Text Formatting Commands
//!
//! | Style | Command | Effect |
//! |-------|---------|--------|
//! | Alignment | ESC a n | Left / center / right |
//! | Font | ESC M n | Font A (12×24) or Font B (9×17) |
//! | Size | GS ! n | 1x–8x width and height |
//! | Bold | ESC E n | Emphasized text |
//!
//! ## Columns per Line
//!
//! | Paper | Font A | Font B |
//! |-------|--------|--------|
//! | 58mm  | 32     | 42     |
//! | 80mm  | 48     | 64     |

use serde::Serialize;

use super::commands::{ESC, GS};

// ============================================================================
// TEXT ALIGNMENT
// ============================================================================

/// Text alignment options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left = 0,
    Center = 1,
    Right = 2,
}

/// # Select Justification (ESC a n)
///
/// | Format  | Bytes    |
/// |---------|----------|
/// | ASCII   | ESC a n  |
/// | Hex     | 1B 61 n  |
///
/// Takes effect at the start of the next line; applies to text and QR
/// symbols alike.
///
/// ```
/// use ticket_printer::protocol::text::{align, Alignment};
///
/// assert_eq!(align(Alignment::Center), vec![0x1B, 0x61, 0x01]);
/// ```
pub fn align(alignment: Alignment) -> Vec<u8> {
    vec![ESC, b'a', alignment as u8]
}

// ============================================================================
// FONT SELECTION
// ============================================================================

/// Character fonts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Font {
    /// Font A: 12×24 dots
    #[default]
    A = 0,
    /// Font B: 9×17 dots, more columns per line
    B = 1,
}

/// # Select Character Font (ESC M n)
///
/// | Format  | Bytes    |
/// |---------|----------|
/// | ASCII   | ESC M n  |
/// | Hex     | 1B 4D n  |
pub fn font(f: Font) -> Vec<u8> {
    vec![ESC, b'M', f as u8]
}

// ============================================================================
// CHARACTER SIZE
// ============================================================================

/// # Select Character Size (GS ! n)
///
/// `width` and `height` are multipliers (1 = normal, 2 = double, up to 8).
/// The parameter byte packs them as `(width - 1) << 4 | (height - 1)`.
///
/// | Format  | Bytes   |
/// |---------|---------|
/// | ASCII   | GS ! n  |
/// | Hex     | 1D 21 n |
///
/// ```
/// use ticket_printer::protocol::text::size;
///
/// assert_eq!(size(1, 1), vec![0x1D, 0x21, 0x00]);
/// assert_eq!(size(2, 2), vec![0x1D, 0x21, 0x11]);
/// ```
pub fn size(width: u8, height: u8) -> Vec<u8> {
    let w = width.clamp(1, 8) - 1;
    let h = height.clamp(1, 8) - 1;
    vec![GS, b'!', (w << 4) | h]
}

// ============================================================================
// EMPHASIS
// ============================================================================

/// # Turn Emphasized Mode On/Off (ESC E n)
///
/// | Format  | Bytes    |
/// |---------|----------|
/// | ASCII   | ESC E n  |
/// | Hex     | 1B 45 n  |
pub fn bold(enabled: bool) -> Vec<u8> {
    vec![ESC, b'E', enabled as u8]
}

// ============================================================================
// CODE PAGE
// ============================================================================

/// # Select Character Code Table (ESC t n)
///
/// `n = 0` selects PC437, the table [`super::cp437::encode`] targets.
pub fn codepage(n: u8) -> Vec<u8> {
    vec![ESC, b't', n]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align() {
        assert_eq!(align(Alignment::Left), vec![0x1B, 0x61, 0x00]);
        assert_eq!(align(Alignment::Center), vec![0x1B, 0x61, 0x01]);
        assert_eq!(align(Alignment::Right), vec![0x1B, 0x61, 0x02]);
    }

    #[test]
    fn test_font() {
        assert_eq!(font(Font::A), vec![0x1B, 0x4D, 0x00]);
        assert_eq!(font(Font::B), vec![0x1B, 0x4D, 0x01]);
    }

    #[test]
    fn test_size_packs_width_high_nibble() {
        assert_eq!(size(2, 1), vec![0x1D, 0x21, 0x10]);
        assert_eq!(size(1, 2), vec![0x1D, 0x21, 0x01]);
    }

    #[test]
    fn test_size_clamps() {
        assert_eq!(size(0, 0), vec![0x1D, 0x21, 0x00]);
        assert_eq!(size(10, 10), vec![0x1D, 0x21, 0x77]);
    }

    #[test]
    fn test_bold() {
        assert_eq!(bold(true), vec![0x1B, 0x45, 0x01]);
        assert_eq!(bold(false), vec![0x1B, 0x45, 0x00]);
    }

    #[test]
    fn test_codepage() {
        assert_eq!(codepage(0), vec![0x1B, 0x74, 0x00]);
    }
}
