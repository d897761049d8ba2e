//! # Printer Configuration
//!
//! Hardware profiles for the generic ESC/POS Bluetooth printers sold for
//! ticketing and point of sale.
//!
//! | Profile | Paper | Width (dots) | Columns (Font A) |
//! |---------|-------|--------------|------------------|
//! | MM58 | 58mm | 384 | 32 |
//! | MM80 | 80mm | 576 | 48 |
//!
//! ```
//! use ticket_printer::printer::PrinterConfig;
//!
//! let config = PrinterConfig::MM58;
//! assert_eq!(config.columns, 32);
//! assert_eq!(config.separator(), "-".repeat(32));
//! ```

use serde::Deserialize;

/// Paper roll width, as named in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaperSize {
    #[default]
    Mm58,
    Mm80,
}

impl PaperSize {
    pub fn config(self) -> PrinterConfig {
        match self {
            PaperSize::Mm58 => PrinterConfig::MM58,
            PaperSize::Mm80 => PrinterConfig::MM80,
        }
    }

    /// Parse a paper size from a CLI argument ("58", "mm58", "80mm", ...).
    pub fn parse(s: &str) -> Result<Self, String> {
        let digits: String = s.chars().filter(char::is_ascii_digit).collect();
        match digits.as_str() {
            "58" => Ok(PaperSize::Mm58),
            "80" => Ok(PaperSize::Mm80),
            _ => Err(format!("unknown paper size '{}', expected 58 or 80", s)),
        }
    }
}

/// # Printer Configuration
///
/// ## Calculations
///
/// ```text
/// dots_per_mm = dpi / 25.4
///
/// For a 58mm printer at 203 DPI:
///   dots_per_mm = 203 / 25.4 ≈ 8
///   printable   = 384 / 8 = 48mm
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrinterConfig {
    pub name: &'static str,

    /// Maximum print width in dots
    pub width_dots: u16,

    /// Resolution in dots per inch
    pub dpi: u16,

    /// Characters per line in Font A at normal size
    pub columns: usize,
}

impl PrinterConfig {
    /// 58mm roll, the common handheld ticket printer.
    pub const MM58: Self = Self {
        name: "ESC/POS 58mm",
        width_dots: 384,
        dpi: 203,
        columns: 32,
    };

    /// 80mm roll, counter-top receipt printer.
    pub const MM80: Self = Self {
        name: "ESC/POS 80mm",
        width_dots: 576,
        dpi: 203,
        columns: 48,
    };

    #[inline]
    pub fn dots_per_mm(&self) -> f32 {
        self.dpi as f32 / 25.4
    }

    #[inline]
    pub fn width_mm(&self) -> f32 {
        self.width_dots as f32 / self.dots_per_mm()
    }

    /// A dashed rule spanning the full line.
    pub fn separator(&self) -> String {
        "-".repeat(self.columns)
    }

    /// Clamp a requested symbol width to the printable area.
    pub fn fit_width(&self, px: u32) -> u32 {
        px.min(self.width_dots as u32)
    }
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self::MM58
    }
}
