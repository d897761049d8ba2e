//! # ESC/POS 2D Symbol Commands
//!
//! QR codes are printed by the printer's own symbol engine in a multi-step
//! `GS ( k` sequence (cn = 49):
//!
//! 1. Select model (function 165)
//! 2. Set module size (function 167)
//! 3. Set error correction (function 169)
//! 4. Store data (function 180)
//! 5. Print stored symbol (function 181)
//!
//! ```
//! use ticket_printer::protocol::barcode::qr::{self, QrErrorLevel};
//!
//! let cmd = qr::generate(b"TICKET:TKT-4F9Q2Z", 8, QrErrorLevel::L);
//! assert_eq!(&cmd[..3], &[0x1D, 0x28, 0x6B]);
//! ```

use super::commands::GS;

/// QR Code command builders
pub mod qr {
    use serde::Serialize;

    use super::GS;
    use crate::protocol::commands::u16_le;

    /// Largest module size the `GS ( k` function 167 accepts.
    pub const MAX_MODULE_SIZE: u8 = 16;

    /// QR Code error correction level
    ///
    /// | Level | Recovery | n |
    /// |-------|----------|---|
    /// | L | ~7% | 48 |
    /// | M | ~15% | 49 |
    /// | Q | ~25% | 50 |
    /// | H | ~30% | 51 |
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
    pub enum QrErrorLevel {
        /// Lowest redundancy, smallest symbol. Ticket QR codes use this.
        #[default]
        L = 48,
        M = 49,
        Q = 50,
        H = 51,
    }

    impl QrErrorLevel {
        /// Same level in the `qrcode` crate, for size estimation and previews.
        pub fn ec_level(self) -> qrcode::EcLevel {
            match self {
                QrErrorLevel::L => qrcode::EcLevel::L,
                QrErrorLevel::M => qrcode::EcLevel::M,
                QrErrorLevel::Q => qrcode::EcLevel::Q,
                QrErrorLevel::H => qrcode::EcLevel::H,
            }
        }
    }

    fn function(cn_fn: &[u8]) -> Vec<u8> {
        let len = u16_le(cn_fn.len() as u16);
        let mut cmd = vec![GS, b'(', b'k', len[0], len[1]];
        cmd.extend_from_slice(cn_fn);
        cmd
    }

    /// # Select Model 2 (GS ( k 04 00 31 41 32 00)
    pub fn set_model2() -> Vec<u8> {
        function(&[0x31, 0x41, 0x32, 0x00])
    }

    /// # Set Module Size (GS ( k 03 00 31 43 n)
    ///
    /// `n` is the dot width of one module, clamped to 1–16.
    pub fn set_module_size(size: u8) -> Vec<u8> {
        function(&[0x31, 0x43, size.clamp(1, MAX_MODULE_SIZE)])
    }

    /// # Set Error Correction Level (GS ( k 03 00 31 45 n)
    pub fn set_error_correction(level: QrErrorLevel) -> Vec<u8> {
        function(&[0x31, 0x45, level as u8])
    }

    /// # Store Symbol Data (GS ( k pL pH 31 50 30 d1...dk)
    ///
    /// `pL pH` counts the three `cn fn m` bytes plus the payload.
    pub fn store_data(data: &[u8]) -> Vec<u8> {
        let len = data.len().min(u16::MAX as usize - 3);
        let mut body = Vec::with_capacity(len + 3);
        body.extend_from_slice(&[0x31, 0x50, 0x30]);
        body.extend_from_slice(&data[..len]);
        function(&body)
    }

    /// # Print Stored Symbol (GS ( k 03 00 31 51 30)
    pub fn print() -> Vec<u8> {
        function(&[0x31, 0x51, 0x30])
    }

    /// Full QR sequence: model, module size, error level, data, print.
    pub fn generate(data: &[u8], module_size: u8, level: QrErrorLevel) -> Vec<u8> {
        let mut cmd = Vec::new();
        cmd.extend(set_model2());
        cmd.extend(set_module_size(module_size));
        cmd.extend(set_error_correction(level));
        cmd.extend(store_data(data));
        cmd.extend(print());
        cmd
    }

    /// Module size that makes the symbol for `data` at most `size_px` dots
    /// wide.
    ///
    /// The symbol version is computed with the `qrcode` crate so the printed
    /// QR matches the requested pixel size as closely as the printer's
    /// integer module sizes allow. Payloads the encoder rejects fall back to
    /// the smallest module.
    pub fn module_size_for(data: &[u8], size_px: u32, level: QrErrorLevel) -> u8 {
        match qrcode::QrCode::with_error_correction_level(data, level.ec_level()) {
            Ok(code) => {
                let modules = code.width().max(1) as u32;
                (size_px / modules).clamp(1, MAX_MODULE_SIZE as u32) as u8
            }
            Err(e) => {
                tracing::warn!(error = %e, "QR payload not encodable, using minimum module size");
                1
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::qr::{self, QrErrorLevel};

    #[test]
    fn test_set_model2() {
        assert_eq!(
            qr::set_model2(),
            vec![0x1D, 0x28, 0x6B, 0x04, 0x00, 0x31, 0x41, 0x32, 0x00]
        );
    }

    #[test]
    fn test_set_module_size_clamps() {
        assert_eq!(
            qr::set_module_size(0),
            vec![0x1D, 0x28, 0x6B, 0x03, 0x00, 0x31, 0x43, 0x01]
        );
        assert_eq!(
            qr::set_module_size(40),
            vec![0x1D, 0x28, 0x6B, 0x03, 0x00, 0x31, 0x43, 0x10]
        );
    }

    #[test]
    fn test_error_correction_low() {
        assert_eq!(
            qr::set_error_correction(QrErrorLevel::L),
            vec![0x1D, 0x28, 0x6B, 0x03, 0x00, 0x31, 0x45, 0x30]
        );
    }

    #[test]
    fn test_store_data_length_includes_header() {
        let cmd = qr::store_data(b"TICKET:ABC123XY");
        // 15 payload bytes + 3 = 18 = 0x12
        assert_eq!(&cmd[..8], &[0x1D, 0x28, 0x6B, 0x12, 0x00, 0x31, 0x50, 0x30]);
        assert_eq!(&cmd[8..], b"TICKET:ABC123XY");
    }

    #[test]
    fn test_print() {
        assert_eq!(
            qr::print(),
            vec![0x1D, 0x28, 0x6B, 0x03, 0x00, 0x31, 0x51, 0x30]
        );
    }

    #[test]
    fn test_generate_ends_with_print() {
        let cmd = qr::generate(b"X", 4, QrErrorLevel::L);
        assert!(cmd.ends_with(&qr::print()));
        assert!(cmd.starts_with(&qr::set_model2()));
    }

    #[test]
    fn test_module_size_for_short_payload() {
        // Version 1 at level L is 21 modules wide: 200 / 21 = 9
        assert_eq!(qr::module_size_for(b"TICKET:ABC123XY", 200, QrErrorLevel::L), 9);
    }

    #[test]
    fn test_module_size_for_tiny_target() {
        assert_eq!(qr::module_size_for(b"TICKET:ABC123XY", 5, QrErrorLevel::L), 1);
    }
}
