//! # Code Page 437 Encoding
//!
//! Ticket fields are typed on a phone and may contain accented names
//! ("Nakaweesi Zoë") or the degree sign in temperatures. ESC/POS printers
//! interpret text bytes through their active code table, so text is encoded
//! to PC437 (selected with `ESC t 0`) rather than sent as UTF-8.
//!
//! ASCII passes through unchanged; characters outside PC437 become `?`.

/// PC437 upper half, indexed by `byte - 0x80`.
const UPPER_HALF: [char; 128] = [
    'Ç', 'ü', 'é', 'â', 'ä', 'à', 'å', 'ç', 'ê', 'ë', 'è', 'ï', 'î', 'ì', 'Ä', 'Å', //
    'É', 'æ', 'Æ', 'ô', 'ö', 'ò', 'û', 'ù', 'ÿ', 'Ö', 'Ü', '¢', '£', '¥', '₧', 'ƒ', //
    'á', 'í', 'ó', 'ú', 'ñ', 'Ñ', 'ª', 'º', '¿', '⌐', '¬', '½', '¼', '¡', '«', '»', //
    '░', '▒', '▓', '│', '┤', '╡', '╢', '╖', '╕', '╣', '║', '╗', '╝', '╜', '╛', '┐', //
    '└', '┴', '┬', '├', '─', '┼', '╞', '╟', '╚', '╔', '╩', '╦', '╠', '═', '╬', '╧', //
    '╨', '╤', '╥', '╙', '╘', '╒', '╓', '╫', '╪', '┘', '┌', '█', '▄', '▌', '▐', '▀', //
    'α', 'ß', 'Γ', 'π', 'Σ', 'σ', 'µ', 'τ', 'Φ', 'Θ', 'Ω', 'δ', '∞', 'φ', 'ε', '∩', //
    '≡', '±', '≥', '≤', '⌠', '⌡', '÷', '≈', '°', '∙', '·', '√', 'ⁿ', '²', '■', '\u{00A0}',
];

/// Encode a Unicode string as PC437 bytes.
pub fn encode(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len());
    for ch in s.chars() {
        if ch.is_ascii() {
            out.push(ch as u8);
        } else if let Some(idx) = UPPER_HALF.iter().position(|&c| c == ch) {
            out.push(0x80 + idx as u8);
        } else {
            tracing::warn!(character = %ch, "no PC437 mapping, printing '?'");
            out.push(b'?');
        }
    }
    out
}

/// Decode PC437 bytes back to a `String`.
pub fn decode(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| {
            if b < 0x80 {
                b as char
            } else {
                UPPER_HALF[(b - 0x80) as usize]
            }
        })
        .collect()
}
