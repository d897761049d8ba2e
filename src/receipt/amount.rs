//! Amount grouping: a comma every three digits from the right.
//!
//! ```
//! use ticket_printer::receipt::amount::{format_amount, group_amount};
//!
//! assert_eq!(format_amount(125000), "125,000");
//! assert_eq!(group_amount("15000.50"), "15,000.50");
//! ```

pub fn format_amount(amount: u64) -> String {
    group_digits(&amount.to_string())
}

/// Group an amount given as text.
///
/// The integer part is grouped, a fractional part is kept as is, and
/// anything that is not a plain number comes back unchanged.
pub fn group_amount(raw: &str) -> String {
    let trimmed = raw.trim();
    let (sign, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", trimmed),
    };
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (unsigned, None),
    };

    let is_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !is_digits(integer) || fraction.is_some_and(|f| !is_digits(f)) {
        return raw.to_string();
    }

    match fraction {
        Some(fraction) => format!("{}{}.{}", sign, group_digits(integer), fraction),
        None => format!("{}{}", sign, group_digits(integer)),
    }
}

fn group_digits(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
