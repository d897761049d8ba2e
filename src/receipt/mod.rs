//! # Receipt Formatter
//!
//! Turns a [`Ticket`] into the printed bus ticket:
//!
//! ```text
//!    RUKUNDO EGUMEHO TRANSPORTERS      (double height, bold)
//!
//!  +256 762076555 | +256 772169814
//!         Kagadi Taxi Park
//!          Plot 63 Kagadi
//!
//!            UBX 123A                  (double size)
//! --------------------------------
//! Client Name: Jane Doe
//! Ticket ID  : ABC123XY
//! ...
//! --------------------------------
//!          Code: K3J9QX2A
//!        Paid: UGX 15,000
//!  Visit link below to review ...
//!          [ QR TICKET:id ]
//! ```
//!
//! Rendering is pure: the same ticket always produces the same commands.

pub mod amount;
pub mod preview;

use serde::Deserialize;

use crate::ir::{Command, Program, QrBlock, TextBlock};
use crate::printer::PrinterConfig;
use crate::protocol::barcode::qr::QrErrorLevel;
use crate::protocol::text::Alignment;
use crate::ticket::Ticket;

pub use amount::{format_amount, group_amount};

/// Printed in place of empty fields.
pub const PLACEHOLDER: &str = "N/A";

/// Width of the label column in key-value lines.
pub const LABEL_WIDTH: usize = 11;

/// Prefix of the QR payload; the ticket id follows.
pub const QR_PREFIX: &str = "TICKET:";

/// Fixed texts of the receipt.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReceiptLayout {
    pub business_name: String,
    pub contact_lines: Vec<String>,
    pub terms_notice: String,
    pub terms_url: String,
    pub thank_you: String,
    pub currency: String,
    /// Target QR width in dots
    pub qr_size_px: u32,
    /// Blank lines fed after the QR code so it clears the tear bar
    pub trailing_feed: u8,
}

impl Default for ReceiptLayout {
    fn default() -> Self {
        Self {
            business_name: "RUKUNDO EGUMEHO TRANSPORTERS".into(),
            contact_lines: vec![
                "+256 762076555 | +256 772169814".into(),
                "Kagadi Taxi Park".into(),
                "Plot 63 Kagadi".into(),
            ],
            terms_notice: "Visit link below to review Terms and Conditions".into(),
            terms_url: "www.link.co.ug/terms-of-service.php".into(),
            thank_you: "Thank you for travelling with us!".into(),
            currency: "UGX".into(),
            qr_size_px: 200,
            trailing_feed: 3,
        }
    }
}

fn or_placeholder(value: &str) -> &str {
    let value = value.trim();
    if value.is_empty() { PLACEHOLDER } else { value }
}

/// A left-aligned `Label      : value` line.
pub fn key_value(label: &str, value: &str) -> String {
    format!("{:<width$}: {}", label, or_placeholder(value), width = LABEL_WIDTH)
}

#[derive(Debug, Clone, Default)]
pub struct ReceiptFormatter {
    layout: ReceiptLayout,
    printer: PrinterConfig,
}

impl ReceiptFormatter {
    pub fn new(layout: ReceiptLayout, printer: PrinterConfig) -> Self {
        Self { layout, printer }
    }

    pub fn layout(&self) -> &ReceiptLayout {
        &self.layout
    }

    pub fn printer(&self) -> &PrinterConfig {
        &self.printer
    }

    pub fn render(&self, ticket: &Ticket) -> Program {
        let layout = &self.layout;
        let mut program = Program::with_init();

        program.push(Command::Text(
            TextBlock::new(format!("{}\n\n", layout.business_name))
                .center()
                .size(1, 2)
                .bold(),
        ));

        let contacts = layout.contact_lines.len();
        for (i, line) in layout.contact_lines.iter().enumerate() {
            let content = if i + 1 == contacts {
                format!("{}\n\n", line)
            } else {
                format!("{}\n", line)
            };
            program.push(Command::Text(TextBlock::new(content).center()));
        }

        let plate = format!(
            "{} {}",
            ticket.number_plate_prefix.trim(),
            ticket.number_plate_postfix.trim()
        );
        program.push(Command::Text(
            TextBlock::line(or_placeholder(&plate)).center().size(2, 2).bold(),
        ));

        program.push(self.separator());
        let status = ticket.status_name().unwrap_or(PLACEHOLDER);
        let details = [
            ("Client Name", ticket.client_name.as_str()),
            ("Ticket ID", ticket.ticket_id.as_str()),
            ("Phone No.", ticket.phone_number.as_str()),
            ("Temperature", ticket.temperature.as_str()),
            ("From", ticket.from.as_str()),
            ("To", ticket.to.as_str()),
            ("Status", status),
            ("Printed by", ticket.printed_by.as_str()),
            ("Travel Date", ticket.date.as_str()),
        ];
        program.extend(
            details
                .iter()
                .map(|(label, value)| Command::Text(TextBlock::line(key_value(label, value)))),
        );
        program.push(self.separator());

        program.push(Command::Text(
            TextBlock::line(format!("Code: {}", or_placeholder(&ticket.confirmation_code)))
                .center()
                .bold(),
        ));
        program.push(Command::Text(
            TextBlock::line(format!(
                "Paid: {} {}",
                layout.currency,
                or_placeholder(&group_amount(&ticket.amount_paid))
            ))
            .center()
            .bold(),
        ));

        program.push(Command::Text(TextBlock::line(&layout.terms_notice).center()));
        program.push(Command::Text(TextBlock::line(&layout.terms_url).center()));
        program.push(Command::Text(
            TextBlock::new(format!("\n{}\n", layout.thank_you)).center(),
        ));

        program.push(Command::QrCode(QrBlock {
            payload: format!("{}{}", QR_PREFIX, ticket.ticket_id.trim()),
            size_px: self.printer.fit_width(layout.qr_size_px),
            error_level: QrErrorLevel::L,
            align: Alignment::Center,
        }));
        program.push(Command::Feed {
            lines: layout.trailing_feed,
        });

        program
    }

    /// The receipt as plain text, for on-screen preview.
    pub fn preview(&self, ticket: &Ticket) -> String {
        preview::render_text(&self.render(ticket), self.printer.columns)
    }

    fn separator(&self) -> Command {
        Command::Text(TextBlock::line(self.printer.separator()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticket::PaymentStatus;
    use pretty_assertions::assert_eq;

    fn jane_doe() -> Ticket {
        Ticket {
            client_name: "Jane Doe".into(),
            ticket_id: "ABC123XY".into(),
            phone_number: "0772000000".into(),
            from: "Kampala".into(),
            to: "Mbarara".into(),
            amount_paid: "15000".into(),
            payment_status: Some(PaymentStatus {
                name: Some("Cash".into()),
            }),
            temperature: "36.5".into(),
            printed_by: "John Staff".into(),
            number_plate_prefix: "UBX".into(),
            number_plate_postfix: "123A".into(),
            confirmation_code: "K3J9QX2A".into(),
            date: "17-10-2026 9:05".into(),
        }
    }

    #[test]
    fn test_starts_with_init_ends_with_feed() {
        let program = ReceiptFormatter::default().render(&jane_doe());
        assert_eq!(program.commands.first(), Some(&Command::Init));
        assert_eq!(program.commands.last(), Some(&Command::Feed { lines: 3 }));
    }

    #[test]
    fn test_qr_payload_and_level() {
        let program = ReceiptFormatter::default().render(&jane_doe());
        let qr: Vec<&QrBlock> = program.iter().filter_map(Command::qr).collect();
        assert_eq!(qr.len(), 1);
        assert_eq!(qr[0].payload, "TICKET:ABC123XY");
        assert_eq!(qr[0].size_px, 200);
        assert_eq!(qr[0].error_level, QrErrorLevel::L);
        assert_eq!(qr[0].align, Alignment::Center);
    }

    #[test]
    fn test_amount_grouped() {
        let text = ReceiptFormatter::default().render(&jane_doe()).text_content();
        assert!(text.contains("Paid: UGX 15,000\n"));
    }

    #[test]
    fn test_key_value_lines() {
        let text = ReceiptFormatter::default().render(&jane_doe()).text_content();
        let expected = "\
--------------------------------
Client Name: Jane Doe
Ticket ID  : ABC123XY
Phone No.  : 0772000000
Temperature: 36.5
From       : Kampala
To         : Mbarara
Status     : Cash
Printed by : John Staff
Travel Date: 17-10-2026 9:05
--------------------------------
";
        assert!(text.contains(expected), "{}", text);
    }

    #[test]
    fn test_header_and_plate_styles() {
        let program = ReceiptFormatter::default().render(&jane_doe());
        let Command::Text(header) = &program.commands[1] else {
            panic!("header should be text");
        };
        assert_eq!(header.content, "RUKUNDO EGUMEHO TRANSPORTERS\n\n");
        assert_eq!(header.align, Alignment::Center);
        assert_eq!(header.height_scale, 2);

        let plate = program
            .iter()
            .filter_map(|c| match c {
                Command::Text(block) if block.content == "UBX 123A\n" => Some(block),
                _ => None,
            })
            .next()
            .unwrap();
        assert_eq!((plate.width_scale, plate.height_scale), (2, 2));
    }

    #[test]
    fn test_missing_fields_use_placeholder() {
        let ticket = Ticket {
            ticket_id: "ABC123XY".into(),
            payment_status: Some(PaymentStatus { name: None }),
            ..Ticket::default()
        };
        let text = ReceiptFormatter::default().render(&ticket).text_content();
        assert!(text.contains("Status     : N/A\n"));
        assert!(text.contains("Client Name: N/A\n"));
        assert!(text.contains("Code: N/A\n"));
        assert!(text.contains("Paid: UGX N/A\n"));
    }

    #[test]
    fn test_render_is_pure() {
        let formatter = ReceiptFormatter::default();
        assert_eq!(formatter.render(&jane_doe()), formatter.render(&jane_doe()));
    }

    #[test]
    fn test_separator_follows_paper() {
        let formatter = ReceiptFormatter::new(ReceiptLayout::default(), PrinterConfig::MM80);
        let text = formatter.render(&jane_doe()).text_content();
        assert!(text.contains(&format!("{}\n", "-".repeat(48))));
    }

    #[test]
    fn test_preview_contains_receipt_text() {
        let preview = ReceiptFormatter::default().preview(&jane_doe());
        assert!(preview.contains("Client Name: Jane Doe"));
        assert!(preview.contains("Paid: UGX 15,000"));
        assert!(preview.lines().all(|l| l.chars().count() <= 32));
    }

    #[test]
    fn test_layout_partial_override() {
        let layout: ReceiptLayout =
            serde_json::from_str(r#"{"business_name": "EXPRESS COACHES"}"#).unwrap();
        assert_eq!(layout.business_name, "EXPRESS COACHES");
        assert_eq!(layout.currency, "UGX");
    }
}
