//! # Tickets
//!
//! The ticket record produced by the booking form, as JSON:
//!
//! ```json
//! {
//!   "clientName": "Jane Doe",
//!   "phoneNumber": "0772000000",
//!   "from": "Kampala",
//!   "to": { "name": "Mbarara" },
//!   "amountPaid": 15000,
//!   "paymentStatus": { "name": "Cash" },
//!   "temperature": "36.5",
//!   "numberPlatePrefix": "UBX",
//!   "numberPlatePostfix": "123A",
//!   "ticketId": "ABC123XY",
//!   "confirmationCode": "K3J9QX2A",
//!   "printedBy": "John Staff",
//!   "date": "17-10-2026 9:05"
//! }
//! ```
//!
//! Route endpoints may be plain strings or `{ "name": ... }` objects, and
//! numeric fields may be strings or numbers. Missing fields deserialize as
//! empty and print as a placeholder.

use chrono::{Datelike, Local, NaiveDateTime, Timelike};
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

const BASE36: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentStatus {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Ticket {
    #[serde(deserialize_with = "lenient_text")]
    pub client_name: String,
    #[serde(deserialize_with = "lenient_text")]
    pub phone_number: String,
    #[serde(deserialize_with = "lenient_text")]
    pub from: String,
    #[serde(deserialize_with = "lenient_text")]
    pub to: String,
    #[serde(deserialize_with = "lenient_text")]
    pub amount_paid: String,
    pub payment_status: Option<PaymentStatus>,
    #[serde(deserialize_with = "lenient_text")]
    pub temperature: String,
    #[serde(deserialize_with = "lenient_text")]
    pub number_plate_prefix: String,
    #[serde(deserialize_with = "lenient_text")]
    pub number_plate_postfix: String,
    #[serde(deserialize_with = "lenient_text")]
    pub ticket_id: String,
    #[serde(alias = "code", deserialize_with = "lenient_text")]
    pub confirmation_code: String,
    #[serde(deserialize_with = "lenient_text")]
    pub printed_by: String,
    /// Issue timestamp, printed as the travel date.
    #[serde(alias = "travelDate", deserialize_with = "lenient_text")]
    pub date: String,
}

/// Accept a string, a number, a `{ "name": .. }` object or null.
fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Object(map) => match map.get("name") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        },
        Value::Null | Value::Array(_) => String::new(),
    })
}

impl Ticket {
    /// The payment status name, if one was given.
    pub fn status_name(&self) -> Option<&str> {
        self.payment_status
            .as_ref()
            .and_then(|s| s.name.as_deref())
            .filter(|s| !s.trim().is_empty())
    }

    /// Names of the fields the form should have filled but did not.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let fields = [
            ("clientName", &self.client_name),
            ("phoneNumber", &self.phone_number),
            ("from", &self.from),
            ("to", &self.to),
            ("amountPaid", &self.amount_paid),
            ("temperature", &self.temperature),
            ("numberPlatePrefix", &self.number_plate_prefix),
            ("numberPlatePostfix", &self.number_plate_postfix),
            ("ticketId", &self.ticket_id),
            ("confirmationCode", &self.confirmation_code),
            ("printedBy", &self.printed_by),
            ("date", &self.date),
        ];
        let mut missing: Vec<&'static str> = fields
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();
        if self.status_name().is_none() {
            missing.push("paymentStatus");
        }
        missing
    }

    /// Fill in the generated fields (ticket id, confirmation code, date)
    /// that are still empty.
    pub fn fill_generated<R: Rng + ?Sized>(&mut self, clock: &dyn Clock, rng: &mut R) {
        if self.ticket_id.trim().is_empty() {
            self.ticket_id = generate_ticket_id(rng);
        }
        if self.confirmation_code.trim().is_empty() {
            self.confirmation_code = generate_confirmation_code(rng);
        }
        if self.date.trim().is_empty() {
            self.date = format_timestamp(clock.now());
        }
    }
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Local wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock stopped at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

fn base36<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect()
}

/// `TKT-` followed by six base-36 characters.
pub fn generate_ticket_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("TKT-{}", base36(rng, 6))
}

/// Eight base-36 characters.
pub fn generate_confirmation_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    base36(rng, 8)
}

/// `d-m-YYYY H:MM`, without zero padding on day, month and hour.
pub fn format_timestamp(at: NaiveDateTime) -> String {
    format!(
        "{}-{}-{} {}:{:02}",
        at.day(),
        at.month(),
        at.year(),
        at.hour(),
        at.minute()
    )
}
