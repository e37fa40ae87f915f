use serde::{Deserialize, Serialize};

use super::cell::{de_amount, de_text};

/// Piece rate paid per painted garment.
pub const PAINT_RATE: f64 = 110.0;

/// Piece rate paid per shirt.
pub const SHIRT_RATE: f64 = 65.0;

/// A worker row as returned by the worker-list script (sheet header keys).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worker {
    #[serde(rename = "Name", deserialize_with = "de_text", default)]
    pub name: String,
    #[serde(rename = "Phone", deserialize_with = "de_text", default)]
    pub phone: String,
    #[serde(rename = "Address", deserialize_with = "de_text", default)]
    pub address: String,
    #[serde(rename = "Date Added", deserialize_with = "de_text", default)]
    pub date_added: String,
}

impl Worker {
    /// Case-insensitive match on name or address, plain match on phone.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&term)
            || self.phone.contains(&term)
            || self.address.to_lowercase().contains(&term)
    }
}

/// Outbound body for `addWorker`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewWorker {
    pub name: String,
    pub phone: String,
    pub address: String,
}

/// Piece-work amounts derived from a payment entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PaymentAmounts {
    pub paint_amount: f64,
    pub shirt_amount: f64,
    pub total_amount: f64,
    pub remaining_amount: f64,
}

impl PaymentAmounts {
    pub fn compute(paint_count: u32, shirt_count: u32, advance_taken: f64) -> Self {
        let paint_amount = paint_count as f64 * PAINT_RATE;
        let shirt_amount = shirt_count as f64 * SHIRT_RATE;
        let total_amount = paint_amount + shirt_amount;
        Self {
            paint_amount,
            shirt_amount,
            total_amount,
            remaining_amount: total_amount - advance_taken,
        }
    }
}

/// Outbound body for `addPayment`. The worker name is not checked against
/// the worker list; the sheet stores whatever string is sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentEntry {
    pub worker_name: String,
    pub paint_count: u32,
    pub shirt_count: u32,
    pub advance_taken: f64,
    #[serde(default)]
    pub notes: String,
}

impl PaymentEntry {
    pub fn amounts(&self) -> PaymentAmounts {
        PaymentAmounts::compute(self.paint_count, self.shirt_count, self.advance_taken)
    }
}

/// A row of the payment history sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    #[serde(rename = "Date", deserialize_with = "de_text", default)]
    pub date: String,
    #[serde(rename = "Worker Name", deserialize_with = "de_text", default)]
    pub worker_name: String,
    #[serde(rename = "Paint Count", deserialize_with = "de_amount", default)]
    pub paint_count: f64,
    #[serde(rename = "Shirt Count", deserialize_with = "de_amount", default)]
    pub shirt_count: f64,
    #[serde(rename = "Total Work Amount", deserialize_with = "de_amount", default)]
    pub total_work_amount: f64,
    #[serde(rename = "Advance Taken", deserialize_with = "de_amount", default)]
    pub advance_taken: f64,
    #[serde(rename = "Remaining Payment", deserialize_with = "de_amount", default)]
    pub remaining_payment: f64,
    #[serde(rename = "Notes", deserialize_with = "de_text", default)]
    pub notes: String,
}
