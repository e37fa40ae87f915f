use serde::{Deserialize, Serialize};

use super::{required, Draft, ValidationError};
use crate::models::{PaymentAmounts, PaymentEntry};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentDraft {
    pub worker_name: String,
    pub paint_count: Option<u32>,
    pub shirt_count: Option<u32>,
    pub advance_taken: Option<f64>,
    pub notes: String,
}

impl PaymentDraft {
    /// Live amounts shown while the counts are being entered.
    pub fn amounts(&self) -> PaymentAmounts {
        PaymentAmounts::compute(
            self.paint_count.unwrap_or(0),
            self.shirt_count.unwrap_or(0),
            self.advance_taken.unwrap_or(0.0),
        )
    }
}

impl Draft for PaymentDraft {
    const PAGE_KEY: &'static str = "add_payment";

    type Output = PaymentEntry;

    fn validate(&self) -> Result<PaymentEntry, ValidationError> {
        let worker_name = required(&self.worker_name, "worker_name", "Please select a worker.")?;
        let paint_count = self.paint_count.unwrap_or(0);
        let shirt_count = self.shirt_count.unwrap_or(0);
        if paint_count == 0 && shirt_count == 0 {
            return Err(ValidationError::new(
                "paint_count",
                "Please enter at least one paint or shirt count.",
            ));
        }
        Ok(PaymentEntry {
            worker_name,
            paint_count,
            shirt_count,
            advance_taken: self.advance_taken.unwrap_or(0.0),
            notes: self.notes.trim().to_string(),
        })
    }
}
