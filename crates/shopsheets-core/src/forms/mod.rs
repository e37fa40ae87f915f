//! Form drafts: raw user input, derived totals and validation.
//!
//! A draft is what the user has typed so far. Numbers may be missing and
//! text untrimmed. `validate()` turns a draft into the model the API client
//! sends, or names the first field that blocks submission. Nothing here
//! touches the network.
//!
//! Drafts are autosaved to the session store under `autosave_<page key>`
//! and cleared after a successful submit.

pub mod combined;
pub mod expense;
pub mod fabric;
pub mod payment;
pub mod tailor;
pub mod worker;

use anyhow::Result;
use chrono::{Local, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::store::{AutosaveSnapshot, SessionStore};

pub use combined::{check_sub_orders, CombinedCustomerDraft};
pub use expense::{FabricExpenseDraft, OtherExpenseDraft};
pub use fabric::{FabricItemDraft, FabricOrderDraft};
pub use payment::PaymentDraft;
pub use tailor::{GarmentDraft, TailorOrderDraft};
pub use worker::WorkerDraft;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// A form whose input can be autosaved and validated into `Output`.
pub trait Draft: Serialize + DeserializeOwned {
    /// Autosave key suffix, one per form page.
    const PAGE_KEY: &'static str;

    type Output;

    fn validate(&self) -> Result<Self::Output, ValidationError>;

    fn autosave(&self, store: &mut SessionStore) -> Result<()> {
        store.save_draft(Self::PAGE_KEY, self)
    }

    fn restore(store: &mut SessionStore) -> Option<AutosaveSnapshot<Self>> {
        store.restore_draft(Self::PAGE_KEY)
    }

    fn clear_autosave(store: &mut SessionStore) -> Result<()> {
        store.clear_draft(Self::PAGE_KEY)
    }
}

/// Trimmed value, or the error when blank.
fn required(value: &str, field: &'static str, message: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::new(field, message))
    } else {
        Ok(trimmed.to_string())
    }
}

fn or_today(date: &str) -> String {
    let date = date.trim();
    if date.is_empty() {
        today()
    } else {
        date.to_string()
    }
}

pub fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339()
}

/// `<prefix><unix millis>`, used when an order is not part of a combined order.
pub fn fallback_order_id(prefix: &str) -> String {
    format!("{}{}", prefix, Utc::now().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_required_trims() {
        assert_eq!(required("  Asha ", "name", "x").unwrap(), "Asha");
        let err = required("   ", "name", "Name is required").unwrap_err();
        assert_eq!(err.field, "name");
        assert_eq!(err.to_string(), "Name is required");
    }

    #[test]
    fn test_fallback_ids() {
        let fabric = fallback_order_id("F-");
        assert!(fabric.starts_with("F-"));
        assert!(fabric[2..].parse::<i64>().is_ok());
        let tailor = fallback_order_id("T");
        assert!(tailor[1..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_draft_autosave_cycle() {
        let dir = tempdir().unwrap();
        let mut store = SessionStore::open(dir.path()).unwrap();
        let draft = WorkerDraft {
            name: "Ravi".to_string(),
            phone: String::new(),
            address: String::new(),
        };
        draft.autosave(&mut store).unwrap();
        assert!(store.contains("autosave_add_worker"));

        let restored = WorkerDraft::restore(&mut store).unwrap();
        assert_eq!(restored.data, draft);

        WorkerDraft::clear_autosave(&mut store).unwrap();
        assert!(WorkerDraft::restore(&mut store).is_none());
    }
}
