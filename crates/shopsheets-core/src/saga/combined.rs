use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use super::ids::LinkedIds;
use crate::api::SaveOutcome;
use crate::forms::{check_sub_orders, timestamp_now, CombinedCustomerDraft, Draft, ValidationError};
use crate::models::{CombinedOrder, PaymentStatus};
use crate::store::{keys, SessionStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SagaState {
    Started,
    FabricPending,
    TailorPending,
    ReadyToSave,
    Saved,
}

impl fmt::Display for SagaState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SagaState::Started => "started",
            SagaState::FabricPending => "waiting for the fabric order",
            SagaState::TailorPending => "waiting for the tailoring order",
            SagaState::ReadyToSave => "ready to save",
            SagaState::Saved => "saved",
        };
        f.write_str(s)
    }
}

#[derive(Error, Debug)]
pub enum SagaError {
    #[error("cannot {action} while the combined order is {from}")]
    InvalidTransition { from: SagaState, action: &'static str },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to persist combined order state: {0}")]
    Store(#[from] anyhow::Error),
}

/// A sub-order that has been written to its own sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubOrder {
    pub order_id: String,
    pub price: f64,
}

/// Handed to the fabric or tailoring form so the sub-order carries the
/// linked id and the customer details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubOrderLink {
    pub master_id: String,
    pub expected_id: String,
    pub customer: CombinedCustomerDraft,
}

/// Record written under `tailor_order_data` when a tailoring order returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct TailorReturn {
    order_id: String,
    price: f64,
    master_order_id: String,
}

/// Everything persisted under `combinedOrderData`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SagaData {
    pub state: SagaState,
    pub master_order_id: String,
    pub customer: CombinedCustomerDraft,
    pub fabric: Option<SubOrder>,
    pub tailoring: Option<SubOrder>,
    pub started_at: DateTime<Utc>,
}

/// The combined-order flow: customer details first, then a fabric order and a
/// tailoring order (in either order), then one combined row linking both.
///
/// ```text
/// Started ──begin_fabric──▶ FabricPending ──complete_fabric──▶ Started | ReadyToSave
/// Started ──begin_tailor──▶ TailorPending ──complete_tailor──▶ Started | ReadyToSave
/// ReadyToSave ──mark_saved──▶ Saved
/// FabricPending | TailorPending ──cancel_pending──▶ Started | ReadyToSave
/// ```
pub struct CombinedOrderSaga {
    store: SessionStore,
    data: SagaData,
}

impl CombinedOrderSaga {
    /// Start a combined order, or update the customer of the one in progress.
    /// An in-progress order keeps its master id and sub-orders.
    pub fn start(store: SessionStore, customer: &CombinedCustomerDraft) -> Result<Self, SagaError> {
        let customer = customer.validate()?;

        let mut saga = match Self::resume(store) {
            Ok(saga) => saga,
            Err(store) => {
                let ids = LinkedIds::generate();
                info!(master_order_id = %ids.master, "Starting combined order");
                Self {
                    store,
                    data: SagaData {
                        state: SagaState::Started,
                        master_order_id: ids.master,
                        customer: customer.clone(),
                        fabric: None,
                        tailoring: None,
                        started_at: Utc::now(),
                    },
                }
            }
        };
        saga.data.customer = customer;
        if !saga.data.customer.address.is_empty() {
            saga.store
                .set(keys::COMBINED_ORDER_ADDRESS, &saga.data.customer.address)?;
        }
        saga.persist()?;
        Ok(saga)
    }

    /// The combined order in progress, or the store back when there is none.
    pub fn resume(store: SessionStore) -> Result<Self, SessionStore> {
        match store.get::<SagaData>(keys::COMBINED_ORDER_DATA) {
            Some(data) if data.state != SagaState::Saved => Ok(Self { store, data }),
            _ => Err(store),
        }
    }

    pub fn into_store(self) -> SessionStore {
        self.store
    }

    /// The session store, for autosaving the sub-order draft alongside.
    pub fn store_mut(&mut self) -> &mut SessionStore {
        &mut self.store
    }

    pub fn state(&self) -> SagaState {
        self.data.state
    }

    pub fn data(&self) -> &SagaData {
        &self.data
    }

    pub fn linked_ids(&self) -> LinkedIds {
        LinkedIds::from_master(&self.data.master_order_id)
    }

    pub fn fabric_price(&self) -> f64 {
        self.data.fabric.as_ref().map(|f| f.price).unwrap_or(0.0)
    }

    pub fn tailoring_price(&self) -> f64 {
        self.data.tailoring.as_ref().map(|t| t.price).unwrap_or(0.0)
    }

    pub fn subtotal(&self) -> f64 {
        crate::forms::combined::subtotal(self.fabric_price(), self.tailoring_price())
    }

    fn persist(&mut self) -> Result<(), SagaError> {
        self.store.set(keys::COMBINED_ORDER_DATA, &self.data)?;
        Ok(())
    }

    fn require(&self, allowed: &[SagaState], action: &'static str) -> Result<(), SagaError> {
        if allowed.contains(&self.data.state) {
            Ok(())
        } else {
            Err(SagaError::InvalidTransition {
                from: self.data.state,
                action,
            })
        }
    }

    fn after_sub_order(&self) -> SagaState {
        if self.fabric_price() > 0.0 && self.tailoring_price() > 0.0 {
            SagaState::ReadyToSave
        } else {
            SagaState::Started
        }
    }

    fn link(&self, expected_id: String) -> SubOrderLink {
        SubOrderLink {
            master_id: self.data.master_order_id.clone(),
            expected_id,
            customer: self.data.customer.clone(),
        }
    }

    // ===== Fabric =====

    /// The link a fabric draft is prefilled from. Does not change state.
    pub fn fabric_link(&self) -> Result<SubOrderLink, SagaError> {
        self.require(
            &[SagaState::Started, SagaState::FabricPending, SagaState::ReadyToSave],
            "add a fabric order",
        )?;
        Ok(self.link(self.linked_ids().fabric))
    }

    pub fn begin_fabric(&mut self) -> Result<SubOrderLink, SagaError> {
        let link = self.fabric_link()?;
        let ids = self.linked_ids();
        self.store.set(keys::MASTER_ORDER_ID, &ids.master)?;
        self.store.set(keys::EXPECTED_FABRIC_ID, &ids.fabric)?;
        self.data.state = SagaState::FabricPending;
        self.persist()?;
        Ok(link)
    }

    /// Record the fabric order once it is saved. `order_id` defaults to the linked id.
    pub fn complete_fabric(&mut self, price: f64, order_id: Option<String>) -> Result<(), SagaError> {
        self.require(&[SagaState::FabricPending], "record a fabric order")?;
        let order_id = order_id.unwrap_or_else(|| self.linked_ids().fabric);
        info!(%order_id, price, "Fabric order linked");

        self.data.fabric = Some(SubOrder { order_id, price });
        self.store
            .remove_all(&[keys::MASTER_ORDER_ID, keys::EXPECTED_FABRIC_ID])?;
        self.data.state = self.after_sub_order();
        self.persist()
    }

    // ===== Tailoring =====

    /// The link a tailoring draft is prefilled from. Does not change state.
    pub fn tailor_link(&self) -> Result<SubOrderLink, SagaError> {
        self.require(
            &[SagaState::Started, SagaState::TailorPending, SagaState::ReadyToSave],
            "add a tailoring order",
        )?;
        Ok(self.link(self.linked_ids().tailor))
    }

    pub fn begin_tailor(&mut self) -> Result<SubOrderLink, SagaError> {
        let link = self.tailor_link()?;
        let ids = self.linked_ids();
        self.store.set(keys::MASTER_ORDER_ID, &ids.master)?;
        self.store.set(keys::EXPECTED_TAILOR_ID, &ids.tailor)?;
        self.data.state = SagaState::TailorPending;
        self.persist()?;
        Ok(link)
    }

    /// Record the tailoring order once it is saved. A missing price is
    /// recorded as 0 and must be entered before the combined order can save.
    pub fn complete_tailor(&mut self, price: Option<f64>, order_id: Option<String>) -> Result<(), SagaError> {
        self.require(&[SagaState::TailorPending], "record a tailoring order")?;
        let order_id = order_id.unwrap_or_else(|| self.linked_ids().tailor);
        let price = match price {
            Some(price) => price,
            None => {
                warn!(%order_id, "Tailoring order returned without a price, recording 0");
                0.0
            }
        };
        info!(%order_id, price, "Tailoring order linked");

        self.store.set(
            keys::TAILOR_ORDER_DATA,
            &TailorReturn {
                order_id: order_id.clone(),
                price,
                master_order_id: self.data.master_order_id.clone(),
            },
        )?;
        self.data.tailoring = Some(SubOrder { order_id, price });
        self.store
            .remove_all(&[keys::MASTER_ORDER_ID, keys::EXPECTED_TAILOR_ID])?;
        self.data.state = self.after_sub_order();
        self.persist()
    }

    /// Back out of a sub-order whose submission failed. Sub-orders already
    /// recorded are kept.
    pub fn cancel_pending(&mut self) -> Result<(), SagaError> {
        self.require(
            &[SagaState::FabricPending, SagaState::TailorPending],
            "cancel a pending sub-order",
        )?;
        warn!(from = %self.data.state, "Pending sub-order cancelled");
        self.store.remove_all(&[
            keys::MASTER_ORDER_ID,
            keys::EXPECTED_FABRIC_ID,
            keys::EXPECTED_TAILOR_ID,
        ])?;
        self.data.state = self.after_sub_order();
        self.persist()
    }

    // ===== Save =====

    /// The combined row to submit. Rejected unless both sub-orders are priced.
    pub fn payload(&self, paid_status: PaymentStatus) -> Result<CombinedOrder, SagaError> {
        let fabric_price = self.fabric_price();
        let tailoring_price = self.tailoring_price();
        check_sub_orders(fabric_price, tailoring_price)?;
        self.require(&[SagaState::ReadyToSave], "save the combined order")?;

        let ids = self.linked_ids();
        let customer = &self.data.customer;
        let address = self
            .store
            .get::<String>(keys::COMBINED_ORDER_ADDRESS)
            .unwrap_or_else(|| customer.address.clone());

        Ok(CombinedOrder {
            customer_name: customer.customer_name.clone(),
            contact: customer.contact.clone(),
            customer_type: customer.customer_type.clone(),
            order_date: customer.order_date.clone(),
            sessions: customer.sessions.clone(),
            notes: customer.notes.clone(),
            address,
            fabric_order_id: self
                .data
                .fabric
                .as_ref()
                .map(|f| f.order_id.clone())
                .filter(|id| !id.is_empty())
                .unwrap_or(ids.fabric),
            fabric_price,
            tailoring_order_id: self
                .data
                .tailoring
                .as_ref()
                .map(|t| t.order_id.clone())
                .filter(|id| !id.is_empty())
                .unwrap_or(ids.tailor),
            tailoring_price,
            total_amount: self.subtotal(),
            paid_status,
            combined_order_id: ids.combined,
            master_order_id: ids.master,
            timestamp: timestamp_now(),
        })
    }

    /// Close the saga after the combined row is written. Returns the combined
    /// id, preferring the one echoed by the script.
    pub fn mark_saved(&mut self, outcome: &SaveOutcome) -> Result<String, SagaError> {
        self.require(&[SagaState::ReadyToSave], "mark the combined order saved")?;
        let combined_id = outcome
            .reply()
            .and_then(|r| r.extra_str("combinedId"))
            .map(str::to_string)
            .unwrap_or_else(|| self.linked_ids().combined);

        self.data.state = SagaState::Saved;
        self.clear_keys()?;
        info!(%combined_id, master_order_id = %self.data.master_order_id, "Combined order saved");
        Ok(combined_id)
    }

    /// Sub-orders already written to their sheets but not linked by a combined row.
    pub fn orphaned_sub_orders(&self) -> Vec<SubOrder> {
        if self.data.state == SagaState::Saved {
            return Vec::new();
        }
        self.data
            .fabric
            .iter()
            .chain(self.data.tailoring.iter())
            .cloned()
            .collect()
    }

    /// Drop the combined order. Sub-orders already saved stay in their sheets
    /// and are returned so they can be reported.
    pub fn abandon(mut self) -> Result<(Vec<SubOrder>, SessionStore), SagaError> {
        let orphans = self.orphaned_sub_orders();
        for orphan in &orphans {
            warn!(order_id = %orphan.order_id, "Combined order abandoned, sub-order left unlinked");
        }
        self.clear_keys()?;
        Ok((orphans, self.store))
    }

    fn clear_keys(&mut self) -> Result<(), SagaError> {
        self.store.remove_all(&[
            keys::COMBINED_ORDER_DATA,
            keys::COMBINED_ORDER_ADDRESS,
            keys::MASTER_ORDER_ID,
            keys::EXPECTED_FABRIC_ID,
            keys::EXPECTED_TAILOR_ID,
            keys::TAILOR_ORDER_DATA,
        ])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ScriptReply;
    use tempfile::{tempdir, TempDir};

    fn customer() -> CombinedCustomerDraft {
        CombinedCustomerDraft {
            customer_name: "Meera".to_string(),
            contact: "9845012345".to_string(),
            customer_type: "Regular".to_string(),
            order_date: "2025-03-14".to_string(),
            sessions: "Wedding".to_string(),
            notes: String::new(),
            address: "12, MG Road".to_string(),
        }
    }

    fn started() -> (CombinedOrderSaga, TempDir) {
        let dir = tempdir().unwrap();
        let store = SessionStore::open(dir.path()).unwrap();
        (CombinedOrderSaga::start(store, &customer()).unwrap(), dir)
    }

    #[test]
    fn test_start_requires_customer_details() {
        let dir = tempdir().unwrap();
        let store = SessionStore::open(dir.path()).unwrap();
        let mut incomplete = customer();
        incomplete.contact = String::new();
        let err = CombinedOrderSaga::start(store, &incomplete).err().unwrap();
        assert!(matches!(err, SagaError::Validation(v) if v.field == "contact"));
    }

    #[test]
    fn test_full_flow_builds_linked_payload() {
        let (mut saga, _dir) = started();
        let master = saga.data().master_order_id.clone();

        let link = saga.begin_fabric().unwrap();
        assert_eq!(link.expected_id, format!("F-{}", master));
        assert_eq!(saga.state(), SagaState::FabricPending);
        saga.complete_fabric(1250.5, None).unwrap();
        assert_eq!(saga.state(), SagaState::Started);

        let link = saga.begin_tailor().unwrap();
        assert_eq!(link.customer.customer_name, "Meera");
        saga.complete_tailor(Some(900.0), None).unwrap();
        assert_eq!(saga.state(), SagaState::ReadyToSave);

        let payload = saga.payload(PaymentStatus::Partial).unwrap();
        assert_eq!(payload.master_order_id, master);
        assert_eq!(payload.fabric_order_id, format!("F-{}", master));
        assert_eq!(payload.tailoring_order_id, format!("T-{}", master));
        assert_eq!(payload.combined_order_id, format!("C-{}", master));
        assert_eq!(payload.total_amount, 2150.5);
        assert_eq!(payload.address, "12, MG Road");
    }

    #[test]
    fn test_fabric_only_cannot_be_saved() {
        let (mut saga, _dir) = started();
        saga.begin_fabric().unwrap();
        saga.complete_fabric(1500.0, Some("F-manual".to_string())).unwrap();

        let err = saga.payload(PaymentStatus::Unpaid).unwrap_err();
        assert!(matches!(
            err,
            SagaError::Validation(ref v) if v.message == "Please add at least one fabric order and one tailoring order before saving"
        ));
    }

    #[test]
    fn test_nothing_added_cannot_be_saved() {
        let (saga, _dir) = started();
        let err = saga.payload(PaymentStatus::Unpaid).unwrap_err();
        assert!(matches!(
            err,
            SagaError::Validation(ref v) if v.message == "Please add at least one order (fabric or tailoring) before saving"
        ));
    }

    #[test]
    fn test_missing_tailor_price_recorded_as_zero() {
        let (mut saga, _dir) = started();
        saga.begin_fabric().unwrap();
        saga.complete_fabric(800.0, None).unwrap();
        saga.begin_tailor().unwrap();
        saga.complete_tailor(None, Some("T-CMB-manual".to_string())).unwrap();

        assert_eq!(saga.tailoring_price(), 0.0);
        assert_eq!(saga.state(), SagaState::Started);
        assert!(saga.payload(PaymentStatus::Paid).is_err());
    }

    #[test]
    fn test_invalid_transitions() {
        let (mut saga, _dir) = started();
        let err = saga.complete_fabric(100.0, None).unwrap_err();
        assert!(matches!(
            err,
            SagaError::InvalidTransition { from: SagaState::Started, .. }
        ));

        saga.begin_tailor().unwrap();
        assert!(matches!(
            saga.begin_fabric().unwrap_err(),
            SagaError::InvalidTransition { from: SagaState::TailorPending, .. }
        ));
    }

    #[test]
    fn test_failed_resubmit_returns_to_ready() {
        let (mut saga, dir) = started();
        saga.begin_fabric().unwrap();
        saga.complete_fabric(500.0, None).unwrap();
        saga.begin_tailor().unwrap();
        saga.complete_tailor(Some(700.0), None).unwrap();

        // Replacing the fabric order, but the submission fails
        saga.begin_fabric().unwrap();
        assert_eq!(saga.state(), SagaState::FabricPending);
        saga.cancel_pending().unwrap();

        assert_eq!(saga.state(), SagaState::ReadyToSave);
        assert_eq!(saga.fabric_price(), 500.0);
        assert!(saga.payload(PaymentStatus::Paid).is_ok());
        let store = SessionStore::open(dir.path()).unwrap();
        assert!(!store.contains(keys::EXPECTED_FABRIC_ID));
        assert!(!store.contains(keys::MASTER_ORDER_ID));
    }

    #[test]
    fn test_links_do_not_change_state() {
        let (saga, _dir) = started();
        let link = saga.fabric_link().unwrap();
        assert_eq!(link.expected_id, saga.linked_ids().fabric);
        assert_eq!(saga.tailor_link().unwrap().expected_id, saga.linked_ids().tailor);
        assert_eq!(saga.state(), SagaState::Started);

        let (mut saga, _dir) = started();
        assert!(saga.cancel_pending().is_err());
    }

    #[test]
    fn test_transitions_persist_and_resume() {
        let dir = tempdir().unwrap();
        let store = SessionStore::open(dir.path()).unwrap();
        let mut saga = CombinedOrderSaga::start(store, &customer()).unwrap();
        let master = saga.data().master_order_id.clone();
        saga.begin_tailor().unwrap();
        drop(saga);

        let store = SessionStore::open(dir.path()).unwrap();
        assert_eq!(
            store.get::<String>(keys::EXPECTED_TAILOR_ID),
            Some(format!("T-{}", master))
        );
        let resumed = CombinedOrderSaga::resume(store).ok().unwrap();
        assert_eq!(resumed.state(), SagaState::TailorPending);

        // Starting again keeps the master id
        let again = CombinedOrderSaga::start(resumed.into_store(), &customer()).unwrap();
        assert_eq!(again.data().master_order_id, master);
    }

    #[test]
    fn test_mark_saved_clears_store() {
        let (mut saga, dir) = started();
        saga.begin_fabric().unwrap();
        saga.complete_fabric(500.0, None).unwrap();
        saga.begin_tailor().unwrap();
        saga.complete_tailor(Some(700.0), None).unwrap();

        let mut reply = ScriptReply::default();
        reply.success = Some(true);
        reply
            .extra
            .insert("combinedId".to_string(), serde_json::json!("C-FROM-SCRIPT"));
        let combined_id = saga.mark_saved(&SaveOutcome::Saved(reply)).unwrap();
        assert_eq!(combined_id, "C-FROM-SCRIPT");
        assert_eq!(saga.state(), SagaState::Saved);
        assert!(saga.orphaned_sub_orders().is_empty());

        let store = SessionStore::open(dir.path()).unwrap();
        assert!(!store.contains(keys::COMBINED_ORDER_DATA));
        assert!(!store.contains(keys::COMBINED_ORDER_ADDRESS));
        assert!(CombinedOrderSaga::resume(store).is_err());
    }

    #[test]
    fn test_abandon_reports_orphans() {
        let (mut saga, _dir) = started();
        saga.begin_fabric().unwrap();
        saga.complete_fabric(650.0, None).unwrap();
        let expected = saga.linked_ids().fabric;

        let (orphans, store) = saga.abandon().unwrap();
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].order_id, expected);
        assert!(!store.contains(keys::COMBINED_ORDER_DATA));
    }
}
