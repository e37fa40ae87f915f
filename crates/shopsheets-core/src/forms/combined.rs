use serde::{Deserialize, Serialize};

use super::{required, Draft, ValidationError};
use crate::utils::round2;

/// Customer half of the combined-order form, entered before any sub-order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombinedCustomerDraft {
    pub customer_name: String,
    pub contact: String,
    pub customer_type: String,
    pub order_date: String,
    pub sessions: String,
    pub notes: String,
    pub address: String,
}

impl Draft for CombinedCustomerDraft {
    const PAGE_KEY: &'static str = "fabric_tailor";

    type Output = CombinedCustomerDraft;

    /// Required before either sub-order can be started.
    fn validate(&self) -> Result<CombinedCustomerDraft, ValidationError> {
        let customer_name = required(
            &self.customer_name,
            "customer_name",
            "Please enter customer name before adding orders",
        )?;
        let contact = required(
            &self.contact,
            "contact",
            "Please enter contact information before adding orders",
        )?;
        let order_date = required(
            &self.order_date,
            "order_date",
            "Please select order date before adding orders",
        )?;
        let customer_type = match self.customer_type.trim() {
            "" => "New".to_string(),
            other => other.to_string(),
        };

        Ok(CombinedCustomerDraft {
            customer_name,
            contact,
            customer_type,
            order_date,
            sessions: self.sessions.trim().to_string(),
            notes: self.notes.trim().to_string(),
            address: self.address.trim().to_string(),
        })
    }
}

pub fn subtotal(fabric_price: f64, tailoring_price: f64) -> f64 {
    round2(fabric_price + tailoring_price)
}

/// A combined order is only saved with both a priced fabric sub-order and a
/// priced tailoring sub-order.
pub fn check_sub_orders(fabric_price: f64, tailoring_price: f64) -> Result<(), ValidationError> {
    let has_fabric = fabric_price > 0.0;
    let has_tailoring = tailoring_price > 0.0;
    match (has_fabric, has_tailoring) {
        (true, true) => Ok(()),
        (false, false) => Err(ValidationError::new(
            "sub_orders",
            "Please add at least one order (fabric or tailoring) before saving",
        )),
        (false, true) => Err(ValidationError::new(
            "fabric_price",
            "Please add at least one fabric order and one tailoring order before saving",
        )),
        (true, false) => Err(ValidationError::new(
            "tailoring_price",
            "Please add at least one fabric order and one tailoring order before saving",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_checks_in_order() {
        let mut draft = CombinedCustomerDraft::default();
        assert_eq!(draft.validate().unwrap_err().field, "customer_name");
        draft.customer_name = "Meera".to_string();
        assert_eq!(draft.validate().unwrap_err().field, "contact");
        draft.contact = "9845012345".to_string();
        assert_eq!(
            draft.validate().unwrap_err().message,
            "Please select order date before adding orders"
        );
        draft.order_date = "2025-03-14".to_string();
        assert_eq!(draft.validate().unwrap().customer_type, "New");
    }

    #[test]
    fn test_fabric_only_is_rejected() {
        let err = check_sub_orders(1500.0, 0.0).unwrap_err();
        assert!(err.message.starts_with("Please add at least one"));
        assert_eq!(err.field, "tailoring_price");
    }

    #[test]
    fn test_nothing_added_is_rejected() {
        let err = check_sub_orders(0.0, 0.0).unwrap_err();
        assert_eq!(
            err.message,
            "Please add at least one order (fabric or tailoring) before saving"
        );
    }

    #[test]
    fn test_both_priced_passes() {
        assert!(check_sub_orders(1500.0, 900.0).is_ok());
        assert_eq!(subtotal(1500.25, 900.5), 2400.75);
    }
}
