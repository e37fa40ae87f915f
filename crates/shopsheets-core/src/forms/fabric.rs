use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{fallback_order_id, or_today, required, Draft, ValidationError};
use crate::models::{Customer, CustomerType, FabricItem, FabricOrder, PaymentStatus};
use crate::saga::SubOrderLink;
use crate::utils::round2;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FabricItemDraft {
    pub fabric_for: String,
    pub fabric_type: String,
    pub fabric_color: String,
    pub quantity_meters: Option<f64>,
    pub price_per_meter: Option<f64>,
}

impl FabricItemDraft {
    fn amount(&self) -> f64 {
        self.quantity_meters.unwrap_or(0.0) * self.price_per_meter.unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        round2(self.amount())
    }

    /// The item if every required field is filled in.
    fn complete(&self) -> Option<FabricItem> {
        let quantity = self.quantity_meters.filter(|q| *q > 0.0)?;
        let price = self.price_per_meter.filter(|p| *p > 0.0)?;
        let fabric_for = self.fabric_for.trim();
        let fabric_type = self.fabric_type.trim();
        if fabric_for.is_empty() || fabric_type.is_empty() {
            return None;
        }
        Some(FabricItem {
            fabric_for: fabric_for.to_string(),
            fabric_type: fabric_type.to_string(),
            fabric_color: self.fabric_color.trim().to_string(),
            quantity_meters: quantity,
            price_per_meter: price,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FabricOrderDraft {
    /// Set when the order belongs to a combined order.
    pub order_id: Option<String>,
    pub customer_name: String,
    pub contact_number: String,
    pub address: String,
    pub customer_type: String,
    pub purchase_date: String,
    pub payment_status: String,
    pub session: String,
    pub note: String,
    pub items: Vec<FabricItemDraft>,
}

impl FabricOrderDraft {
    /// A draft prefilled from a combined order.
    pub fn for_link(link: &SubOrderLink) -> Self {
        Self {
            order_id: Some(link.expected_id.clone()),
            customer_name: link.customer.customer_name.clone(),
            contact_number: link.customer.contact.clone(),
            address: link.customer.address.clone(),
            customer_type: link.customer.customer_type.clone(),
            purchase_date: link.customer.order_date.clone(),
            session: link.customer.sessions.clone(),
            note: link.customer.notes.clone(),
            ..Self::default()
        }
    }

    /// Running total over every item, complete or not. Rounded once, like
    /// the submitted order total.
    pub fn order_total(&self) -> f64 {
        round2(self.items.iter().map(FabricItemDraft::amount).sum())
    }
}

impl Draft for FabricOrderDraft {
    const PAGE_KEY: &'static str = "fabric_order";

    type Output = FabricOrder;

    fn validate(&self) -> Result<FabricOrder, ValidationError> {
        let name = required(&self.customer_name, "customer_name", "Please enter customer name.")?;
        let customer_type = CustomerType::from_str(&self.customer_type)
            .map_err(|_| ValidationError::new("customer_type", "Please select customer type."))?;

        let items: Vec<FabricItem> = self.items.iter().filter_map(FabricItemDraft::complete).collect();
        if items.is_empty() {
            return Err(ValidationError::new(
                "items",
                "Please add at least one complete fabric item with all required fields.",
            ));
        }

        let order_id = self
            .order_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| fallback_order_id("F-"));

        Ok(FabricOrder {
            order_id,
            customer: Customer {
                name,
                contact: self.contact_number.trim().to_string(),
                address: self.address.trim().to_string(),
                customer_type,
            },
            purchase_date: or_today(&self.purchase_date),
            payment_status: PaymentStatus::from_str(&self.payment_status).unwrap_or_default(),
            session: self.session.trim().to_string(),
            note: self.note.trim().to_string(),
            items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(fabric_for: &str, qty: Option<f64>, price: Option<f64>) -> FabricItemDraft {
        FabricItemDraft {
            fabric_for: fabric_for.to_string(),
            fabric_type: "Linen".to_string(),
            fabric_color: "White".to_string(),
            quantity_meters: qty,
            price_per_meter: price,
        }
    }

    fn draft(items: Vec<FabricItemDraft>) -> FabricOrderDraft {
        FabricOrderDraft {
            customer_name: "Asha".to_string(),
            customer_type: "New".to_string(),
            payment_status: "Paid".to_string(),
            items,
            ..FabricOrderDraft::default()
        }
    }

    #[test]
    fn test_incomplete_items_are_dropped() {
        let order = draft(vec![
            item("Shirt", Some(2.5), Some(120.0)),
            item("", Some(1.0), Some(80.0)),
            item("Pant", Some(1.2), None),
        ])
        .validate()
        .unwrap();
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.total(), 300.0);
        assert!(order.order_id.starts_with("F-"));
        assert_eq!(order.payment_status, PaymentStatus::Paid);
        assert!(!order.purchase_date.is_empty());
    }

    #[test]
    fn test_running_total_counts_partial_items() {
        let d = draft(vec![item("Shirt", Some(1.333), Some(99.99)), item("Pant", Some(2.0), None)]);
        assert_eq!(d.order_total(), 133.29);
    }

    #[test]
    fn test_running_total_matches_submitted_total() {
        let d = draft(vec![
            item("Shirt", Some(1.0), Some(0.005)),
            item("Pant", Some(1.0), Some(0.005)),
            item("Kurta", Some(1.0), Some(0.005)),
        ]);
        let order = d.validate().unwrap();
        assert_eq!(d.order_total(), order.total());
        assert_eq!(d.order_total(), 0.02);
    }

    #[test]
    fn test_validation_order() {
        let mut d = draft(vec![]);
        d.customer_name = " ".to_string();
        assert_eq!(d.validate().unwrap_err().field, "customer_name");

        d.customer_name = "Asha".to_string();
        d.customer_type = String::new();
        assert_eq!(d.validate().unwrap_err().message, "Please select customer type.");

        d.customer_type = "Regular".to_string();
        assert_eq!(d.validate().unwrap_err().field, "items");
    }

    #[test]
    fn test_linked_order_keeps_expected_id() {
        let mut d = draft(vec![item("Shirt", Some(1.0), Some(500.0))]);
        d.order_id = Some("F-CMB1741939200000042".to_string());
        assert_eq!(d.validate().unwrap().order_id, "F-CMB1741939200000042");
    }
}
