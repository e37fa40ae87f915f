use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{fallback_order_id, required, Draft, ValidationError};
use crate::models::{Customer, CustomerType, GarmentKind, GarmentSpec, PaymentStatus, TailorOrder};
use crate::saga::SubOrderLink;

/// Days between order and default delivery date.
const DEFAULT_DELIVERY_DAYS: i64 = 7;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GarmentDraft {
    pub quantity: Option<u32>,
    pub fabric_meters: Option<f64>,
    pub measurements: BTreeMap<String, f64>,
}

/// Tailoring form input. The selected garment set is part of the draft
/// itself; selecting a garment inserts it, removing one drops it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TailorOrderDraft {
    /// Set when the order belongs to a combined order.
    pub order_id: Option<String>,
    pub customer_name: String,
    pub contact_info: String,
    pub address: String,
    pub customer_type: String,
    pub garments: BTreeMap<GarmentKind, GarmentDraft>,
    pub price: Option<f64>,
    pub order_date: String,
    pub delivery_date: String,
    pub delivery_status: String,
    pub payment_status: String,
    pub season: String,
    pub festival: String,
    pub notes: String,
}

impl TailorOrderDraft {
    /// A draft prefilled from a combined order.
    pub fn for_link(link: &SubOrderLink) -> Self {
        Self {
            order_id: Some(link.expected_id.clone()),
            customer_name: link.customer.customer_name.clone(),
            contact_info: link.customer.contact.clone(),
            address: link.customer.address.clone(),
            customer_type: link.customer.customer_type.clone(),
            order_date: link.customer.order_date.clone(),
            season: link.customer.sessions.clone(),
            notes: link.customer.notes.clone(),
            ..Self::default()
        }
    }

    pub fn select(&mut self, kind: GarmentKind) -> &mut GarmentDraft {
        self.garments.entry(kind).or_default()
    }

    pub fn deselect(&mut self, kind: GarmentKind) {
        self.garments.remove(&kind);
    }

    /// Order date plus a week, `None` if the order date is not a date.
    pub fn default_delivery_date(&self) -> Option<String> {
        let order_date = NaiveDate::parse_from_str(self.order_date.trim(), "%Y-%m-%d").ok()?;
        Some((order_date + Duration::days(DEFAULT_DELIVERY_DAYS)).format("%Y-%m-%d").to_string())
    }
}

fn garment_spec(kind: GarmentKind, draft: &GarmentDraft) -> Result<GarmentSpec, ValidationError> {
    let quantity = draft.quantity.filter(|q| *q >= 1).ok_or_else(|| {
        ValidationError::new(
            "quantity",
            match kind {
                GarmentKind::Other => "Please enter valid quantity for other garment!".to_string(),
                _ => format!("Please enter valid quantity for {}!", kind.key()),
            },
        )
    })?;

    if let Some(field) = kind.required_measurement() {
        let present = draft.measurements.get(field).is_some_and(|v| *v > 0.0);
        if !present {
            return Err(ValidationError::new(
                field,
                format!("Please enter {} measurement for {}!", field, kind.key()),
            ));
        }
    }

    let measurements = draft
        .measurements
        .iter()
        .filter(|(name, value)| kind.measurement_fields().contains(&name.as_str()) && **value > 0.0)
        .map(|(name, value)| (name.clone(), *value))
        .collect();

    Ok(GarmentSpec {
        quantity,
        fabric_meters: draft.fabric_meters.unwrap_or(0.0),
        measurements,
    })
}

impl Draft for TailorOrderDraft {
    const PAGE_KEY: &'static str = "tailor_order";

    type Output = TailorOrder;

    fn validate(&self) -> Result<TailorOrder, ValidationError> {
        let name = required(&self.customer_name, "customer_name", "Customer name is required!")?;
        if self.garments.is_empty() {
            return Err(ValidationError::new("garments", "Please select at least one garment type!"));
        }
        let price = self
            .price
            .filter(|p| *p > 0.0)
            .ok_or_else(|| ValidationError::new("price", "Price must be greater than 0!"))?;
        let order_date = required(&self.order_date, "order_date", "Order date is required!")?;

        let mut garments = BTreeMap::new();
        for (kind, draft) in &self.garments {
            garments.insert(*kind, garment_spec(*kind, draft)?);
        }

        let delivery_date = if self.delivery_date.trim().is_empty() {
            self.default_delivery_date().unwrap_or_default()
        } else {
            self.delivery_date.trim().to_string()
        };
        let delivery_status = if self.delivery_status.trim().is_empty() {
            "Pending".to_string()
        } else {
            self.delivery_status.trim().to_string()
        };
        let order_id = self
            .order_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| fallback_order_id("T"));

        Ok(TailorOrder {
            order_id,
            customer: Customer {
                name,
                contact: self.contact_info.trim().to_string(),
                address: self.address.trim().to_string(),
                customer_type: CustomerType::from_str(&self.customer_type).unwrap_or_default(),
            },
            garments,
            price,
            order_date,
            delivery_date,
            delivery_status,
            payment_status: PaymentStatus::from_str(&self.payment_status).unwrap_or_default(),
            season: self.season.trim().to_string(),
            festival: self.festival.trim().to_string(),
            notes: self.notes.trim().to_string(),
        })
    }
}
