use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::utils::round2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentStatus {
    Paid,
    #[default]
    Unpaid,
    Partial,
}

impl PaymentStatus {
    /// Classify a free-text status cell. "Unpaid" contains "paid", so it is
    /// excluded explicitly; anything unrecognised counts as unpaid.
    pub fn from_sheet(value: &str) -> Self {
        let lower = value.to_lowercase();
        if lower.contains("paid") && !lower.contains("unpaid") {
            PaymentStatus::Paid
        } else if lower.contains("partial") {
            PaymentStatus::Partial
        } else {
            PaymentStatus::Unpaid
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "Paid",
            PaymentStatus::Unpaid => "Unpaid",
            PaymentStatus::Partial => "Partial",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "paid" => Ok(PaymentStatus::Paid),
            "unpaid" => Ok(PaymentStatus::Unpaid),
            "partial" => Ok(PaymentStatus::Partial),
            other => Err(format!("unknown payment status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CustomerType {
    #[default]
    New,
    Regular,
}

impl CustomerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerType::New => "New",
            CustomerType::Regular => "Regular",
        }
    }
}

impl fmt::Display for CustomerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CustomerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "new" => Ok(CustomerType::New),
            "regular" | "existing" => Ok(CustomerType::Regular),
            other => Err(format!("unknown customer type: {}", other)),
        }
    }
}

/// Customer fields shared by every order kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Customer {
    pub name: String,
    pub contact: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub customer_type: CustomerType,
}

// ===== Fabric orders =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FabricItem {
    pub fabric_for: String,
    pub fabric_type: String,
    #[serde(default)]
    pub fabric_color: String,
    pub quantity_meters: f64,
    pub price_per_meter: f64,
}

impl FabricItem {
    pub fn total(&self) -> f64 {
        round2(self.quantity_meters * self.price_per_meter)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FabricOrder {
    pub order_id: String,
    pub customer: Customer,
    pub purchase_date: String,
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub session: String,
    #[serde(default)]
    pub note: String,
    pub items: Vec<FabricItem>,
}

/// Sum of `quantity × price` over all items, rounded once at the end.
pub fn fabric_total(items: &[FabricItem]) -> f64 {
    round2(
        items
            .iter()
            .map(|i| i.quantity_meters * i.price_per_meter)
            .sum(),
    )
}

impl FabricOrder {
    pub fn total(&self) -> f64 {
        fabric_total(&self.items)
    }

    /// Form-encoded field list, items numbered from 1 as the sheet script expects.
    pub fn to_form_fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("order_id".to_string(), self.order_id.clone()),
            ("customer_name".to_string(), self.customer.name.clone()),
            ("contact_number".to_string(), self.customer.contact.clone()),
            ("address".to_string(), self.customer.address.clone()),
            ("customer_type".to_string(), self.customer.customer_type.to_string()),
            ("purchase_date".to_string(), self.purchase_date.clone()),
            ("payment_status".to_string(), self.payment_status.to_string()),
            ("session".to_string(), self.session.clone()),
            ("note".to_string(), self.note.clone()),
        ];
        for (i, item) in self.items.iter().enumerate() {
            let n = i + 1;
            fields.push((format!("fabric_for_{}", n), item.fabric_for.clone()));
            fields.push((format!("fabric_type_{}", n), item.fabric_type.clone()));
            fields.push((format!("fabric_color_{}", n), item.fabric_color.clone()));
            fields.push((format!("quantity_meters_{}", n), item.quantity_meters.to_string()));
            fields.push((format!("price_per_meter_{}", n), item.price_per_meter.to_string()));
        }
        fields.push(("order_total".to_string(), format!("{:.2}", self.total())));
        fields
    }
}

// ===== Tailoring orders =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GarmentKind {
    Shirt,
    Pant,
    Other,
}

impl GarmentKind {
    pub const ALL: [GarmentKind; 3] = [GarmentKind::Shirt, GarmentKind::Pant, GarmentKind::Other];

    pub fn key(&self) -> &'static str {
        match self {
            GarmentKind::Shirt => "shirt",
            GarmentKind::Pant => "pant",
            GarmentKind::Other => "other",
        }
    }

    /// Measurement fields recorded for this garment, besides quantity and fabric.
    pub fn measurement_fields(&self) -> &'static [&'static str] {
        match self {
            GarmentKind::Shirt => &["chest", "shoulder", "sleeve", "length", "neck", "bicep"],
            GarmentKind::Pant => &["waist", "hip", "inseam", "outseam", "thigh", "knee", "bottom"],
            GarmentKind::Other => &[],
        }
    }

    /// The measurement that must be present before the garment can be saved.
    pub fn required_measurement(&self) -> Option<&'static str> {
        match self {
            GarmentKind::Shirt => Some("chest"),
            GarmentKind::Pant => Some("waist"),
            GarmentKind::Other => None,
        }
    }
}

impl fmt::Display for GarmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GarmentKind::Shirt => write!(f, "Shirt"),
            GarmentKind::Pant => write!(f, "Pant"),
            GarmentKind::Other => write!(f, "Other"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GarmentSpec {
    pub quantity: u32,
    #[serde(default)]
    pub fabric_meters: f64,
    #[serde(default)]
    pub measurements: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TailorOrder {
    pub order_id: String,
    pub customer: Customer,
    pub garments: BTreeMap<GarmentKind, GarmentSpec>,
    pub price: f64,
    pub order_date: String,
    #[serde(default)]
    pub delivery_date: String,
    #[serde(default)]
    pub delivery_status: String,
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub season: String,
    #[serde(default)]
    pub festival: String,
    #[serde(default)]
    pub notes: String,
}

impl TailorOrder {
    /// Comma separated garment list as stored in the `Garment Types` column.
    pub fn garment_types(&self) -> String {
        self.garments
            .keys()
            .map(|k| k.key())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Flat JSON body with one `<garment>_<field>` key per measurement.
    pub fn to_payload(&self, timestamp: &str) -> Value {
        let mut body = Map::new();
        body.insert("order_id".into(), json!(self.order_id));
        body.insert("customer_name".into(), json!(self.customer.name));
        body.insert("contact_info".into(), json!(self.customer.contact));
        body.insert("address".into(), json!(self.customer.address));
        body.insert("customer_type".into(), json!(self.customer.customer_type.as_str()));
        body.insert("garment_type".into(), json!(self.garment_types()));
        body.insert("price".into(), json!(self.price));
        body.insert("order_date".into(), json!(self.order_date));
        body.insert("delivery_date".into(), json!(self.delivery_date));
        body.insert("delivery_status".into(), json!(self.delivery_status));
        body.insert("payment_status".into(), json!(self.payment_status.as_str()));
        body.insert("season".into(), json!(self.season));
        body.insert("festival".into(), json!(self.festival));
        body.insert("notes".into(), json!(self.notes));
        body.insert("timestamp".into(), json!(timestamp));

        for kind in GarmentKind::ALL {
            let key = kind.key();
            match self.garments.get(&kind) {
                Some(spec) => {
                    body.insert(format!("{}_selected", key), json!("1"));
                    body.insert(format!("{}_quantity", key), json!(spec.quantity));
                    body.insert(format!("{}_fabric_meters", key), json!(spec.fabric_meters));
                    for field in kind.measurement_fields() {
                        let value = spec.measurements.get(*field).copied();
                        body.insert(
                            format!("{}_{}", key, field),
                            value.map(|v| json!(v)).unwrap_or_else(|| json!("")),
                        );
                    }
                }
                None => {
                    body.insert(format!("{}_selected", key), json!("0"));
                }
            }
        }
        Value::Object(body)
    }
}

// ===== Combined orders =====

/// Payload for the combined-orders sheet; field names match its Apps Script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedOrder {
    pub customer_name: String,
    pub contact: String,
    pub customer_type: String,
    pub order_date: String,
    pub sessions: String,
    pub notes: String,
    pub address: String,
    pub fabric_order_id: String,
    pub fabric_price: f64,
    pub tailoring_order_id: String,
    pub tailoring_price: f64,
    pub total_amount: f64,
    pub paid_status: PaymentStatus,
    pub combined_order_id: String,
    pub master_order_id: String,
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(qty: f64, price: f64) -> FabricItem {
        FabricItem {
            fabric_for: "Shirt".to_string(),
            fabric_type: "Cotton".to_string(),
            fabric_color: String::new(),
            quantity_meters: qty,
            price_per_meter: price,
        }
    }

    #[test]
    fn test_payment_status_from_sheet() {
        assert_eq!(PaymentStatus::from_sheet("Paid"), PaymentStatus::Paid);
        assert_eq!(PaymentStatus::from_sheet("UNPAID"), PaymentStatus::Unpaid);
        assert_eq!(PaymentStatus::from_sheet("Partial"), PaymentStatus::Partial);
        assert_eq!(PaymentStatus::from_sheet(""), PaymentStatus::Unpaid);
        // "paid" wins over "partial" when both appear
        assert_eq!(PaymentStatus::from_sheet("Partially paid"), PaymentStatus::Paid);
    }

    #[test]
    fn test_fabric_total_rounds_sum() {
        let items = vec![item(2.5, 120.0), item(1.333, 99.99)];
        // 300 + 133.28667 = 433.28667
        assert_eq!(fabric_total(&items), 433.29);
        assert_eq!(item(2.5, 120.0).total(), 300.0);
        assert_eq!(fabric_total(&[]), 0.0);
    }

    #[test]
    fn test_fabric_form_fields_number_items_from_one() {
        let order = FabricOrder {
            order_id: "F-1".to_string(),
            customer: Customer {
                name: "Asha".to_string(),
                contact: "9876543210".to_string(),
                ..Customer::default()
            },
            purchase_date: "2025-03-14".to_string(),
            payment_status: PaymentStatus::Paid,
            session: String::new(),
            note: String::new(),
            items: vec![item(2.0, 100.0), item(1.0, 50.0)],
        };
        let fields = order.to_form_fields();
        let get = |k: &str| fields.iter().find(|(key, _)| key == k).map(|(_, v)| v.as_str());
        assert_eq!(get("fabric_for_1"), Some("Shirt"));
        assert_eq!(get("quantity_meters_2"), Some("1"));
        assert_eq!(get("payment_status"), Some("Paid"));
        assert_eq!(get("order_total"), Some("250.00"));
        assert_eq!(get("fabric_for_3"), None);
    }

    #[test]
    fn test_tailor_payload_flags_selected_garments() {
        let mut garments = BTreeMap::new();
        let mut measurements = BTreeMap::new();
        measurements.insert("waist".to_string(), 32.0);
        garments.insert(
            GarmentKind::Pant,
            GarmentSpec { quantity: 2, fabric_meters: 2.4, measurements },
        );
        let order = TailorOrder {
            order_id: "T-CMB1".to_string(),
            customer: Customer { name: "Ravi".to_string(), ..Customer::default() },
            garments,
            price: 900.0,
            order_date: "2025-03-14".to_string(),
            delivery_date: String::new(),
            delivery_status: "Pending".to_string(),
            payment_status: PaymentStatus::Unpaid,
            season: String::new(),
            festival: String::new(),
            notes: String::new(),
        };
        let payload = order.to_payload("2025-03-14T10:00:00Z");
        assert_eq!(payload["garment_type"], "pant");
        assert_eq!(payload["pant_selected"], "1");
        assert_eq!(payload["pant_quantity"], 2);
        assert_eq!(payload["pant_waist"], 32.0);
        assert_eq!(payload["pant_hip"], "");
        assert_eq!(payload["shirt_selected"], "0");
        assert!(payload.get("shirt_chest").is_none());
    }
}
