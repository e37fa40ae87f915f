use serde::{Deserialize, Serialize};

use crate::utils::round2;

/// A fabric purchase from a supplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FabricExpense {
    pub supplier: String,
    #[serde(default)]
    pub address: String,
    pub purchase_date: String,
    pub fabric_brand: String,
    #[serde(default)]
    pub fabric_type: String,
    pub quantity: f64,
    pub price_per_meter: f64,
    pub total_price: f64,
    #[serde(default)]
    pub notes: String,
    pub timestamp: String,
}

impl FabricExpense {
    pub fn compute_total(quantity: f64, price_per_meter: f64) -> f64 {
        round2(quantity * price_per_meter)
    }
}

/// Any non-fabric expense (rent, electricity, thread...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtherExpense {
    pub expense_name: String,
    pub expense_date: String,
    pub amount: f64,
    #[serde(default)]
    pub notes: String,
    pub timestamp: String,
}

/// Body accepted by the expenses script: `{"type": "fabric"|"other", "data": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum ExpenseSubmission {
    Fabric(FabricExpense),
    Other(OtherExpense),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expense_submission_shape() {
        let submission = ExpenseSubmission::Other(OtherExpense {
            expense_name: "Electricity".to_string(),
            expense_date: "2025-03-01".to_string(),
            amount: 1800.0,
            notes: String::new(),
            timestamp: "2025-03-01T09:00:00Z".to_string(),
        });
        let value = serde_json::to_value(&submission).unwrap();
        assert_eq!(value["type"], "other");
        assert_eq!(value["data"]["expenseName"], "Electricity");
        assert_eq!(value["data"]["amount"], 1800.0);
    }

    #[test]
    fn test_fabric_expense_total() {
        assert_eq!(FabricExpense::compute_total(12.5, 80.0), 1000.0);
        assert_eq!(FabricExpense::compute_total(0.333, 10.0), 3.33);
    }
}
