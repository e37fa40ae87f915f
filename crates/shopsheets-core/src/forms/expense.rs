use serde::{Deserialize, Serialize};

use super::{required, timestamp_now, Draft, ValidationError};
use crate::models::{FabricExpense, OtherExpense};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FabricExpenseDraft {
    pub supplier: String,
    pub address: String,
    pub purchase_date: String,
    pub fabric_brand: String,
    pub fabric_type: String,
    pub quantity: Option<f64>,
    pub price_per_meter: Option<f64>,
    pub notes: String,
}

impl FabricExpenseDraft {
    pub fn total(&self) -> f64 {
        FabricExpense::compute_total(
            self.quantity.unwrap_or(0.0),
            self.price_per_meter.unwrap_or(0.0),
        )
    }
}

impl Draft for FabricExpenseDraft {
    const PAGE_KEY: &'static str = "fabric_expense";

    type Output = FabricExpense;

    fn validate(&self) -> Result<FabricExpense, ValidationError> {
        const MESSAGE: &str = "Please fill Supplier, Purchase Date and Fabric Brand";
        let supplier = required(&self.supplier, "supplier", MESSAGE)?;
        let purchase_date = required(&self.purchase_date, "purchase_date", MESSAGE)?;
        let fabric_brand = required(&self.fabric_brand, "fabric_brand", MESSAGE)?;

        Ok(FabricExpense {
            supplier,
            address: self.address.trim().to_string(),
            purchase_date,
            fabric_brand,
            fabric_type: self.fabric_type.trim().to_string(),
            quantity: self.quantity.unwrap_or(0.0),
            price_per_meter: self.price_per_meter.unwrap_or(0.0),
            total_price: self.total(),
            notes: self.notes.trim().to_string(),
            timestamp: timestamp_now(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OtherExpenseDraft {
    pub expense_name: String,
    pub expense_date: String,
    pub amount: Option<f64>,
    pub notes: String,
}

impl Draft for OtherExpenseDraft {
    const PAGE_KEY: &'static str = "other_expense";

    type Output = OtherExpense;

    fn validate(&self) -> Result<OtherExpense, ValidationError> {
        const MESSAGE: &str = "Please fill Expense Name, Date and Amount";
        let expense_name = required(&self.expense_name, "expense_name", MESSAGE)?;
        let expense_date = required(&self.expense_date, "expense_date", MESSAGE)?;
        let amount = match self.amount {
            Some(amount) if amount != 0.0 => amount,
            _ => return Err(ValidationError::new("amount", MESSAGE)),
        };

        Ok(OtherExpense {
            expense_name,
            expense_date,
            amount,
            notes: self.notes.trim().to_string(),
            timestamp: timestamp_now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fabric_expense_total_and_validation() {
        let draft = FabricExpenseDraft {
            supplier: "Raymond Depot".to_string(),
            purchase_date: "2025-02-10".to_string(),
            fabric_brand: "Raymond".to_string(),
            quantity: Some(40.0),
            price_per_meter: Some(182.25),
            ..FabricExpenseDraft::default()
        };
        assert_eq!(draft.total(), 7290.0);
        let expense = draft.validate().unwrap();
        assert_eq!(expense.total_price, 7290.0);
        assert!(!expense.timestamp.is_empty());
    }

    #[test]
    fn test_fabric_expense_requires_brand() {
        let draft = FabricExpenseDraft {
            supplier: "Raymond Depot".to_string(),
            purchase_date: "2025-02-10".to_string(),
            ..FabricExpenseDraft::default()
        };
        assert_eq!(draft.validate().unwrap_err().field, "fabric_brand");
    }

    #[test]
    fn test_other_expense_requires_amount() {
        let mut draft = OtherExpenseDraft {
            expense_name: "Rent".to_string(),
            expense_date: "2025-02-01".to_string(),
            ..OtherExpenseDraft::default()
        };
        assert_eq!(draft.validate().unwrap_err().field, "amount");
        draft.amount = Some(8000.0);
        assert_eq!(draft.validate().unwrap().amount, 8000.0);
    }
}
