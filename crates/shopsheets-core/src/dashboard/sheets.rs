//! Sheet locations and fixed header lists.
//!
//! The values API returns bare rows. Each sheet's columns are mapped by
//! position onto a fixed header list, whatever the sheet's own first row says.

use std::collections::HashMap;

use crate::config::SpreadsheetIds;
use crate::utils::parse_amount;

pub const COMBINED_ORDER_HEADERS: &[&str] = &[
    "Timestamp",
    "Combined Order ID",
    "Master Order ID",
    "Customer Name",
    "Contact",
    "Address",
    "Customer Type",
    "Order Date",
    "Session",
    "Notes",
    "Fabric Order ID",
    "Fabric Price",
    "Tailoring Order ID",
    "Tailoring Price",
    "Total Amount",
    "Payment Status",
];

pub const FABRIC_ORDER_HEADERS: &[&str] = &[
    "Order ID",
    "Customer Name",
    "Contact Number",
    "Address",
    "Customer Type",
    "Purchase Date",
    "Payment Status",
    "Session",
    "Note",
    "Brand Name",
    "Fabric For",
    "Fabric Type",
    "Fabric Color",
    "Quantity (meters)",
    "Price per Meter",
    "Fabric Total",
    "Timestamp",
];

pub const TAILORING_ORDER_HEADERS: &[&str] = &[
    "Order ID",
    "Customer Name",
    "Contact Info",
    "Address",
    "Customer Type",
    "Garment Types",
    "Order Date",
    "Delivery Date",
    "Delivery Status",
    "Price",
    "Payment Status",
    "Season",
    "Festival",
    "Notes",
    "Created At",
];

pub const FABRIC_EXPENSE_HEADERS: &[&str] = &[
    "Supplier",
    "Address",
    "Purchase Date",
    "Fabric Brand",
    "Fabric Type",
    "Quantity (m)",
    "Price/meter",
    "Total Price",
    "Timestamp",
];

pub const OTHER_EXPENSE_HEADERS: &[&str] = &["Expense Name", "Expense Date", "Amount", "Notes", "Timestamp"];

pub const WORKER_HEADERS: &[&str] = &["Name", "Phone", "Address", "Date Added"];

pub const PAYMENT_HEADERS: &[&str] = &[
    "Date",
    "Worker Name",
    "Paint Count",
    "Shirt Count",
    "Total Work Amount",
    "Advance Taken",
    "Remaining Payment",
    "Notes",
];

/// One sheet tab the dashboard reads.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRef {
    pub spreadsheet_id: String,
    pub sheet: &'static str,
    pub headers: &'static [&'static str],
}

impl SheetRef {
    fn new(spreadsheet_id: &str, sheet: &'static str, headers: &'static [&'static str]) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.to_string(),
            sheet,
            headers,
        }
    }
}

/// Every sheet tab the dashboard reads, resolved against configured ids.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetMap {
    pub combined_orders: SheetRef,
    pub fabric_orders: SheetRef,
    pub tailoring_orders: SheetRef,
    pub fabric_expenses: SheetRef,
    pub other_expenses: SheetRef,
    pub workers: SheetRef,
    pub payments: SheetRef,
}

impl SheetMap {
    pub fn new(ids: &SpreadsheetIds) -> Self {
        Self {
            combined_orders: SheetRef::new(&ids.combined_orders, "Combine Orders", COMBINED_ORDER_HEADERS),
            fabric_orders: SheetRef::new(&ids.fabric_orders, "Fabric Orders", FABRIC_ORDER_HEADERS),
            tailoring_orders: SheetRef::new(&ids.tailoring_orders, "Orders", TAILORING_ORDER_HEADERS),
            fabric_expenses: SheetRef::new(&ids.expenses, "Fabric_Expense", FABRIC_EXPENSE_HEADERS),
            other_expenses: SheetRef::new(&ids.expenses, "Other_Expense", OTHER_EXPENSE_HEADERS),
            workers: SheetRef::new(&ids.workers, "Worker_List", WORKER_HEADERS),
            payments: SheetRef::new(&ids.workers, "Payment_Daily_Entry", PAYMENT_HEADERS),
        }
    }
}

/// A data row keyed by header name. Missing cells read as "".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetRow {
    cells: HashMap<&'static str, String>,
}

impl SheetRow {
    pub fn get(&self, header: &str) -> &str {
        self.cells.get(header).map(String::as_str).unwrap_or("")
    }

    /// Leading number of the cell, 0 when there is none.
    pub fn amount(&self, header: &str) -> f64 {
        parse_amount(self.get(header))
    }

    /// The first non-blank of `headers`, "" if all are blank.
    pub fn first_of(&self, headers: &[&str]) -> &str {
        headers
            .iter()
            .map(|h| self.get(h))
            .find(|v| !v.trim().is_empty())
            .unwrap_or("")
    }
}

#[cfg(test)]
impl FromIterator<(&'static str, &'static str)> for SheetRow {
    fn from_iter<I: IntoIterator<Item = (&'static str, &'static str)>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().map(|(k, v)| (k, v.to_string())).collect(),
        }
    }
}

/// Skip the header row and map each remaining row onto `headers` by position.
/// Fewer than two rows means no data.
pub fn parse_sheet_rows(values: &[Vec<String>], headers: &'static [&'static str]) -> Vec<SheetRow> {
    if values.len() < 2 {
        return Vec::new();
    }
    values[1..]
        .iter()
        .map(|row| SheetRow {
            cells: headers
                .iter()
                .enumerate()
                .map(|(i, header)| (*header, row.get(i).cloned().unwrap_or_default()))
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_parse_skips_header_and_pads() {
        let values = rows(&[
            &["Name", "Phone", "Address", "Date Added"],
            &["Ravi", "9845012345"],
            &["Sita", "9900112233", "Jayanagar", "2025-01-04", "extra"],
        ]);
        let parsed = parse_sheet_rows(&values, WORKER_HEADERS);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].get("Name"), "Ravi");
        assert_eq!(parsed[0].get("Address"), "");
        assert_eq!(parsed[1].get("Date Added"), "2025-01-04");
    }

    #[test]
    fn test_parse_header_only_is_empty() {
        assert!(parse_sheet_rows(&rows(&[&["Name"]]), WORKER_HEADERS).is_empty());
        assert!(parse_sheet_rows(&[], WORKER_HEADERS).is_empty());
    }

    #[test]
    fn test_row_amount_and_fallback() {
        let row: SheetRow = [("Price", "1,250 rs"), ("Order Date", " "), ("Created At", "2025-02-01")]
            .into_iter()
            .collect();
        assert_eq!(row.amount("Price"), 1250.0);
        assert_eq!(row.amount("Missing"), 0.0);
        assert_eq!(row.first_of(&["Order Date", "Created At"]), "2025-02-01");
    }

    #[test]
    fn test_sheet_map_shares_spreadsheets() {
        let map = SheetMap::new(&SpreadsheetIds::default());
        assert_eq!(map.fabric_expenses.spreadsheet_id, map.other_expenses.spreadsheet_id);
        assert_eq!(map.workers.spreadsheet_id, map.payments.spreadsheet_id);
        assert_eq!(map.combined_orders.sheet, "Combine Orders");
    }
}
