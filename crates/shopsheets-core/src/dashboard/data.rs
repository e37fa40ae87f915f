use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::sheets::{parse_sheet_rows, SheetMap, SheetRef, SheetRow};
use crate::api::{ApiError, SheetsClient};
use crate::models::{PaymentRecord, Worker};

/// Everything the dashboard shows, loaded in one pass.
#[derive(Debug, Clone, Default)]
pub struct DashboardData {
    pub combined_orders: Vec<SheetRow>,
    pub fabric_orders: Vec<SheetRow>,
    pub tailoring_orders: Vec<SheetRow>,
    pub fabric_expenses: Vec<SheetRow>,
    pub other_expenses: Vec<SheetRow>,
    pub workers: Vec<SheetRow>,
    pub payments: Vec<SheetRow>,
    /// Sheets that failed to load and are shown as empty.
    pub failed_sheets: Vec<String>,
    pub loaded_at: Option<DateTime<Utc>>,
}

impl DashboardData {
    /// Fetch every sheet concurrently. A sheet that fails is logged and left
    /// empty so the rest of the dashboard still renders.
    pub async fn load(client: &SheetsClient, sheets: &SheetMap) -> Self {
        let (combined, fabric, tailoring, fabric_exp, other_exp, workers, payments) = futures::join!(
            fetch_rows(client, &sheets.combined_orders),
            fetch_rows(client, &sheets.fabric_orders),
            fetch_rows(client, &sheets.tailoring_orders),
            fetch_rows(client, &sheets.fabric_expenses),
            fetch_rows(client, &sheets.other_expenses),
            fetch_rows(client, &sheets.workers),
            fetch_rows(client, &sheets.payments),
        );

        let mut failed_sheets = Vec::new();
        let mut take = |sheet: &SheetRef, result: Result<Vec<SheetRow>, ApiError>| match result {
            Ok(rows) => rows,
            Err(e) => {
                warn!(sheet = sheet.sheet, error = %e, "Failed to load sheet");
                failed_sheets.push(sheet.sheet.to_string());
                Vec::new()
            }
        };

        let combined_orders = take(&sheets.combined_orders, combined);
        let fabric_orders = take(&sheets.fabric_orders, fabric);
        let tailoring_orders = take(&sheets.tailoring_orders, tailoring);
        let fabric_expenses = take(&sheets.fabric_expenses, fabric_exp);
        let other_expenses = take(&sheets.other_expenses, other_exp);
        let workers = take(&sheets.workers, workers);
        let payments = take(&sheets.payments, payments);

        let data = Self {
            combined_orders,
            fabric_orders,
            tailoring_orders,
            fabric_expenses,
            other_expenses,
            workers,
            payments,
            failed_sheets,
            loaded_at: Some(Utc::now()),
        };

        info!(
            orders = data.order_count(),
            workers = data.workers.len(),
            failed = data.failed_sheets.len(),
            "Dashboard data loaded"
        );
        data
    }

    pub fn order_count(&self) -> usize {
        self.combined_orders.len() + self.fabric_orders.len() + self.tailoring_orders.len()
    }

    /// `Worker_List` rows as workers, for the list search.
    pub fn worker_list(&self) -> Vec<Worker> {
        self.workers
            .iter()
            .map(|row| Worker {
                name: row.get("Name").to_string(),
                phone: row.get("Phone").to_string(),
                address: row.get("Address").to_string(),
                date_added: row.get("Date Added").to_string(),
            })
            .collect()
    }

    /// `Payment_Daily_Entry` rows as payment records, for the history filters.
    pub fn payment_records(&self) -> Vec<PaymentRecord> {
        self.payments
            .iter()
            .map(|row| PaymentRecord {
                date: row.get("Date").to_string(),
                worker_name: row.get("Worker Name").to_string(),
                paint_count: row.amount("Paint Count"),
                shirt_count: row.amount("Shirt Count"),
                total_work_amount: row.amount("Total Work Amount"),
                advance_taken: row.amount("Advance Taken"),
                remaining_payment: row.amount("Remaining Payment"),
                notes: row.get("Notes").to_string(),
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.order_count() == 0
            && self.fabric_expenses.is_empty()
            && self.other_expenses.is_empty()
            && self.workers.is_empty()
            && self.payments.is_empty()
    }
}

async fn fetch_rows(client: &SheetsClient, sheet: &SheetRef) -> Result<Vec<SheetRow>, ApiError> {
    let values = client.fetch_values(&sheet.spreadsheet_id, sheet.sheet).await?;
    Ok(parse_sheet_rows(&values, sheet.headers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use tempfile::tempdir;

    use crate::cache::{FetchError, FetchRequest, FetchResponse, Fetcher, OfflineRouter, RoutePolicy};
    use crate::config::SpreadsheetIds;

    /// Serves a fixed values reply per sheet name; `Fabric Orders` fails.
    struct SheetFetcher;

    #[async_trait]
    impl Fetcher for SheetFetcher {
        async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
            let path = request.url.path().to_string();
            if path.ends_with("Fabric%20Orders") {
                return Err(FetchError::Network("connection reset".to_string()));
            }
            let body = if path.ends_with("Combine%20Orders") {
                r#"{"values":[["Timestamp"],["2025-03-01T10:00:00Z","C-1","CMB1","Meera","","","","2025-03-01","","","F-CMB1","500","T-CMB1","700","1200","Paid"]]}"#
            } else if path.ends_with("Worker_List") {
                r#"{"values":[["Name"],["Ravi","98450"],["Sita","99001"]]}"#
            } else {
                r#"{"range":"Sheet1"}"#
            };
            Ok(FetchResponse::new(200, body.as_bytes().to_vec()))
        }
    }

    #[tokio::test]
    async fn test_load_tolerates_failed_sheet() {
        let dir = tempdir().unwrap();
        let router = OfflineRouter::new(
            dir.path().to_path_buf(),
            RoutePolicy::new("http://127.0.0.1:3000").unwrap(),
            Arc::new(SheetFetcher),
        )
        .unwrap();
        let client = SheetsClient::new(Arc::new(router), "https://sheets.googleapis.com", "key");
        let sheets = SheetMap::new(&SpreadsheetIds::default());

        let data = DashboardData::load(&client, &sheets).await;
        assert_eq!(data.combined_orders.len(), 1);
        assert_eq!(data.combined_orders[0].amount("Total Amount"), 1200.0);
        assert_eq!(data.workers.len(), 2);
        assert!(data.fabric_orders.is_empty());
        assert_eq!(data.failed_sheets, vec!["Fabric Orders".to_string()]);
        assert!(data.loaded_at.is_some());

        let workers = data.worker_list();
        assert_eq!(workers[1].name, "Sita");
        assert_eq!(workers[1].phone, "99001");
        assert!(data.payment_records().is_empty());
    }
}
