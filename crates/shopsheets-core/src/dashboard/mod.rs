//! Dashboard data: sheet reads, KPI aggregation, list filters.
//!
//! Rows come from the public Sheets values API through the offline router,
//! so a dashboard opened without a connection shows the last cached copy.

pub mod aggregate;
pub mod data;
pub mod filters;
pub mod sheets;

pub use aggregate::{
    Activity, ExpenseSplit, Kpis, MonthRevenue, OrderKind, PaymentCounts, RevenueSplit, TREND_MONTHS,
};
pub use data::DashboardData;
pub use filters::{count_label, search_workers, PaymentFilter, PaymentSummary};
pub use sheets::{parse_sheet_rows, SheetMap, SheetRef, SheetRow};
