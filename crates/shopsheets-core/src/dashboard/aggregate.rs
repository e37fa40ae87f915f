//! KPI and chart figures derived from [`DashboardData`].

use chrono::{Datelike, NaiveDate, NaiveDateTime};

use super::data::DashboardData;
use super::sheets::SheetRow;
use crate::models::PaymentStatus;
use crate::utils::parse_sheet_date;

/// Months shown on the revenue trend, current month included.
pub const TREND_MONTHS: u32 = 6;

const RECENT_ORDERS: usize = 5;
const RECENT_PAYMENTS: usize = 3;
const RECENT_ACTIVITY_LIMIT: usize = 8;

/// Where each order kind keeps its amount, the date used for the monthly
/// trend, and the date used for recent activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderKind {
    Combined,
    Fabric,
    Tailoring,
}

impl OrderKind {
    pub fn label(&self) -> &'static str {
        match self {
            OrderKind::Combined => "Combined Order",
            OrderKind::Fabric => "Fabric Order",
            OrderKind::Tailoring => "Tailoring Order",
        }
    }

    fn amount_header(&self) -> &'static str {
        match self {
            OrderKind::Combined => "Total Amount",
            OrderKind::Fabric => "Fabric Total",
            OrderKind::Tailoring => "Price",
        }
    }

    fn trend_dates(&self) -> &'static [&'static str] {
        match self {
            OrderKind::Combined => &["Order Date", "Timestamp"],
            OrderKind::Fabric => &["Purchase Date", "Timestamp"],
            OrderKind::Tailoring => &["Order Date", "Created At"],
        }
    }

    fn activity_dates(&self) -> &'static [&'static str] {
        match self {
            OrderKind::Combined => &["Timestamp", "Order Date"],
            OrderKind::Fabric => &["Timestamp", "Purchase Date"],
            OrderKind::Tailoring => &["Created At", "Order Date"],
        }
    }

    fn amount(&self, row: &SheetRow) -> f64 {
        row.amount(self.amount_header())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Kpis {
    pub total_revenue: f64,
    pub total_expenses: f64,
    pub profit: f64,
    pub order_count: usize,
    pub worker_count: usize,
}

impl Kpis {
    /// Break-even counts as a loss.
    pub fn is_profitable(&self) -> bool {
        self.profit > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RevenueSplit {
    pub combined: f64,
    pub fabric_only: f64,
    pub tailoring_only: f64,
}

impl RevenueSplit {
    pub fn total(&self) -> f64 {
        self.combined + self.fabric_only + self.tailoring_only
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ExpenseSplit {
    pub fabric_purchases: f64,
    pub worker_payments: f64,
    pub other: f64,
}

impl ExpenseSplit {
    pub fn total(&self) -> f64 {
        self.fabric_purchases + self.worker_payments + self.other
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PaymentCounts {
    pub paid: usize,
    pub unpaid: usize,
    pub partial: usize,
}

/// A month on the revenue trend, labelled like `Jan 25`.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthRevenue {
    pub label: String,
    pub year: i32,
    pub month: u32,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Activity {
    Order {
        kind: OrderKind,
        customer: String,
        amount: f64,
        /// Empty status cells show as "Pending".
        status: String,
        date: NaiveDateTime,
    },
    WorkerPayment {
        worker: String,
        amount: f64,
        date: String,
    },
}

impl DashboardData {
    fn orders(&self) -> impl Iterator<Item = (OrderKind, &SheetRow)> {
        self.combined_orders
            .iter()
            .map(|r| (OrderKind::Combined, r))
            .chain(self.fabric_orders.iter().map(|r| (OrderKind::Fabric, r)))
            .chain(self.tailoring_orders.iter().map(|r| (OrderKind::Tailoring, r)))
    }

    pub fn revenue_split(&self) -> RevenueSplit {
        let sum = |rows: &[SheetRow], kind: OrderKind| -> f64 {
            rows.iter().map(|r| kind.amount(r)).sum()
        };
        RevenueSplit {
            combined: sum(&self.combined_orders, OrderKind::Combined),
            fabric_only: sum(&self.fabric_orders, OrderKind::Fabric),
            tailoring_only: sum(&self.tailoring_orders, OrderKind::Tailoring),
        }
    }

    pub fn expense_split(&self) -> ExpenseSplit {
        let sum = |rows: &[SheetRow], header: &str| -> f64 {
            rows.iter().map(|r| r.amount(header)).sum()
        };
        ExpenseSplit {
            fabric_purchases: sum(&self.fabric_expenses, "Total Price"),
            worker_payments: sum(&self.payments, "Total Work Amount"),
            other: sum(&self.other_expenses, "Amount"),
        }
    }

    pub fn kpis(&self) -> Kpis {
        let total_revenue = self.revenue_split().total();
        let total_expenses = self.expense_split().total();
        Kpis {
            total_revenue,
            total_expenses,
            profit: total_revenue - total_expenses,
            order_count: self.order_count(),
            worker_count: self.workers.len(),
        }
    }

    pub fn payment_counts(&self) -> PaymentCounts {
        let mut counts = PaymentCounts::default();
        for (_, row) in self.orders() {
            match PaymentStatus::from_sheet(row.get("Payment Status")) {
                PaymentStatus::Paid => counts.paid += 1,
                PaymentStatus::Partial => counts.partial += 1,
                PaymentStatus::Unpaid => counts.unpaid += 1,
            }
        }
        counts
    }

    /// Revenue per month for the [`TREND_MONTHS`] months ending with the
    /// month of `today`. Orders outside the window or without a readable
    /// date are left out.
    pub fn monthly_revenue(&self, today: NaiveDate) -> Vec<MonthRevenue> {
        let mut months: Vec<MonthRevenue> = (0..TREND_MONTHS)
            .rev()
            .filter_map(|back| month_start(today, back))
            .map(|start| MonthRevenue {
                label: start.format("%b %y").to_string(),
                year: start.year(),
                month: start.month(),
                revenue: 0.0,
            })
            .collect();

        for (kind, row) in self.orders() {
            let Some(date) = parse_sheet_date(row.first_of(kind.trend_dates())) else {
                continue;
            };
            if let Some(slot) = months
                .iter_mut()
                .find(|m| m.year == date.year() && m.month == date.month())
            {
                slot.revenue += kind.amount(row);
            }
        }
        months
    }

    /// The newest orders with a readable date and a customer, then worker
    /// payments from the top of the payment sheet.
    pub fn recent_activity(&self) -> Vec<Activity> {
        let mut orders: Vec<Activity> = self
            .orders()
            .filter_map(|(kind, row)| {
                let customer = row.get("Customer Name").trim();
                if customer.is_empty() {
                    return None;
                }
                let date = parse_sheet_date(row.first_of(kind.activity_dates()))?;
                let status = match row.get("Payment Status").trim() {
                    "" => "Pending",
                    s => s,
                };
                Some(Activity::Order {
                    kind,
                    customer: customer.to_string(),
                    amount: kind.amount(row),
                    status: status.to_string(),
                    date,
                })
            })
            .collect();
        orders.sort_by(|a, b| activity_date(b).cmp(&activity_date(a)));
        orders.truncate(RECENT_ORDERS);

        let payments = self
            .payments
            .iter()
            .take(RECENT_PAYMENTS)
            .filter_map(|row| {
                let worker = row.get("Worker Name").trim();
                let amount = row.amount("Total Work Amount");
                (!worker.is_empty() && amount > 0.0).then(|| Activity::WorkerPayment {
                    worker: worker.to_string(),
                    amount,
                    date: row.get("Date").to_string(),
                })
            });

        orders.into_iter().chain(payments).take(RECENT_ACTIVITY_LIMIT).collect()
    }
}

fn activity_date(activity: &Activity) -> Option<NaiveDateTime> {
    match activity {
        Activity::Order { date, .. } => Some(*date),
        Activity::WorkerPayment { .. } => None,
    }
}

/// First day of the month `back` months before `today`'s month.
fn month_start(today: NaiveDate, back: u32) -> Option<NaiveDate> {
    let index = today.year() * 12 + today.month0() as i32 - back as i32;
    NaiveDate::from_ymd_opt(index.div_euclid(12), index.rem_euclid(12) as u32 + 1, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[(&'static str, &'static str)]) -> SheetRow {
        cells.iter().copied().collect()
    }

    fn sample() -> DashboardData {
        DashboardData {
            combined_orders: vec![row(&[
                ("Customer Name", "Meera"),
                ("Total Amount", "1200"),
                ("Order Date", "2025-03-14"),
                ("Timestamp", "2025-03-14T09:30:00Z"),
                ("Payment Status", "Paid"),
            ])],
            fabric_orders: vec![
                row(&[
                    ("Customer Name", "Asha"),
                    ("Fabric Total", "300.50"),
                    ("Purchase Date", "2025-02-10"),
                    ("Payment Status", "Unpaid"),
                ]),
                row(&[
                    ("Customer Name", ""),
                    ("Fabric Total", "99"),
                    ("Timestamp", "2024-06-01T00:00:00Z"),
                    ("Payment Status", "partial payment"),
                ]),
            ],
            tailoring_orders: vec![row(&[
                ("Customer Name", "Ravi"),
                ("Price", "700"),
                ("Order Date", ""),
                ("Created At", "2025-03-20 11:00:00"),
                ("Payment Status", ""),
            ])],
            fabric_expenses: vec![row(&[("Total Price", "400")])],
            other_expenses: vec![row(&[("Amount", "150")]), row(&[("Amount", "n/a")])],
            workers: vec![row(&[("Name", "Ravi")]), row(&[("Name", "Sita")])],
            payments: vec![
                row(&[("Worker Name", "Sita"), ("Total Work Amount", "460"), ("Date", "2025-03-18")]),
                row(&[("Worker Name", "Ravi"), ("Total Work Amount", "0"), ("Date", "2025-03-17")]),
            ],
            ..DashboardData::default()
        }
    }

    #[test]
    fn test_kpis() {
        let kpis = sample().kpis();
        assert_eq!(kpis.total_revenue, 1200.0 + 300.5 + 99.0 + 700.0);
        assert_eq!(kpis.total_expenses, 400.0 + 150.0 + 460.0);
        assert_eq!(kpis.profit, kpis.total_revenue - kpis.total_expenses);
        assert!(kpis.is_profitable());
        assert_eq!(kpis.order_count, 4);
        assert_eq!(kpis.worker_count, 2);
    }

    #[test]
    fn test_break_even_is_loss() {
        let kpis = Kpis::default();
        assert!(!kpis.is_profitable());
    }

    #[test]
    fn test_payment_counts() {
        let counts = sample().payment_counts();
        assert_eq!(
            counts,
            PaymentCounts {
                paid: 1,
                unpaid: 2,
                partial: 1
            }
        );
    }

    #[test]
    fn test_monthly_revenue_window() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 25).unwrap();
        let months = sample().monthly_revenue(today);
        let labels: Vec<&str> = months.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, ["Oct 24", "Nov 24", "Dec 24", "Jan 25", "Feb 25", "Mar 25"]);
        assert_eq!(months[4].revenue, 300.5);
        // Combined order plus tailoring dated by Created At
        assert_eq!(months[5].revenue, 1900.0);
        // June 2024 order falls outside the window
        assert_eq!(months.iter().map(|m| m.revenue).sum::<f64>(), 2200.5);
    }

    #[test]
    fn test_month_start_crosses_year() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        assert_eq!(month_start(today, 1), NaiveDate::from_ymd_opt(2024, 12, 1));
        assert_eq!(month_start(today, 13), NaiveDate::from_ymd_opt(2023, 12, 1));
    }

    #[test]
    fn test_recent_activity() {
        let activity = sample().recent_activity();
        assert_eq!(activity.len(), 4);
        match &activity[0] {
            Activity::Order { kind, customer, status, .. } => {
                assert_eq!(*kind, OrderKind::Tailoring);
                assert_eq!(customer, "Ravi");
                assert_eq!(status, "Pending");
            }
            other => panic!("expected order, got {:?}", other),
        }
        assert!(matches!(&activity[1], Activity::Order { customer, .. } if customer == "Meera"));
        assert!(matches!(
            &activity[3],
            Activity::WorkerPayment { worker, amount, .. } if worker == "Sita" && *amount == 460.0
        ));
    }

    #[test]
    fn test_recent_activity_capped() {
        let mut data = DashboardData::default();
        for _ in 0..7 {
            data.combined_orders.push(row(&[
                ("Customer Name", "Meera"),
                ("Timestamp", "2025-03-14T09:30:00Z"),
            ]));
        }
        for _ in 0..5 {
            data.payments
                .push(row(&[("Worker Name", "Sita"), ("Total Work Amount", "65")]));
        }
        let activity = data.recent_activity();
        assert_eq!(activity.len(), 8);
        let payments = activity
            .iter()
            .filter(|a| matches!(a, Activity::WorkerPayment { .. }))
            .count();
        assert_eq!(payments, 3);
    }
}
