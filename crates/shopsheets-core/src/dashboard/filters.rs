//! Worker list search and payment history filters.

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{PaymentRecord, Worker};
use crate::utils::{parse_sheet_date, round2};

/// Workers matching `term` on name, phone or address. A blank term keeps all.
pub fn search_workers<'a>(workers: &'a [Worker], term: &str) -> Vec<&'a Worker> {
    workers.iter().filter(|w| w.matches(term)).collect()
}

/// `"3 workers found"` or `"Showing 1 of 3 workers"`.
pub fn count_label(shown: usize, total: usize, noun: &str) -> String {
    let plural = if total == 1 { "" } else { "s" };
    if shown == total {
        format!("{} {}{} found", total, noun, plural)
    } else {
        format!("Showing {} of {} {}s", shown, total, noun)
    }
}

/// Payment history filters. Every set field must match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentFilter {
    /// Exact worker name.
    pub worker: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// Case-insensitive substring of the notes.
    pub notes: Option<String>,
}

impl PaymentFilter {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Rows whose date cannot be read are not excluded by the date range.
    pub fn matches(&self, record: &PaymentRecord) -> bool {
        if let Some(worker) = self.worker.as_deref().filter(|w| !w.is_empty()) {
            if record.worker_name != worker {
                return false;
            }
        }

        if let Some(date) = parse_sheet_date(&record.date).map(|dt| dt.date()) {
            if self.from.is_some_and(|from| date < from) || self.to.is_some_and(|to| date > to) {
                return false;
            }
        }

        match self.notes.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            Some(term) => record.notes.to_lowercase().contains(&term.to_lowercase()),
            None => true,
        }
    }

    pub fn apply<'a>(&self, records: &'a [PaymentRecord]) -> Vec<&'a PaymentRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

/// Totals over the filtered payment rows.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PaymentSummary {
    pub total_work: f64,
    pub total_advance: f64,
    pub total_remaining: f64,
    pub entries: usize,
}

impl PaymentSummary {
    pub fn of<'a>(records: impl IntoIterator<Item = &'a PaymentRecord>) -> Self {
        let mut summary = Self::default();
        for record in records {
            summary.total_work += record.total_work_amount;
            summary.total_advance += record.advance_taken;
            summary.total_remaining += record.remaining_payment;
            summary.entries += 1;
        }
        summary.total_work = round2(summary.total_work);
        summary.total_advance = round2(summary.total_advance);
        summary.total_remaining = round2(summary.total_remaining);
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn worker(name: &str, phone: &str, address: &str) -> Worker {
        Worker {
            name: name.to_string(),
            phone: phone.to_string(),
            address: address.to_string(),
            date_added: String::new(),
        }
    }

    fn payment(date: &str, worker: &str, work: f64, advance: f64, notes: &str) -> PaymentRecord {
        PaymentRecord {
            date: date.to_string(),
            worker_name: worker.to_string(),
            paint_count: 0.0,
            shirt_count: 0.0,
            total_work_amount: work,
            advance_taken: advance,
            remaining_payment: work - advance,
            notes: notes.to_string(),
        }
    }

    fn history() -> Vec<PaymentRecord> {
        vec![
            payment("2025-03-01", "Ravi", 460.0, 200.0, "Festival rush"),
            payment("2025-03-05", "Sita", 325.0, 0.0, ""),
            payment("2025-03-09", "Ravi", 110.0, 50.0, "festival overtime"),
            payment("sometime", "Ravi", 65.0, 0.0, ""),
        ]
    }

    #[test]
    fn test_search_workers() {
        let workers = vec![
            worker("Ravi Kumar", "9845012345", "Jayanagar"),
            worker("Sita", "9900112233", "MG Road"),
        ];
        assert_eq!(search_workers(&workers, "ravi").len(), 1);
        assert_eq!(search_workers(&workers, "99001")[0].name, "Sita");
        assert_eq!(search_workers(&workers, "mg road")[0].name, "Sita");
        assert_eq!(search_workers(&workers, "  ").len(), 2);
    }

    #[test]
    fn test_filter_worker_and_dates() {
        let records = history();
        let filter = PaymentFilter {
            worker: Some("Ravi".to_string()),
            from: NaiveDate::from_ymd_opt(2025, 3, 2),
            to: NaiveDate::from_ymd_opt(2025, 3, 31),
            notes: None,
        };
        let kept = filter.apply(&records);
        // Undated row survives the range
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].date, "2025-03-09");
        assert_eq!(kept[1].date, "sometime");
    }

    #[test]
    fn test_filter_notes_case_insensitive() {
        let records = history();
        let filter = PaymentFilter {
            notes: Some("FESTIVAL".to_string()),
            ..PaymentFilter::default()
        };
        assert_eq!(filter.apply(&records).len(), 2);
        assert!(PaymentFilter::default().is_empty());
        assert_eq!(PaymentFilter::default().apply(&records).len(), 4);
    }

    #[test]
    fn test_summary_and_labels() {
        let records = history();
        let summary = PaymentSummary::of(&records);
        assert_eq!(summary.total_work, 960.0);
        assert_eq!(summary.total_advance, 250.0);
        assert_eq!(summary.total_remaining, 710.0);
        assert_eq!(summary.entries, 4);

        assert_eq!(count_label(4, 4, "payment record"), "4 payment records found");
        assert_eq!(count_label(1, 1, "worker"), "1 worker found");
        assert_eq!(count_label(2, 4, "record"), "Showing 2 of 4 records");
    }
}
