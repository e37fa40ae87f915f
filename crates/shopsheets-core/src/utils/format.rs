//! Number parsing and display helpers shared by forms and the dashboard.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Parse the leading number of a cell or form value.
///
/// Sheet cells and form fields are free text; like a lenient numeric parse,
/// `"120.5 m"` yields 120.5 and anything without a leading number yields 0.
pub fn parse_amount(value: &str) -> f64 {
    let trimmed = value.trim().replace(',', "");
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    for (i, c) in trimmed.char_indices() {
        match c {
            '+' | '-' if i == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = i + c.len_utf8();
    }
    if !seen_digit {
        return 0.0;
    }
    trimmed[..end].parse::<f64>().unwrap_or(0.0)
}

/// Round to 2 decimal places (paise).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Format an amount in rupees with Indian digit grouping, e.g. `₹1,23,456.50`
pub fn format_inr(amount: f64) -> String {
    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let frac = cents % 100;

    let grouped = if whole.len() <= 3 {
        whole
    } else {
        let (head, last3) = whole.split_at(whole.len() - 3);
        let mut parts: Vec<String> = Vec::new();
        let mut rest = head;
        while rest.len() > 2 {
            let (h, pair) = rest.split_at(rest.len() - 2);
            parts.push(pair.to_string());
            rest = h;
        }
        if !rest.is_empty() {
            parts.push(rest.to_string());
        }
        parts.reverse();
        format!("{},{}", parts.join(","), last3)
    };

    format!("{}₹{}.{:02}", if negative { "-" } else { "" }, grouped, frac)
}

/// Format a phone number for display
/// Normalizes 10-digit Indian mobile numbers (optionally prefixed with 91/0) to XXXXX XXXXX
pub fn format_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    match digits.len() {
        10 => format!("{} {}", &digits[0..5], &digits[5..10]),
        11 if digits.starts_with('0') => format!("{} {}", &digits[1..6], &digits[6..11]),
        12 if digits.starts_with("91") => format!("+91 {} {}", &digits[2..7], &digits[7..12]),
        _ => phone.to_string(), // Return original if can't format
    }
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Parse the date formats that show up in sheet cells.
///
/// Apps Script writes timestamps as RFC 3339 or `M/D/YYYY H:MM:SS`, forms
/// submit `YYYY-MM-DD`. Returns `None` for anything else.
pub fn parse_sheet_date(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    const DATETIME_FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
        "%d/%m/%Y %H:%M:%S",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt);
        }
    }
    const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%d-%m-%Y"];
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(value, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Format a date string to a more readable format
pub fn format_date(date: &str) -> String {
    match parse_sheet_date(date) {
        Some(dt) => dt.format("%d %b %Y").to_string(),
        None => date.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount_leading_number() {
        assert_eq!(parse_amount("120.5"), 120.5);
        assert_eq!(parse_amount(" 42 meters"), 42.0);
        assert_eq!(parse_amount("1,250"), 1250.0);
        assert_eq!(parse_amount("-15"), -15.0);
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("₹100"), 0.0);
        assert_eq!(parse_amount("abc"), 0.0);
        assert_eq!(parse_amount("."), 0.0);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(10.005_1), 10.01);
        assert_eq!(round2(3.0 * 33.333), 100.0);
        assert_eq!(round2(0.1 + 0.2), 0.3);
    }

    #[test]
    fn test_format_inr_grouping() {
        assert_eq!(format_inr(0.0), "₹0.00");
        assert_eq!(format_inr(999.5), "₹999.50");
        assert_eq!(format_inr(1000.0), "₹1,000.00");
        assert_eq!(format_inr(123456.5), "₹1,23,456.50");
        assert_eq!(format_inr(12345678.0), "₹1,23,45,678.00");
        assert_eq!(format_inr(-2500.0), "-₹2,500.00");
    }

    #[test]
    fn test_format_phone() {
        assert_eq!(format_phone("9876543210"), "98765 43210");
        assert_eq!(format_phone("09876543210"), "98765 43210");
        assert_eq!(format_phone("+91 98765-43210"), "+91 98765 43210");
        assert_eq!(format_phone("123"), "123"); // Too short, return as-is
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
        assert_eq!(truncate_string("Hello World", 8), "Hello...");
        assert_eq!(truncate_string("Hi", 2), "Hi");
    }

    #[test]
    fn test_parse_sheet_date_formats() {
        let iso = parse_sheet_date("2025-03-14").unwrap();
        assert_eq!(iso.format("%Y-%m-%d").to_string(), "2025-03-14");

        let stamp = parse_sheet_date("2025-03-14T10:30:00.000Z").unwrap();
        assert_eq!(stamp.format("%H:%M").to_string(), "10:30");

        let us = parse_sheet_date("3/14/2025 09:15:00").unwrap();
        assert_eq!(us.format("%Y-%m-%d").to_string(), "2025-03-14");

        assert!(parse_sheet_date("").is_none());
        assert!(parse_sheet_date("next tuesday").is_none());
    }
}
