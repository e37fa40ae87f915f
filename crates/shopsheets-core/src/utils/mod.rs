//! Utility functions for number parsing, formatting and date handling.

pub mod format;

// Re-export commonly used functions at module level
pub use format::{
    format_date, format_inr, format_phone, parse_amount, parse_sheet_date, round2, truncate_string,
};
