//! Core library for the shop manager.
//!
//! Orders, workers, payments and expenses are appended to Google Sheets
//! through Apps Script endpoints. This crate holds everything that is not
//! terminal UI:
//!
//! - `api`: typed Apps Script client and public Sheets read client
//! - `models`: orders, workers, payment entries, expenses
//! - `forms`: input drafts, validation and derived totals
//! - `saga`: the combined-order flow linking fabric and tailoring sub-orders
//! - `store`: client-side session store and keychain-backed API key
//! - `cache`: offline response cache and per-route fetch strategies
//! - `dashboard`: sheet parsing and KPI aggregation
//! - `config`: endpoint and spreadsheet configuration

pub mod api;
pub mod cache;
pub mod config;
pub mod dashboard;
pub mod forms;
pub mod models;
pub mod saga;
pub mod store;
pub mod utils;

pub use config::Config;
