//! Client side of the shop's Google Sheets backend.
//!
//! Writes go to Apps Script web apps through [`ScriptClient`], one per sheet
//! family. Reads for the dashboard go to the public Sheets values API through
//! [`SheetsClient`], which routes every request through the offline cache.
//!
//! Requests are sent once with a fixed timeout. A save that times out may
//! still have been written, so a retry can append a duplicate row.

pub mod client;
pub mod error;
pub mod reply;
pub mod sheets;

pub use client::{ScriptClient, ScriptClients, DEFAULT_TIMEOUT};
pub use error::ApiError;
pub use reply::{ListReply, SaveOutcome, ScriptReply};
pub use sheets::SheetsClient;
