//! Client-side state that outlives a single command.
//!
//! This module provides:
//! - `SessionStore`: a JSON key/value file holding the combined-order flow
//!   and form autosave snapshots
//! - `ApiKeyStore`: the Sheets API key in the OS keychain
//!
//! Nothing here is a source of truth; the sheets are.

pub mod credentials;
pub mod session;

pub use credentials::ApiKeyStore;
pub use session::{keys, AutosaveSnapshot, SessionStore};
