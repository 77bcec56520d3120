//! HTTP request layer: server CRUD and derived-signal endpoints.
//!
//! Handlers validate ids, fetch from the store, and hand snapshots to
//! `servwatch_core::signals`. JSON shapes follow the dashboard contract
//! (`_id` as a string, `{"error": ...}` bodies on failure).

pub mod error;
pub mod handlers;

pub use error::ApiError;
