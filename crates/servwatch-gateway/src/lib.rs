//! servwatch gateway library entry.
//!
//! Wires the server store, the metrics simulator, and the HTTP request layer
//! into one service. Consumed by the binary (`main.rs`) and by integration
//! tests.

pub mod api;
pub mod app_state;
pub mod config;
pub mod obs;
pub mod ops;
pub mod router;
pub mod simulator;
pub mod store;
