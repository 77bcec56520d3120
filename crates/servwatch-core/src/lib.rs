//! servwatch core: entity model, error types, and the derived-signal engine.
//!
//! This crate defines the data contracts shared by the gateway, the metrics
//! simulator and any tooling that reads server snapshots. It carries no
//! transport or runtime dependencies; randomness and time are injected by
//! the caller so every signal is reproducible under test.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths surface as `ServWatchError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod clock;
pub mod error;
pub mod model;
pub mod signals;

/// Shared result type.
pub use error::{Result, ServWatchError};
pub use model::{Metrics, NewServer, Server, ServerId, ServerUpdate};
