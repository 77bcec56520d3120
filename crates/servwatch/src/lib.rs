//! Top-level facade crate for servwatch.
//!
//! Re-exports the core model/signal types and the gateway library so users can depend on a single crate.

pub mod core {
    pub use servwatch_core::*;
}

pub mod gateway {
    pub use servwatch_gateway::*;
}
