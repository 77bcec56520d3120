//! Server Store boundary.
//!
//! The simulator and the request layer only see this trait. Implementations
//! must make every single call atomic for the one document it touches; no
//! atomicity is promised across documents or across calls.

mod memory;

use async_trait::async_trait;

use servwatch_core::error::Result;
use servwatch_core::{NewServer, Server, ServerId, ServerUpdate};

pub use memory::InMemoryServerStore;

#[async_trait]
pub trait ServerStore: Send + Sync {
    /// Point-in-time snapshot of every server. May race concurrent writers.
    async fn list(&self) -> Result<Vec<Server>>;

    /// `NotFound` when absent.
    async fn get(&self, id: &ServerId) -> Result<Server>;

    /// Insert a new document; the store assigns the id.
    async fn insert(&self, doc: NewServer) -> Result<ServerId>;

    /// Partial update. Returns whether anything changed; `NotFound` when absent.
    async fn update(&self, id: &ServerId, update: ServerUpdate) -> Result<bool>;

    /// `NotFound` when absent.
    async fn delete(&self, id: &ServerId) -> Result<()>;

    async fn count(&self) -> Result<usize>;
}
