use async_trait::async_trait;
use dashmap::DashMap;

use servwatch_core::error::{Result, ServWatchError};
use servwatch_core::{NewServer, Server, ServerId, ServerUpdate};

use super::ServerStore;

/// In-process store: `ServerId -> Server`.
///
/// Each update holds the entry's shard lock for the duration of one
/// `ServerUpdate::apply`, which gives per-document atomicity. `list` clones
/// entries one by one and is not a consistent cut across documents.
#[derive(Default)]
pub struct InMemoryServerStore {
    servers: DashMap<ServerId, Server>,
}

impl InMemoryServerStore {
    pub fn new() -> Self {
        Self { servers: DashMap::new() }
    }
}

fn not_found(id: &ServerId) -> ServWatchError {
    ServWatchError::NotFound(format!("server {id}"))
}

#[async_trait]
impl ServerStore for InMemoryServerStore {
    async fn list(&self) -> Result<Vec<Server>> {
        Ok(self.servers.iter().map(|r| r.value().clone()).collect())
    }

    async fn get(&self, id: &ServerId) -> Result<Server> {
        self.servers
            .get(id)
            .map(|r| r.value().clone())
            .ok_or_else(|| not_found(id))
    }

    async fn insert(&self, doc: NewServer) -> Result<ServerId> {
        let id = ServerId::generate();
        self.servers.insert(id, doc.into_server(id));
        Ok(id)
    }

    async fn update(&self, id: &ServerId, update: ServerUpdate) -> Result<bool> {
        let mut entry = self.servers.get_mut(id).ok_or_else(|| not_found(id))?;
        Ok(update.apply(entry.value_mut()))
    }

    async fn delete(&self, id: &ServerId) -> Result<()> {
        self.servers.remove(id).map(|_| ()).ok_or_else(|| not_found(id))
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.servers.len())
    }
}
