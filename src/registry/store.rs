//! Client registry implementation
//!
//! The central store of connected clients, shared between the streaming
//! handlers and every concurrent delivery path.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::client::Client;
use crate::error::{Error, Result};

/// Registry of connected clients
///
/// Thread-safe via `RwLock`. Delivery paths take read access for lookups and
/// snapshots; registration and removal take the write lock briefly. No lock
/// is held across a delivery await.
pub struct ClientRegistry {
    /// Map of client identifier to client handle
    clients: RwLock<HashMap<String, Arc<Client>>>,
}

impl ClientRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            clients: RwLock::new(HashMap::new()),
        }
    }

    /// Register a client under its identifier
    ///
    /// Fails with [`Error::DuplicateClient`] when the identifier is already
    /// taken; the existing registration is left untouched.
    pub async fn insert(&self, client: Arc<Client>) -> Result<()> {
        let mut clients = self.clients.write().await;

        if clients.contains_key(client.id()) {
            return Err(Error::DuplicateClient {
                id: client.id().to_string(),
            });
        }

        tracing::debug!(client = %client.id(), "Client registered");
        clients.insert(client.id().to_string(), client);

        Ok(())
    }

    /// Look up a client by identifier
    pub async fn get(&self, id: &str) -> Option<Arc<Client>> {
        self.clients.read().await.get(id).cloned()
    }

    /// Remove a client by identifier
    ///
    /// Idempotent. Returns whether the client was present.
    pub async fn remove(&self, id: &str) -> bool {
        let removed = self.clients.write().await.remove(id).is_some();

        if removed {
            tracing::debug!(client = %id, "Client removed");
        }

        removed
    }

    /// Whether a client with the given identifier is registered
    pub async fn contains(&self, id: &str) -> bool {
        self.clients.read().await.contains_key(id)
    }

    /// Number of registered clients
    pub async fn len(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Whether the registry is empty
    pub async fn is_empty(&self) -> bool {
        self.clients.read().await.is_empty()
    }

    /// Point-in-time view of all registered clients, for fan-out
    ///
    /// No ordering guarantee over the entries.
    pub async fn snapshot(&self) -> Vec<Arc<Client>> {
        self.clients.read().await.values().cloned().collect()
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use tokio_test::assert_ok;

    fn client(id: &str) -> Arc<Client> {
        Arc::new(Client::new(Duration::from_secs(1), 3, Some(id.into())))
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let registry = ClientRegistry::new();

        assert_ok!(registry.insert(client("a")).await);

        let found = registry.get("a").await.unwrap();
        assert_eq!(found.id(), "a");
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_duplicate_insert_rejected() {
        let registry = ClientRegistry::new();

        registry.insert(client("a")).await.unwrap();
        let err = registry.insert(client("a")).await.unwrap_err();

        assert!(err.to_string().contains("already exists"));
        // The first registration survives.
        assert!(registry.contains("a").await);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let registry = ClientRegistry::new();

        registry.insert(client("a")).await.unwrap();

        assert!(registry.remove("a").await);
        assert!(!registry.remove("a").await);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let registry = ClientRegistry::new();

        assert!(registry.get("missing").await.is_none());
        assert!(!registry.contains("missing").await);
    }

    #[tokio::test]
    async fn test_snapshot_covers_all_clients() {
        let registry = ClientRegistry::new();

        registry.insert(client("a")).await.unwrap();
        registry.insert(client("b")).await.unwrap();

        let snapshot = registry.snapshot().await;
        let mut ids: Vec<&str> = snapshot.iter().map(|c| c.id()).collect();
        ids.sort_unstable();

        assert_eq!(ids, ["a", "b"]);
    }
}
