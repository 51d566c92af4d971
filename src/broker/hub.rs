//! Broker core
//!
//! The [`Broker`] owns the client registry and implements the delivery
//! engine. Fan-out is concurrent: one slow client costs a broadcast at most
//! one timeout, not one timeout per slow client.

use std::sync::Arc;

use bytes::Bytes;
use futures::future;

use crate::broker::config::BrokerConfig;
use crate::broker::handlers::{ErrorHandler, ErrorResponse};
use crate::error::{Error, Result};
use crate::registry::ClientRegistry;

/// Server-push broadcast hub
///
/// Accepts long-lived streaming clients and fans submitted payloads out to
/// one addressed client or to all of them. Wrap in an `Arc` to share with
/// handler tasks.
pub struct Broker {
    config: BrokerConfig,
    registry: Arc<ClientRegistry>,
    error_handler: Option<ErrorHandler>,
}

impl Broker {
    /// Create a new broker with the given delivery policy
    pub fn new(config: BrokerConfig) -> Self {
        Self {
            config,
            registry: Arc::new(ClientRegistry::new()),
            error_handler: None,
        }
    }

    /// Install a custom boundary-error hook
    ///
    /// The hook receives the identifier the failing request carried (when
    /// any) and the error, and returns the response to send. Without a hook
    /// the handlers answer the error message as plain text.
    pub fn error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(Option<&str>, &Error) -> ErrorResponse + Send + Sync + 'static,
    {
        self.error_handler = Some(Box::new(handler));
        self
    }

    /// The broker's delivery policy
    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    /// Get a reference to the client registry
    pub fn registry(&self) -> &Arc<ClientRegistry> {
        &self.registry
    }

    /// Number of connected clients
    pub async fn client_count(&self) -> usize {
        self.registry.len().await
    }

    pub(super) fn boundary_error_hook(&self) -> Option<&ErrorHandler> {
        self.error_handler.as_ref()
    }

    /// Write `data` to the client with the given identifier
    ///
    /// A missing identifier is reported as [`Error::NoSuchClient`] with no
    /// side effect. A delivery failure propagates verbatim; unicast failures
    /// never evict, the caller decides.
    pub async fn broadcast_to(&self, id: &str, data: impl Into<Bytes>) -> Result<()> {
        let client = self
            .registry
            .get(id)
            .await
            .ok_or_else(|| Error::NoSuchClient { id: id.to_string() })?;

        client.write(data.into()).await
    }

    /// Write `data` to every connected client
    ///
    /// All clients are attempted; deliveries run concurrently and the call
    /// returns once every one has succeeded or timed out. A client whose
    /// failure exhausts its tolerance is evicted. Failures are aggregated
    /// into a single [`Error::Broadcast`].
    pub async fn broadcast(&self, data: impl Into<Bytes>) -> Result<()> {
        let data = data.into();
        let clients = self.registry.snapshot().await;

        let results =
            future::join_all(clients.iter().map(|client| client.write(data.clone()))).await;

        let mut failures = Vec::new();

        for (client, result) in clients.iter().zip(results) {
            if let Err(err) = result {
                if client.should_disconnect() {
                    self.registry.remove(client.id()).await;
                    tracing::warn!(
                        client = %client.id(),
                        "Client exceeded failure tolerance, disconnecting"
                    );
                }

                failures.push(err);
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::Broadcast(failures))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::client::Client;
    use tokio_test::assert_ok;

    fn broker(timeout_ms: u64, tolerance: u32) -> Broker {
        Broker::new(
            BrokerConfig::default()
                .timeout(Duration::from_millis(timeout_ms))
                .tolerance(tolerance),
        )
    }

    async fn connect(broker: &Broker, id: &str) -> Arc<Client> {
        let client = Arc::new(Client::new(
            broker.config().timeout,
            broker.config().tolerance,
            Some(id.into()),
        ));
        broker.registry().insert(Arc::clone(&client)).await.unwrap();
        client
    }

    #[tokio::test]
    async fn test_broadcast_empty_registry_is_ok() {
        let broker = broker(50, 3);

        assert_ok!(broker.broadcast("hello").await);
    }

    #[tokio::test]
    async fn test_broadcast_delivers_to_listener() {
        let broker = broker(1000, 3);
        let client = connect(&broker, "a").await;

        let events = client.listen();
        let reader = tokio::spawn(async move { events.recv_async().await });

        broker.broadcast("hello world").await.unwrap();

        assert_eq!(reader.await.unwrap().unwrap().as_ref(), b"hello world");
    }

    #[tokio::test]
    async fn test_broadcast_aggregates_failures() {
        let broker = broker(20, 5);
        connect(&broker, "a").await;
        connect(&broker, "b").await;

        let err = broker.broadcast("x").await.unwrap_err();
        let rendered = err.to_string();

        assert_eq!(rendered.lines().count(), 2);
        assert!(rendered.contains("timeout exceeded"));
        // Neither client has hit its tolerance yet.
        assert_eq!(broker.client_count().await, 2);
    }

    #[tokio::test]
    async fn test_broadcast_evicts_at_tolerance() {
        let broker = broker(20, 2);
        connect(&broker, "a").await;

        assert!(broker.broadcast("x").await.is_err());
        assert_eq!(broker.client_count().await, 1);

        assert!(broker.broadcast("x").await.is_err());
        assert_eq!(broker.client_count().await, 0);
    }

    #[tokio::test]
    async fn test_broadcast_runs_clients_concurrently() {
        let broker = broker(100, 5);
        connect(&broker, "a").await;
        connect(&broker, "b").await;
        connect(&broker, "c").await;

        let start = std::time::Instant::now();
        let _ = broker.broadcast("x").await;
        let elapsed = start.elapsed();

        // Three timed-out deliveries cost one timeout, not three.
        assert!(elapsed < Duration::from_millis(280));
    }

    #[tokio::test]
    async fn test_broadcast_to_unknown_client() {
        let broker = broker(50, 3);

        let err = broker.broadcast_to("9999", "x").await.unwrap_err();

        assert!(err.to_string().contains("no client with id"));
        assert_eq!(broker.client_count().await, 0);
    }

    #[tokio::test]
    async fn test_broadcast_to_without_listener_times_out() {
        let broker = broker(50, 3);
        connect(&broker, "1234").await;

        let err = broker.broadcast_to("1234", "x").await.unwrap_err();

        assert!(err.to_string().contains("timeout exceeded"));
        // Unicast failures never evict.
        assert_eq!(broker.client_count().await, 1);
    }

    #[tokio::test]
    async fn test_broadcast_to_delivers() {
        let broker = broker(1000, 3);
        let client = connect(&broker, "1234").await;

        let events = client.listen();
        let reader = tokio::spawn(async move { events.recv_async().await });

        broker.broadcast_to("1234", "hello").await.unwrap();

        assert_eq!(reader.await.unwrap().unwrap().as_ref(), b"hello");
    }
}
