//! Connected-client handle
//!
//! A [`Client`] is the server-side half of one streaming connection. It owns
//! the hand-off queue between the broker's delivery paths and the client's
//! streaming loop, along with the failure counter that drives eviction.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use bytes::Bytes;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Server-side handle for one streaming client
///
/// The queue is a rendezvous channel: [`Client::write`] only completes when
/// the streaming loop is actively receiving, so a write observes (via its
/// timeout) whether the consumer is really there. Payloads are `Bytes`, so
/// fanning the same payload out to many clients shares one allocation.
pub struct Client {
    /// Unique identifier, caller-supplied or generated
    id: String,

    /// Send side of the hand-off queue
    tx: flume::Sender<Bytes>,

    /// Receive side, cloned out through [`Client::listen`]
    rx: flume::Receiver<Bytes>,

    /// Bound on a single delivery attempt
    timeout: Duration,

    /// Consecutive delivery failures since the last success
    failures: AtomicU32,

    /// Failure count at which the client becomes disconnect-worthy
    tolerance: u32,
}

impl Client {
    /// Create a new client handle
    ///
    /// An absent or empty `id` gets a generated identifier instead.
    pub fn new(timeout: Duration, tolerance: u32, id: Option<String>) -> Self {
        let (tx, rx) = flume::bounded(0);

        let id = id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Self {
            id,
            tx,
            rx,
            timeout,
            failures: AtomicU32::new(0),
            tolerance,
        }
    }

    /// The client's unique identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Receive side of the hand-off queue
    ///
    /// Intended to be drained by exactly one consumer for the client's
    /// lifetime; concurrent consumers would split deliveries between them.
    pub fn listen(&self) -> flume::Receiver<Bytes> {
        self.rx.clone()
    }

    /// Attempt to hand `data` to the streaming loop
    ///
    /// Waits at most the configured timeout for the consumer to pick the
    /// payload up. Success resets the failure counter; a timeout increments
    /// it and returns [`Error::WriteTimeout`]. Never partially delivers and
    /// never retries internally.
    pub async fn write(&self, data: Bytes) -> Result<()> {
        match tokio::time::timeout(self.timeout, self.tx.send_async(data)).await {
            Ok(Ok(())) => {
                self.failures.store(0, Ordering::Relaxed);
                Ok(())
            }
            Ok(Err(_)) | Err(_) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                Err(Error::WriteTimeout {
                    id: self.id.clone(),
                })
            }
        }
    }

    /// Whether the client has exhausted its failure tolerance
    pub fn should_disconnect(&self) -> bool {
        self.failures.load(Ordering::Relaxed) >= self.tolerance
    }
}
