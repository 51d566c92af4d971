//! Boundary handlers
//!
//! The two HTTP-facing operations of the broker: a long-lived streaming
//! handler that pins one task per connected client for the connection's
//! whole lifetime, and a short-lived submission handler that turns a posted
//! payload into a broadcast or unicast.

use std::sync::Arc;

use crate::broker::hub::Broker;
use crate::client::Client;
use crate::error::Error;
use crate::transport::{
    frame, Request, ResponseWriter, STATUS_INTERNAL_ERROR, STATUS_OK,
};

/// Response produced by an [`ErrorHandler`].
#[derive(Debug, Clone)]
pub struct ErrorResponse {
    /// Status code to answer with
    pub status: u16,
    /// Plain-text response body
    pub body: String,
}

/// Hook for customizing boundary error responses.
///
/// Receives the identifier the failing request carried (when any) and the
/// error; returns the response to send.
pub type ErrorHandler = Box<dyn Fn(Option<&str>, &Error) -> ErrorResponse + Send + Sync>;

impl Broker {
    /// Streaming handler: connect a client and stream events to it
    ///
    /// Runs for the connection's entire lifetime. The transport must support
    /// incremental flushing and disconnect observation; otherwise the
    /// request is refused and no client is created. The loop waits on
    /// whichever comes first, a payload from the client's queue or a
    /// liveness tick, and exits as soon as the client is no longer
    /// registered (peer disconnect or broadcast-triggered eviction).
    pub async fn client_handler<R, W>(&self, req: &R, res: &mut W)
    where
        R: Request,
        W: ResponseWriter,
    {
        let requested_id = req.client_id();

        if !res.can_flush() {
            self.respond_error(
                res,
                requested_id.as_deref(),
                &Error::StreamingUnsupported,
                STATUS_INTERNAL_ERROR,
            )
            .await;
            return;
        }

        let Some(disconnect) = res.disconnect_signal() else {
            self.respond_error(
                res,
                requested_id.as_deref(),
                &Error::StreamingUnsupported,
                STATUS_INTERNAL_ERROR,
            )
            .await;
            return;
        };

        res.insert_header("Content-Type", "text/event-stream");
        res.insert_header("Cache-Control", "no-cache");
        res.insert_header("Connection", "keep-alive");
        res.insert_header("Access-Control-Allow-Origin", "*");

        let client = Arc::new(Client::new(
            self.config().timeout,
            self.config().tolerance,
            requested_id,
        ));
        let id = client.id().to_string();

        if let Err(err) = self.registry().insert(Arc::clone(&client)).await {
            self.respond_error(res, Some(&id), &err, STATUS_INTERNAL_ERROR)
                .await;
            return;
        }

        tracing::info!(client = %id, "Client connected");

        // Unregister as soon as the peer goes away; the loop below observes
        // the absence on its next pass and terminates.
        let watcher = tokio::spawn({
            let registry = Arc::clone(self.registry());
            let id = id.clone();

            async move {
                disconnect.recv().await;
                registry.remove(&id).await;
            }
        });

        let events = client.listen();

        while self.registry().contains(&id).await {
            tokio::select! {
                event = events.recv_async() => {
                    let Ok(data) = event else { break };

                    let frame = frame::encode(&data);
                    if res.write_all(&frame).await.is_err() || res.flush().await.is_err() {
                        tracing::debug!(client = %id, "Transport write failed");
                        break;
                    }
                }
                // Liveness tick: nothing to deliver, re-check registration
                // instead of blocking on an empty queue forever.
                _ = tokio::time::sleep(self.config().timeout) => {}
            }
        }

        // Runs on every exit path; a no-op when the watcher or a broadcast
        // already removed the client.
        self.registry().remove(&id).await;
        watcher.abort();

        tracing::info!(client = %id, "Client disconnected");
    }

    /// Submission handler: accept one event and deliver it
    ///
    /// Reads the full request body as the payload, then unicasts when the
    /// request carries an identifier and broadcasts otherwise. Success is a
    /// 200 with an empty body.
    pub async fn event_handler<R, W>(&self, req: &mut R, res: &mut W)
    where
        R: Request,
        W: ResponseWriter,
    {
        let target = req.client_id();

        let data = match req.read_body().await {
            Ok(data) => data,
            Err(err) => {
                self.respond_error(
                    res,
                    target.as_deref(),
                    &Error::PayloadRead(err.to_string()),
                    STATUS_INTERNAL_ERROR,
                )
                .await;
                return;
            }
        };

        let result = match &target {
            Some(id) => self.broadcast_to(id, data).await,
            None => self.broadcast(data).await,
        };

        if let Err(err) = result {
            self.respond_error(res, target.as_deref(), &err, STATUS_INTERNAL_ERROR)
                .await;
            return;
        }

        res.set_status(STATUS_OK);
    }

    /// Route a failure through the boundary-error interface.
    async fn respond_error<W>(&self, res: &mut W, client_id: Option<&str>, err: &Error, status: u16)
    where
        W: ResponseWriter,
    {
        let response = match self.boundary_error_hook() {
            Some(handler) => handler(client_id, err),
            None => ErrorResponse {
                status,
                body: err.to_string(),
            },
        };

        res.insert_header("Content-Type", "text/plain; charset=utf-8");
        res.set_status(response.status);

        if let Err(write_err) = res.write_all(response.body.as_bytes()).await {
            tracing::debug!(error = %write_err, "Failed to write error response");
        }
    }
}
