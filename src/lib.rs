//! Server-Sent Events broker
//!
//! A server-push broadcast hub: clients connect over long-lived streaming
//! exchanges, producers submit discrete payloads, and the broker fans each
//! payload out to one addressed client or to every connected client.
//!
//! # Architecture
//!
//! ```text
//!   POST /broadcast ──► event_handler ──► Broker ──► ClientRegistry
//!                                           │            │ lookup
//!                                           │            ▼
//!                                           │      Arc<Client> ── rendezvous
//!                                           │                     queue
//!   GET /connect ────► client_handler ◄─────┘                       │
//!                        │  one task per client, for its lifetime   │
//!                        └── listen().recv() ◄──────────────────────┘
//!                              │
//!                              ▼
//!                        data: <payload>\n\n   (write + flush per event)
//! ```
//!
//! Delivery to each client is bounded by a configurable timeout; a client
//! that times out `tolerance` times in a row is evicted during the next
//! broadcast. The transport is abstracted behind the [`transport`] traits,
//! so the handlers plug into any host server that can flush incrementally
//! and observe peer disconnects.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use sse_rs::{Broker, BrokerConfig};
//!
//! # async fn run() -> sse_rs::Result<()> {
//! let broker = Broker::new(BrokerConfig::default().timeout(Duration::from_secs(3)));
//!
//! // Wire broker.client_handler / broker.event_handler into your server,
//! // then push payloads from anywhere:
//! broker.broadcast("hello world").await?;
//! # Ok(())
//! # }
//! ```

pub mod broker;
pub mod client;
pub mod error;
pub mod registry;
pub mod transport;

pub use broker::{Broker, BrokerConfig, ErrorHandler, ErrorResponse};
pub use client::Client;
pub use error::{Error, Result};
pub use registry::ClientRegistry;
pub use transport::{Disconnect, DisconnectNotify, Request, ResponseWriter};
