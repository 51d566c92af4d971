//! Server-push broker
//!
//! The broker owns the registry of connected clients and the delivery
//! engine: broadcast to every client, unicast to one addressed client, and
//! the two boundary handlers that connect clients and accept submitted
//! events.

pub mod config;
pub mod handlers;
pub mod hub;

pub use config::BrokerConfig;
pub use handlers::{ErrorHandler, ErrorResponse};
pub use hub::Broker;
