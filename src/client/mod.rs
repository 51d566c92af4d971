//! Connected-client handles
//!
//! Each streaming client is represented server-side by a [`Client`] holding
//! its delivery queue and failure-tolerance state.

pub mod handle;

pub use handle::Client;
