//! Client registry
//!
//! Concurrent store of live clients keyed by identifier. Broadcast paths
//! look clients up here; each streaming handler inserts its client on
//! connect and removes it on every exit path.
//!
//! # Architecture
//!
//! ```text
//!                    Arc<ClientRegistry>
//!               ┌───────────────────────────┐
//!               │ clients: HashMap<String,  │
//!               │   Arc<Client>>            │
//!               └─────────────┬─────────────┘
//!                             │
//!          ┌──────────────────┼──────────────────┐
//!          │                  │                  │
//!          ▼                  ▼                  ▼
//!     [Producer]        [Stream task]      [Stream task]
//!     broadcast()       listen().recv()    listen().recv()
//!          │                  ▲                  ▲
//!          └── Client::write ─┴──────────────────┘
//! ```
//!
//! Every operation is a single lock acquisition, so a given identifier maps
//! to at most one live client and a duplicate insertion fails loudly rather
//! than silently overwriting.

pub mod store;

pub use store::ClientRegistry;
