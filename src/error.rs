//! Broker error types
//!
//! One error enum shared by the client, registry and broker modules. The
//! message texts for timeout, unknown-client, duplicate-client and
//! streaming-unsupported failures are part of the observable contract and
//! are matched by consumers.

/// Convenience alias for results produced by this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for broker operations
#[derive(Debug, Clone)]
pub enum Error {
    /// A delivery attempt did not complete within the configured timeout
    WriteTimeout {
        /// Identifier of the client the write was addressed to
        id: String,
    },
    /// The unicast target is not registered
    NoSuchClient {
        /// Identifier the caller asked for
        id: String,
    },
    /// A client with the same identifier is already registered
    DuplicateClient {
        /// Identifier that collided
        id: String,
    },
    /// The transport cannot flush incrementally or observe disconnects
    StreamingUnsupported,
    /// The event payload could not be read from the request body
    PayloadRead(String),
    /// One or more deliveries failed during a broadcast
    ///
    /// Holds every per-client failure in the order the clients were
    /// attempted; the rendered message joins them with newlines.
    Broadcast(Vec<Error>),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::WriteTimeout { id } => {
                write!(f, "failed to write to client {}, timeout exceeded", id)
            }
            Error::NoSuchClient { id } => write!(f, "no client with id {} exists", id),
            Error::DuplicateClient { id } => write!(f, "a client with id {} already exists", id),
            Error::StreamingUnsupported => write!(f, "client does not support streaming"),
            Error::PayloadRead(msg) => write!(f, "failed to read event payload: {}", msg),
            Error::Broadcast(errors) => {
                let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
                write!(f, "{}", messages.join("\n"))
            }
        }
    }
}

impl std::error::Error for Error {}
