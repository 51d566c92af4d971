//! Transport boundary
//!
//! The broker is transport-agnostic. A host server implements [`Request`]
//! and [`ResponseWriter`] for its own request/response types and hands them
//! to the broker's handlers; everything protocol-specific (routing, header
//! syntax, connection management) stays on the host's side of these traits.
//!
//! Streaming requires two capabilities beyond plain responses: incremental
//! flushing and disconnect observation. Both default to "unsupported" so a
//! minimal transport compiles, and the streaming handler refuses such
//! transports at connect time.

use std::io;

use bytes::Bytes;
use tokio::sync::oneshot;

pub mod frame;

/// Status code for successful submissions.
pub const STATUS_OK: u16 = 200;

/// Status code used for boundary failures.
pub const STATUS_INTERNAL_ERROR: u16 = 500;

/// Inbound exchange as seen by the broker's handlers.
#[allow(async_fn_in_trait)]
pub trait Request: Send {
    /// Value of the `id` query parameter, when present and non-empty.
    fn client_id(&self) -> Option<String>;

    /// Read the entire request body.
    async fn read_body(&mut self) -> io::Result<Bytes>;
}

/// Write side of an exchange.
///
/// Headers and status must be recorded before the first body write reaches
/// the peer; transports buffer them until then.
#[allow(async_fn_in_trait)]
pub trait ResponseWriter: Send {
    /// Set a response header.
    fn insert_header(&mut self, name: &str, value: &str);

    /// Set the response status code.
    fn set_status(&mut self, code: u16);

    /// Write response body bytes.
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Push written bytes to the peer immediately.
    ///
    /// Transports that buffer whole responses keep the default, which
    /// refuses.
    async fn flush(&mut self) -> io::Result<()> {
        Err(io::Error::from(io::ErrorKind::Unsupported))
    }

    /// Whether [`ResponseWriter::flush`] actually reaches the peer.
    ///
    /// Checked once, before a streaming exchange starts writing.
    fn can_flush(&self) -> bool {
        false
    }

    /// Hand out the disconnect signal for the underlying connection.
    ///
    /// `None` marks the transport as unable to observe peer disconnects.
    /// Called at most once per exchange.
    fn disconnect_signal(&mut self) -> Option<Disconnect> {
        None
    }
}

/// Resolves when the peer closes the underlying connection.
///
/// Transports create a pair with [`Disconnect::channel`], keep the
/// [`DisconnectNotify`] half next to the connection state, and hand this
/// half out through [`ResponseWriter::disconnect_signal`].
pub struct Disconnect {
    rx: oneshot::Receiver<()>,
}

impl Disconnect {
    /// Create a connected notifier/signal pair.
    pub fn channel() -> (DisconnectNotify, Disconnect) {
        let (tx, rx) = oneshot::channel();

        (DisconnectNotify { tx }, Disconnect { rx })
    }

    /// Wait for the disconnect.
    ///
    /// Also resolves when the notifier is dropped, so a transport tearing
    /// down its connection state cannot strand a listener.
    pub async fn recv(self) {
        let _ = self.rx.await;
    }
}

/// Transport-held half of a disconnect signal.
pub struct DisconnectNotify {
    tx: oneshot::Sender<()>,
}

impl DisconnectNotify {
    /// Fire the signal.
    pub fn notify(self) {
        let _ = self.tx.send(());
    }
}
