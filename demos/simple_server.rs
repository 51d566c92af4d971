//! Simple SSE broker server
//!
//! Run with: cargo run --example simple_server [BIND_ADDR]
//!
//! Examples:
//!   cargo run --example simple_server                  # binds to 127.0.0.1:8080
//!   cargo run --example simple_server 0.0.0.0:9090     # binds to 0.0.0.0:9090
//!
//! ## Connecting (receive events)
//!
//!   curl -N http://localhost:8080/connect
//!   curl -N 'http://localhost:8080/connect?id=1234'
//!
//! ## Broadcasting (send events)
//!
//!   curl -d 'hello world' http://localhost:8080/broadcast
//!   curl -d 'hello 1234' 'http://localhost:8080/broadcast?id=1234'
//!
//! The server speaks just enough HTTP/1.1 to carry the two routes; it is
//! also the reference implementation of the crate's transport traits over a
//! raw TCP stream.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};

use sse_rs::{Broker, BrokerConfig, Disconnect, DisconnectNotify, Request, ResponseWriter};

#[tokio::main]
async fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let addr: SocketAddr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:8080".to_string())
        .parse()
        .expect("invalid bind address");

    let broker = Arc::new(Broker::new(
        BrokerConfig::default()
            .timeout(Duration::from_secs(3))
            .tolerance(3),
    ));

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "SSE broker listening");

    loop {
        let (stream, peer) = listener.accept().await?;
        let broker = Arc::clone(&broker);

        tokio::spawn(async move {
            if let Err(err) = handle_connection(broker, stream).await {
                tracing::debug!(peer = %peer, error = %err, "Connection error");
            }
        });
    }
}

async fn handle_connection(broker: Arc<Broker>, stream: TcpStream) -> io::Result<()> {
    let (mut read_half, write_half) = stream.into_split();
    let (method, path, client_id, body) = read_request(&mut read_half).await?;

    // The read half has nothing left to deliver; repurpose it as the
    // disconnect detector.
    let (notify, signal) = Disconnect::channel();
    tokio::spawn(watch_disconnect(read_half, notify));

    let mut request = HttpRequest { client_id, body };
    let mut response = HttpResponse::new(write_half, signal);

    match (method.as_str(), path.as_str()) {
        ("GET", "/connect") => broker.client_handler(&request, &mut response).await,
        ("POST", "/broadcast") => broker.event_handler(&mut request, &mut response).await,
        _ => {
            response.set_status(404);
            response.write_all(b"not found").await?;
        }
    }

    response.finish().await
}

/// Wait for the peer to close its side of the connection.
async fn watch_disconnect(mut read_half: OwnedReadHalf, notify: DisconnectNotify) {
    let mut buf = [0u8; 256];

    loop {
        match read_half.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(_) => continue,
        }
    }

    notify.notify();
}

/// Read one request: method, path, `id` query parameter and body.
async fn read_request(
    stream: &mut OwnedReadHalf,
) -> io::Result<(String, String, Option<String>, Bytes)> {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];

    let head_end = loop {
        if let Some(pos) = buf.windows(4).position(|window| window == b"\r\n\r\n") {
            break pos;
        }
        if buf.len() > 64 * 1024 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "request head too large",
            ));
        }

        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof));
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
    let mut lines = head.lines();

    let request_line = lines
        .next()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "empty request"))?;
    let mut parts = request_line.split_whitespace();
    let method = parts
        .next()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "malformed request line"))?
        .to_string();
    let target = parts
        .next()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "malformed request line"))?;

    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path.to_string(), Some(query)),
        None => (target.to_string(), None),
    };

    let client_id = query
        .and_then(|query| {
            query
                .split('&')
                .find_map(|pair| pair.strip_prefix("id="))
                .map(String::from)
        })
        .filter(|id| !id.is_empty());

    let content_length = lines
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buf.split_off(head_end + 4);
    while body.len() < content_length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof));
        }
        body.extend_from_slice(&chunk[..n]);
    }
    body.truncate(content_length);

    Ok((method, path, client_id, Bytes::from(body)))
}

struct HttpRequest {
    client_id: Option<String>,
    body: Bytes,
}

impl Request for HttpRequest {
    fn client_id(&self) -> Option<String> {
        self.client_id.clone()
    }

    async fn read_body(&mut self) -> io::Result<Bytes> {
        Ok(self.body.clone())
    }
}

struct HttpResponse {
    writer: OwnedWriteHalf,
    status: u16,
    headers: Vec<(String, String)>,
    head_sent: bool,
    disconnect: Option<Disconnect>,
}

impl HttpResponse {
    fn new(writer: OwnedWriteHalf, disconnect: Disconnect) -> Self {
        Self {
            writer,
            status: 200,
            headers: Vec::new(),
            head_sent: false,
            disconnect: Some(disconnect),
        }
    }

    /// Write the status line and headers, once, before the first body byte.
    async fn send_head(&mut self) -> io::Result<()> {
        if self.head_sent {
            return Ok(());
        }
        self.head_sent = true;

        let mut head = format!("HTTP/1.1 {} {}\r\n", self.status, reason(self.status));
        for (name, value) in &self.headers {
            head.push_str(name);
            head.push_str(": ");
            head.push_str(value);
            head.push_str("\r\n");
        }
        if !self.headers.iter().any(|(name, _)| name == "Connection") {
            head.push_str("Connection: close\r\n");
        }
        head.push_str("\r\n");

        self.writer.write_all(head.as_bytes()).await
    }

    /// Make sure the head reaches the peer even for empty-body responses.
    async fn finish(&mut self) -> io::Result<()> {
        self.send_head().await?;
        self.writer.flush().await
    }
}

impl ResponseWriter for HttpResponse {
    fn insert_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }

    fn set_status(&mut self, code: u16) {
        self.status = code;
    }

    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.send_head().await?;
        self.writer.write_all(data).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        self.writer.flush().await
    }

    fn can_flush(&self) -> bool {
        true
    }

    fn disconnect_signal(&mut self) -> Option<Disconnect> {
        self.disconnect.take()
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "",
    }
}
