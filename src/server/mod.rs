//! Async TCP server using Tokio.
//!
//! Accepts TCP connections and answers exactly one request per connection,
//! then closes it. Each connection runs on its own task; the only state the
//! tasks share is the router's store lock.

use std::future::Future;
use std::net::SocketAddr;
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use crate::http::request::header_end;
use crate::http::{ParsedRequest, Response, StatusCode};
use crate::router::Router;

/// Errors produced by the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Initial read buffer capacity per connection.
const INITIAL_BUF_SIZE: usize = 1024;

/// Per-connection read limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionLimits {
    /// Largest request the server buffers before answering `413`.
    pub max_request_bytes: usize,
    /// How long to wait for a complete request.
    pub read_timeout: Duration,
}

impl Default for ConnectionLimits {
    fn default() -> Self {
        Self {
            max_request_bytes: 4096,
            read_timeout: Duration::from_secs(5),
        }
    }
}

// Why the read loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadState {
    Complete,
    Closed,
    TooLarge,
    TimedOut,
}

/// The userbox HTTP server.
///
/// # Examples
///
/// ```rust,no_run
/// use userbox::router::{Router, RouterOptions};
/// use userbox::server::Server;
/// use userbox::store::Store;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let router = Router::users(Store::default().into_shared(), RouterOptions::default());
///     let server = Server::bind("127.0.0.1:8080").await?;
///     server.run(router).await?;
///     Ok(())
/// }
/// ```
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    limits: ConnectionLimits,
}

impl Server {
    /// Binds the server to the given TCP address.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address cannot be bound
    /// (e.g. port already in use, insufficient permissions).
    pub async fn bind(addr: impl AsRef<str>) -> Result<Self, ServerError> {
        let addr = addr.as_ref();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.to_owned(),
                source: e,
            })?;
        let local_addr = listener.local_addr()?;
        Ok(Self {
            listener,
            local_addr,
            limits: ConnectionLimits::default(),
        })
    }

    /// Replaces the default per-connection limits.
    #[must_use]
    pub fn with_limits(mut self, limits: ConnectionLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serves requests until the process is terminated.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Io`] if the TCP listener itself fails.
    pub async fn run(self, router: Router) -> Result<(), ServerError> {
        self.run_until(router, std::future::pending()).await
    }

    /// Serves requests until `shutdown` resolves.
    ///
    /// Connections already accepted keep running on their own tasks.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Io`] if the TCP listener itself fails.
    pub async fn run_until<S>(self, router: Router, shutdown: S) -> Result<(), ServerError>
    where
        S: Future<Output = ()>,
    {
        let router = Arc::new(router);
        let limits = self.limits;
        let mut shutdown = pin!(shutdown);
        info!(address = %self.local_addr, "userbox listening");

        loop {
            let (stream, peer_addr) = tokio::select! {
                _ = &mut shutdown => {
                    info!("shutdown requested, no longer accepting connections");
                    return Ok(());
                }
                accepted = self.listener.accept() => match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        error!(error = %e, "failed to accept connection");
                        continue;
                    }
                },
            };

            debug!(peer = %peer_addr, "connection accepted");
            let router = Arc::clone(&router);

            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, peer_addr, router, limits).await {
                    warn!(peer = %peer_addr, error = %e, "connection closed with error");
                }
            });
        }
    }
}

/// Reads one request, answers it, and closes the connection.
async fn handle_connection(
    mut stream: TcpStream,
    peer_addr: SocketAddr,
    router: Arc<Router>,
    limits: ConnectionLimits,
) -> Result<(), std::io::Error> {
    let mut buf = BytesMut::with_capacity(INITIAL_BUF_SIZE.min(limits.max_request_bytes));

    let state = match tokio::time::timeout(
        limits.read_timeout,
        read_request(&mut stream, &mut buf, limits.max_request_bytes),
    )
    .await
    {
        Ok(state) => state?,
        Err(_) => ReadState::TimedOut,
    };

    if buf.is_empty() {
        // Nothing was sent; drop the connection without a response.
        debug!(peer = %peer_addr, ?state, "connection closed before any data");
        return Ok(());
    }

    let response = match classify(state, &buf, limits) {
        Ok(request) => {
            let response = router.dispatch(&request).await;
            info!(
                peer = %peer_addr,
                method = %request.method(),
                path = request.path(),
                status = response.status().as_u16(),
                "request"
            );
            response
        }
        Err(response) => {
            warn!(
                peer = %peer_addr,
                ?state,
                status = response.status().as_u16(),
                "rejected request"
            );
            response
        }
    };

    stream.write_all(&response.into_bytes()).await?;
    stream.flush().await?;
    stream.shutdown().await?;
    Ok(())
}

// Reads until the buffer holds a full request, the peer stops sending, or
// the size limit is reached.
async fn read_request(
    stream: &mut TcpStream,
    buf: &mut BytesMut,
    max_request_bytes: usize,
) -> Result<ReadState, std::io::Error> {
    loop {
        let bytes_read = stream.read_buf(buf).await?;
        if bytes_read == 0 {
            return Ok(ReadState::Closed);
        }
        if is_complete(buf) {
            return Ok(ReadState::Complete);
        }
        if buf.len() >= max_request_bytes {
            return Ok(ReadState::TooLarge);
        }
    }
}

// A request is complete once the header section has ended and the parser
// no longer wants more body bytes.
fn is_complete(buf: &[u8]) -> bool {
    header_end(buf).is_some()
        && !matches!(ParsedRequest::parse(buf), Err(e) if e.is_incomplete())
}

// Turns whatever was read into a request, or the error response to send.
fn classify(
    state: ReadState,
    buf: &[u8],
    limits: ConnectionLimits,
) -> Result<ParsedRequest, Response> {
    if state == ReadState::TooLarge {
        return Err(Response::error(
            StatusCode::PayloadTooLarge,
            &format!("request exceeds {} bytes", limits.max_request_bytes),
        ));
    }
    match ParsedRequest::parse(buf) {
        Ok(request) => Ok(request),
        Err(e) if state == ReadState::TimedOut && e.is_incomplete() => Err(Response::error(
            StatusCode::RequestTimeout,
            "timed out waiting for request body",
        )),
        Err(e) => Err(Response::error(StatusCode::BadRequest, &e.to_string())),
    }
}
