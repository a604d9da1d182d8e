//! Stream transports: Unix domain sockets and TCP.
//!
//! No JSON-RPC semantics live here. A transport only has to provide a duplex
//! byte channel; [`RpcStream`] erases which one is underneath so the session
//! layer stays transport-blind.
//!
//! # Example
//!
//! ```ignore
//! use wirerpc::{Endpoint, RpcListener, RpcStream};
//!
//! let endpoint = Endpoint::local(wirerpc::local_socket_path("demo"));
//! let listener = RpcListener::bind(&endpoint).await?;
//! let stream = listener.accept().await?;
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::{TcpListener, TcpStream};
#[cfg(unix)]
use tokio::net::{UnixListener, UnixStream};

use crate::error::{Result, RpcError};

/// Where a server listens or a client connects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Filesystem-named local domain socket.
    #[cfg(unix)]
    Local(PathBuf),
    /// TCP socket address.
    Tcp(SocketAddr),
}

impl Endpoint {
    /// A local domain socket endpoint.
    #[cfg(unix)]
    pub fn local(path: impl Into<PathBuf>) -> Endpoint {
        Endpoint::Local(path.into())
    }

    /// A TCP endpoint.
    pub fn tcp(addr: SocketAddr) -> Endpoint {
        Endpoint::Tcp(addr)
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            #[cfg(unix)]
            Endpoint::Local(path) => write!(f, "local:{}", path.display()),
            Endpoint::Tcp(addr) => write!(f, "tcp:{}", addr),
        }
    }
}

/// Generate a unique local socket path for this process.
///
/// Format: `/tmp/wirerpc-{tag}-{pid}-{random}.sock`.
pub fn local_socket_path(tag: &str) -> PathBuf {
    let pid = std::process::id();
    PathBuf::from(format!("/tmp/wirerpc-{}-{}-{:x}.sock", tag, pid, rand_u64()))
}

/// Simple random u64 using system time and process ID.
fn rand_u64() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);

    let pid = std::process::id() as u64;
    nanos.wrapping_mul(0x517cc1b727220a95) ^ pid
}

/// A bound listener for either transport.
pub enum RpcListener {
    /// Unix domain socket listener; the socket file is removed on drop.
    #[cfg(unix)]
    Local { listener: UnixListener, path: PathBuf },
    /// TCP listener.
    Tcp(TcpListener),
}

impl RpcListener {
    /// Bind to an endpoint.
    ///
    /// A stale socket file at a local endpoint is removed before binding.
    pub async fn bind(endpoint: &Endpoint) -> Result<RpcListener> {
        match endpoint {
            #[cfg(unix)]
            Endpoint::Local(path) => {
                if Path::new(path).exists() {
                    std::fs::remove_file(path)?;
                }
                let listener = UnixListener::bind(path)?;
                Ok(RpcListener::Local {
                    listener,
                    path: path.clone(),
                })
            }
            Endpoint::Tcp(addr) => {
                let listener = TcpListener::bind(addr).await?;
                Ok(RpcListener::Tcp(listener))
            }
        }
    }

    /// Accept one connection.
    pub async fn accept(&self) -> Result<RpcStream> {
        match self {
            #[cfg(unix)]
            RpcListener::Local { listener, .. } => {
                let (stream, _addr) = listener.accept().await?;
                Ok(RpcStream::Local(stream))
            }
            RpcListener::Tcp(listener) => {
                let (stream, _addr) = listener.accept().await?;
                Ok(RpcStream::Tcp(stream))
            }
        }
    }

    /// The endpoint this listener is actually bound to.
    ///
    /// For TCP this reports the real port, which matters when binding port 0.
    pub fn local_endpoint(&self) -> Result<Endpoint> {
        match self {
            #[cfg(unix)]
            RpcListener::Local { path, .. } => Ok(Endpoint::Local(path.clone())),
            RpcListener::Tcp(listener) => {
                let addr = listener.local_addr()?;
                Ok(Endpoint::Tcp(addr))
            }
        }
    }
}

impl Drop for RpcListener {
    fn drop(&mut self) {
        #[cfg(unix)]
        if let RpcListener::Local { path, .. } = self {
            let _ = std::fs::remove_file(path);
        }
    }
}

/// A connected duplex byte channel over either transport.
pub enum RpcStream {
    /// Unix domain socket connection.
    #[cfg(unix)]
    Local(UnixStream),
    /// TCP connection.
    Tcp(TcpStream),
}

impl RpcStream {
    /// Connect to a listening endpoint.
    pub async fn connect(endpoint: &Endpoint) -> Result<RpcStream> {
        match endpoint {
            #[cfg(unix)]
            Endpoint::Local(path) => {
                let stream = UnixStream::connect(path).await.map_err(RpcError::Io)?;
                Ok(RpcStream::Local(stream))
            }
            Endpoint::Tcp(addr) => {
                let stream = TcpStream::connect(addr).await.map_err(RpcError::Io)?;
                Ok(RpcStream::Tcp(stream))
            }
        }
    }
}

impl AsyncRead for RpcStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            #[cfg(unix)]
            RpcStream::Local(stream) => Pin::new(stream).poll_read(cx, buf),
            RpcStream::Tcp(stream) => Pin::new(stream).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for RpcStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        match self.get_mut() {
            #[cfg(unix)]
            RpcStream::Local(stream) => Pin::new(stream).poll_write(cx, buf),
            RpcStream::Tcp(stream) => Pin::new(stream).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            #[cfg(unix)]
            RpcStream::Local(stream) => Pin::new(stream).poll_flush(cx),
            RpcStream::Tcp(stream) => Pin::new(stream).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            #[cfg(unix)]
            RpcStream::Local(stream) => Pin::new(stream).poll_shutdown(cx),
            RpcStream::Tcp(stream) => Pin::new(stream).poll_shutdown(cx),
        }
    }
}
