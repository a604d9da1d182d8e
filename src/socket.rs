//! Per-connection session.
//!
//! A [`Socket`] owns one duplex byte channel and runs two tasks over it:
//!
//! - a **writer task** draining an mpsc queue, so outbound messages are
//!   written whole and in [`Socket::send_message`] order;
//! - a **read loop** feeding the [`FrameBuffer`], publishing every decoded
//!   message to observers, completing pending replies, and - when a service
//!   registry is attached - dispatching inbound requests.
//!
//! The same type serves both sides of a connection: a server session is a
//! `Socket` with the server's registry attached, a plain client session is
//! one without. A client may also attach its own registry to handle
//! server-initiated requests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::codec::FrameBuffer;
use crate::error::{Result, RpcError};
use crate::message::{error_codes, ErrorObject, Message, MessageType, RequestId, WireFormat};
use crate::reply::{PendingTable, Reply};
use crate::service::{dispatch, DispatchContext, ServiceRegistry};

/// Default timeout for blocking calls.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Outbound queue depth; beyond this, senders wait on the transport.
const OUTBOUND_QUEUE_DEPTH: usize = 64;

/// Capacity of the `messageReceived` observer channel.
const OBSERVER_QUEUE_DEPTH: usize = 256;

struct SocketInner {
    outbound: mpsc::Sender<Vec<u8>>,
    pending: Arc<PendingTable>,
    received: broadcast::Sender<Message>,
    format: WireFormat,
    call_timeout: Mutex<Duration>,
    closed_tx: watch::Sender<bool>,
    closed_rx: watch::Receiver<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

/// A JSON-RPC session over one duplex byte channel.
///
/// Cheaply cloneable; clones share the connection.
#[derive(Clone)]
pub struct Socket {
    inner: Arc<SocketInner>,
}

impl Socket {
    /// Create a session without dispatch: a plain client endpoint.
    pub fn new<S>(stream: S, format: WireFormat) -> Socket
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        Self::build(stream, format, None)
    }

    /// Create a session that dispatches inbound requests to `registry`.
    pub fn with_registry<S>(
        stream: S,
        format: WireFormat,
        registry: Arc<RwLock<ServiceRegistry>>,
    ) -> Socket
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        Self::build(stream, format, Some(registry))
    }

    fn build<S>(
        stream: S,
        format: WireFormat,
        registry: Option<Arc<RwLock<ServiceRegistry>>>,
    ) -> Socket
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (read_half, write_half) = tokio::io::split(stream);
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_QUEUE_DEPTH);
        let (received_tx, _) = broadcast::channel(OBSERVER_QUEUE_DEPTH);
        let (closed_tx, closed_rx) = watch::channel(false);

        let inner = Arc::new(SocketInner {
            outbound: outbound_tx,
            pending: Arc::new(Mutex::new(HashMap::new())),
            received: received_tx,
            format,
            call_timeout: Mutex::new(DEFAULT_CALL_TIMEOUT),
            closed_tx,
            closed_rx,
            tasks: Mutex::new(Vec::new()),
        });

        let writer_task = tokio::spawn(write_loop(outbound_rx, write_half));
        let reader_task = tokio::spawn(read_loop(read_half, inner.clone(), registry));

        lock(&inner.tasks).extend([writer_task, reader_task]);

        Socket { inner }
    }

    /// Encode and queue a message for writing.
    ///
    /// A Request records a pending entry keyed by its id and returns the
    /// handle for its response; a Notification (or any other variant)
    /// returns an already-finished handle.
    pub async fn send_message(&self, message: &Message) -> Result<Reply> {
        let bytes = message.to_json(self.inner.format);

        let reply = match (message.message_type(), message.id()) {
            (MessageType::Request, Some(id)) => {
                let (tx, rx) = oneshot::channel();
                if lock(&self.inner.pending).insert(id.clone(), tx).is_some() {
                    tracing::warn!(%id, "duplicate in-flight request id, replacing entry");
                }
                Reply::pending(id.clone(), rx, &self.inner.pending)
            }
            _ => Reply::finished(),
        };

        if self.inner.outbound.send(bytes).await.is_err() {
            if let Some(id) = reply.id() {
                lock(&self.inner.pending).remove(id);
            }
            return Err(RpcError::ConnectionClosed);
        }

        Ok(reply)
    }

    /// Send a message and wait for its reply.
    ///
    /// When the configured call timeout elapses first, the result is a
    /// synthetic Error message with code [`error_codes::TIMEOUT`].
    pub async fn send_message_blocking(&self, message: &Message) -> Result<Message> {
        let timeout = self.call_timeout();
        let reply = self.send_message(message).await?;
        Ok(reply.wait_timeout(timeout).await)
    }

    /// Call a remote method with positional arguments.
    pub async fn invoke_remote_method(&self, method: &str, args: Vec<Value>) -> Result<Reply> {
        let message = if args.is_empty() {
            Message::request(method)
        } else {
            Message::request_with(method, Value::Array(args))
        };
        self.send_message(&message).await
    }

    /// Call a remote method and wait for the result.
    pub async fn invoke_remote_method_blocking(
        &self,
        method: &str,
        args: Vec<Value>,
    ) -> Result<Message> {
        let timeout = self.call_timeout();
        let reply = self.invoke_remote_method(method, args).await?;
        Ok(reply.wait_timeout(timeout).await)
    }

    /// Observe every message this session decodes, including those it
    /// correlates to pending replies.
    pub fn subscribe(&self) -> broadcast::Receiver<Message> {
        self.inner.received.subscribe()
    }

    /// The wire format this session writes with.
    pub fn wire_format(&self) -> WireFormat {
        self.inner.format
    }

    /// Timeout applied by the blocking call variants.
    pub fn call_timeout(&self) -> Duration {
        *lock(&self.inner.call_timeout)
    }

    /// Change the timeout applied by the blocking call variants.
    pub fn set_call_timeout(&self, timeout: Duration) {
        *lock(&self.inner.call_timeout) = timeout;
    }

    /// Whether the transport is still up.
    pub fn is_connected(&self) -> bool {
        !*self.inner.closed_rx.borrow()
    }

    /// Resolve once the session has disconnected.
    pub async fn closed(&self) {
        let mut rx = self.inner.closed_rx.clone();
        while !*rx.borrow() {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// Tear the session down: stop both tasks and fail pending replies.
    pub fn close(&self) {
        let _ = self.inner.closed_tx.send(true);
        for task in lock(&self.inner.tasks).drain(..) {
            task.abort();
        }
        lock(&self.inner.pending).clear();
    }
}

/// Lock a std mutex, recovering from poisoning.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

async fn write_loop<W>(mut rx: mpsc::Receiver<Vec<u8>>, mut writer: W)
where
    W: AsyncWrite + Unpin,
{
    while let Some(bytes) = rx.recv().await {
        if let Err(err) = writer.write_all(&bytes).await {
            tracing::debug!(%err, "write failed, stopping writer");
            return;
        }
        if let Err(err) = writer.flush().await {
            tracing::debug!(%err, "flush failed, stopping writer");
            return;
        }
    }
}

async fn read_loop<R>(
    mut reader: R,
    inner: Arc<SocketInner>,
    registry: Option<Arc<RwLock<ServiceRegistry>>>,
) where
    R: AsyncRead + Unpin,
{
    let mut frame_buffer = FrameBuffer::new();
    let mut buf = vec![0u8; 8 * 1024];

    loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) => {
                tracing::debug!(%err, "read failed, closing session");
                break;
            }
        };

        match frame_buffer.push(&buf[..n]) {
            Ok(frames) => {
                for frame in frames {
                    let message = Message::from_json(&frame);
                    // An Error that the wire did not spell out is our own
                    // classification verdict for an unparseable request.
                    let synthesized = message.message_type() == MessageType::Error
                        && !wire_carries_error(&frame);
                    handle_inbound(&inner, message, synthesized, registry.as_deref()).await;
                }
            }
            Err(err) => {
                tracing::warn!(%err, "unframeable bytes on session");
                let message = Message::Error {
                    id: RequestId::Null,
                    error: ErrorObject {
                        code: error_codes::PARSE_ERROR,
                        message: err.to_string(),
                        data: None,
                    },
                };
                handle_inbound(&inner, message, true, registry.as_deref()).await;
            }
        }
    }

    let _ = inner.closed_tx.send(true);
    // Drop pending senders so outstanding replies resolve.
    lock(&inner.pending).clear();
}

async fn handle_inbound(
    inner: &Arc<SocketInner>,
    message: Message,
    synthesized: bool,
    registry: Option<&RwLock<ServiceRegistry>>,
) {
    // Observers see all traffic, correlated or not.
    let _ = inner.received.send(message.clone());

    match message.message_type() {
        MessageType::Response | MessageType::Error => {
            let completed = message
                .id()
                .and_then(|id| lock(&inner.pending).remove(id));

            if let Some(sender) = completed {
                // The caller may have dropped its Reply; that is fine.
                let _ = sender.send(message);
            } else if synthesized && registry.is_some() {
                // Dispatch-side session: return the classification verdict
                // (ParseError / InvalidRequest) to the peer.
                let _ = inner
                    .outbound
                    .send(message.to_json(inner.format))
                    .await;
            }
        }
        MessageType::Request | MessageType::Notification => {
            if let Some(registry) = registry {
                let ctx = DispatchContext {
                    outbound: inner.outbound.clone(),
                    format: inner.format,
                };
                if let Some(reply) = dispatch(registry, &message, &ctx) {
                    let _ = inner.outbound.send(reply.to_json(inner.format)).await;
                }
            }
        }
    }
}

/// Whether the frame's JSON actually carried an `error` member.
fn wire_carries_error(frame: &[u8]) -> bool {
    serde_json::from_slice::<Value>(frame)
        .map(|value| value.get("error").is_some())
        .unwrap_or(false)
}
