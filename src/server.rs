//! JSON-RPC server: listening endpoint, session set, broadcasts.
//!
//! A [`Server`] owns a [`ServiceRegistry`] and every session it accepts.
//! Each accepted connection becomes a [`Socket`] with the registry attached,
//! so dispatch semantics are identical across transports. Lifecycle events
//! are observable through a broadcast channel.
//!
//! # Example
//!
//! ```ignore
//! use wirerpc::{Endpoint, Server, Service, WireFormat};
//!
//! let server = Server::new(WireFormat::Compact);
//! server.add_service(&my_service);
//! server.listen(&Endpoint::tcp("127.0.0.1:4000".parse()?)).await?;
//! ```

use std::sync::{Arc, Mutex, RwLock};

use serde_json::Value;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::error::{Result, RpcError};
use crate::message::{Message, WireFormat};
use crate::service::{Service, ServiceRegistry};
use crate::socket::Socket;
use crate::transport::{Endpoint, RpcListener};

/// Capacity of the lifecycle event channel.
const EVENT_QUEUE_DEPTH: usize = 64;

/// Connection lifecycle events observable via [`Server::subscribe_events`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerEvent {
    /// A client connection was accepted.
    ClientConnected,
    /// A client session disconnected.
    ClientDisconnected,
}

/// A JSON-RPC 2.0 server over a stream transport.
pub struct Server {
    registry: Arc<RwLock<ServiceRegistry>>,
    sessions: Arc<Mutex<Vec<Socket>>>,
    events: broadcast::Sender<ServerEvent>,
    format: WireFormat,
    error: Mutex<Option<String>>,
    bound: Mutex<Option<Endpoint>>,
    accept_task: Mutex<Option<JoinHandle<()>>>,
}

impl Server {
    /// Create an idle server writing in the given format.
    pub fn new(format: WireFormat) -> Server {
        let (events, _) = broadcast::channel(EVENT_QUEUE_DEPTH);
        Server {
            registry: Arc::new(RwLock::new(ServiceRegistry::new())),
            sessions: Arc::new(Mutex::new(Vec::new())),
            events,
            format,
            error: Mutex::new(None),
            bound: Mutex::new(None),
            accept_task: Mutex::new(None),
        }
    }

    /// Register a service; `false` if its name or instance is already bound.
    pub fn add_service(&self, service: &Arc<Service>) -> bool {
        write_lock(&self.registry).add_service(service)
    }

    /// Unregister a service by instance; `false` if it is not registered.
    pub fn remove_service(&self, service: &Arc<Service>) -> bool {
        write_lock(&self.registry).remove_service(service)
    }

    /// Bind the endpoint and start accepting connections.
    ///
    /// The failure reason is also retained for [`Server::error_string`].
    pub async fn listen(&self, endpoint: &Endpoint) -> Result<()> {
        if lock(&self.accept_task).is_some() {
            let reason = "server is already listening".to_string();
            *lock(&self.error) = Some(reason.clone());
            return Err(RpcError::Protocol(reason));
        }

        let listener = match RpcListener::bind(endpoint).await {
            Ok(listener) => listener,
            Err(err) => {
                *lock(&self.error) = Some(err.to_string());
                return Err(err);
            }
        };

        *lock(&self.bound) = Some(listener.local_endpoint()?);

        let task = tokio::spawn(accept_loop(
            listener,
            self.registry.clone(),
            self.sessions.clone(),
            self.events.clone(),
            self.format,
        ));
        *lock(&self.accept_task) = Some(task);

        Ok(())
    }

    /// The endpoint actually bound, once listening.
    ///
    /// For TCP this reports the real port, which matters when binding port 0.
    pub fn local_endpoint(&self) -> Option<Endpoint> {
        lock(&self.bound).clone()
    }

    /// The last listen/accept failure, if any.
    pub fn error_string(&self) -> Option<String> {
        lock(&self.error).clone()
    }

    /// Stop accepting and drain every active session.
    pub fn close(&self) {
        if let Some(task) = lock(&self.accept_task).take() {
            task.abort();
        }
        *lock(&self.bound) = None;
        for session in lock(&self.sessions).drain(..) {
            session.close();
        }
    }

    /// Number of currently connected clients.
    pub fn connected_client_count(&self) -> usize {
        lock(&self.sessions)
            .iter()
            .filter(|session| session.is_connected())
            .count()
    }

    /// Observe connect/disconnect events.
    pub fn subscribe_events(&self) -> broadcast::Receiver<ServerEvent> {
        self.events.subscribe()
    }

    /// Broadcast a notification to every connected client.
    ///
    /// Per-session delivery keeps broadcast order; cross-session interleaving
    /// is unspecified.
    pub async fn notify_connected_clients(&self, notification: &Message) {
        let snapshot: Vec<Socket> = lock(&self.sessions).clone();
        for session in snapshot {
            if let Err(err) = session.send_message(notification).await {
                tracing::debug!(%err, "skipping notification to dead session");
            }
        }
    }

    /// Build a notification from method and positional args, then broadcast.
    pub async fn notify_connected_clients_with(&self, method: &str, args: Vec<Value>) {
        let notification = if args.is_empty() {
            Message::notification(method)
        } else {
            Message::notification_with(method, Value::Array(args))
        };
        self.notify_connected_clients(&notification).await;
    }

    /// The registry shared with every session, for embedding scenarios.
    pub fn registry(&self) -> Arc<RwLock<ServiceRegistry>> {
        self.registry.clone()
    }
}

impl Default for Server {
    fn default() -> Self {
        Self::new(WireFormat::Compact)
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.close();
    }
}

async fn accept_loop(
    listener: RpcListener,
    registry: Arc<RwLock<ServiceRegistry>>,
    sessions: Arc<Mutex<Vec<Socket>>>,
    events: broadcast::Sender<ServerEvent>,
    format: WireFormat,
) {
    loop {
        let stream = match listener.accept().await {
            Ok(stream) => stream,
            Err(err) => {
                tracing::error!(%err, "accept failed, stopping listener");
                return;
            }
        };

        let socket = Socket::with_registry(stream, format, registry.clone());
        lock(&sessions).push(socket.clone());
        let _ = events.send(ServerEvent::ClientConnected);
        tracing::debug!("client connected");

        let sessions = sessions.clone();
        let events = events.clone();
        tokio::spawn(async move {
            socket.closed().await;
            lock(&sessions).retain(|session| session.is_connected());
            let _ = events.send(ServerEvent::ClientDisconnected);
            tracing::debug!("client disconnected");
        });
    }
}

/// Lock a std mutex, recovering from poisoning.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn write_lock(registry: &RwLock<ServiceRegistry>) -> std::sync::RwLockWriteGuard<'_, ServiceRegistry> {
    match registry.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
