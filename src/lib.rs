//! # wirerpc
//!
//! Transport-agnostic JSON-RPC 2.0 server and client core for stream
//! transports.
//!
//! The crate accepts client connections over a duplex byte channel (Unix
//! domain socket, TCP, or anything `AsyncRead + AsyncWrite`), decodes framed
//! JSON-RPC messages, dispatches requests to registered services by dotted
//! method name, and marshals results and errors back to the originating
//! client. Servers can also push notifications to every connected client.
//!
//! ## Architecture
//!
//! - **[`Message`]** - the JSON-RPC 2.0 envelope and its wire codec
//! - **[`FrameBuffer`]** - streaming frame extraction, delimited purely by
//!   balanced JSON structure (no length prefix)
//! - **[`Socket`]** - per-connection session: pending-reply correlation,
//!   ordered writes, blocking calls with timeout
//! - **[`Service`] / [`ServiceRegistry`]** - typed handler tables with
//!   overloads, parameter coercion, and dotted-name resolution
//! - **[`Server`]** - listening endpoint, session set, broadcasts
//!
//! ## Example
//!
//! ```ignore
//! use serde_json::json;
//! use wirerpc::{Endpoint, Message, ParamKind, ParamSpec, Server, Service, WireFormat};
//!
//! #[tokio::main]
//! async fn main() -> wirerpc::Result<()> {
//!     let service = Service::builder("service")
//!         .method("echo", vec![ParamSpec::new("text", ParamKind::String)], |args| {
//!             Ok(args[0].clone())
//!         })
//!         .build();
//!
//!     let server = Server::new(WireFormat::Compact);
//!     server.add_service(&service);
//!     server.listen(&Endpoint::tcp("127.0.0.1:4000".parse().unwrap())).await?;
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod error;
pub mod message;
pub mod reply;
pub mod server;
pub mod service;
pub mod socket;
pub mod transport;

pub use codec::{FrameBuffer, DEFAULT_MAX_FRAME_SIZE};
pub use error::{Result, RpcError};
pub use message::{error_codes, ErrorObject, Message, MessageType, RequestId, WireFormat};
pub use reply::Reply;
pub use server::{Server, ServerEvent};
pub use service::{
    DeferredReply, HandlerError, ParamDir, ParamKind, ParamSpec, Service, ServiceBuilder,
    ServiceRegistry,
};
pub use socket::{Socket, DEFAULT_CALL_TIMEOUT};
pub use transport::{local_socket_path, Endpoint, RpcListener, RpcStream};

/// JSON-RPC protocol version emitted on every message.
pub const JSONRPC_VERSION: &str = "2.0";
