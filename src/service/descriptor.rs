//! Service and handler descriptors.
//!
//! A [`Service`] is a named table of handlers built once at construction time
//! through [`ServiceBuilder`]. Each handler declares its parameters as
//! [`ParamSpec`]s; the dispatcher uses those descriptors to bind wire params
//! to arguments, pick between overloads, and gather output parameters.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use wirerpc::{ParamKind, ParamSpec, Service};
//!
//! let service = Service::builder("calculator")
//!     .method(
//!         "add",
//!         vec![
//!             ParamSpec::new("a", ParamKind::Int),
//!             ParamSpec::new("b", ParamKind::Int),
//!         ],
//!         |args| {
//!             let sum = args[0].as_i64().unwrap_or(0) + args[1].as_i64().unwrap_or(0);
//!             Ok(json!(sum))
//!         },
//!     )
//!     .build();
//!
//! assert_eq!(service.name(), "calculator");
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Value};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::error::{Result, RpcError};
use crate::message::{ErrorObject, Message, RequestId, WireFormat};

/// Semantic parameter type a handler declares for one position.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamKind {
    /// JSON boolean only.
    Bool,
    /// Integral JSON number.
    Int,
    /// Any JSON number.
    Float,
    /// JSON string.
    String,
    /// Ordered sequence whose every element coerces to the inner kind.
    List(Box<ParamKind>),
    /// Array preserving per-element dynamic types.
    VariantList,
    /// Object mapping string keys to dynamic values. Rejects arrays.
    VariantMap,
    /// The permissive catch-all: accepts any JSON value as-is.
    Variant,
}

impl ParamKind {
    /// The type-appropriate zero for unsupplied pure-output parameters.
    pub(crate) fn zero_value(&self) -> Value {
        match self {
            ParamKind::Bool => json!(false),
            ParamKind::Int => json!(0),
            ParamKind::Float => json!(0.0),
            ParamKind::String => json!(""),
            ParamKind::List(_) | ParamKind::VariantList => json!([]),
            ParamKind::VariantMap => json!({}),
            ParamKind::Variant => Value::Null,
        }
    }
}

/// Direction of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamDir {
    /// Plain input.
    #[default]
    In,
    /// Output only; receives a zero value when unsupplied.
    Out,
    /// Input that the handler may overwrite; zero-filled when unsupplied.
    InOut,
}

/// Descriptor for a single handler parameter.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    name: String,
    kind: ParamKind,
    dir: ParamDir,
    default: Option<Value>,
}

impl ParamSpec {
    /// A plain input parameter.
    pub fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            dir: ParamDir::In,
            default: None,
        }
    }

    /// Give the parameter a default, making it optional.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Mark the parameter output-only.
    pub fn out(mut self) -> Self {
        self.dir = ParamDir::Out;
        self
    }

    /// Mark the parameter in/out.
    pub fn in_out(mut self) -> Self {
        self.dir = ParamDir::InOut;
        self
    }

    /// Parameter name, used for object-form binding.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared semantic type.
    pub fn kind(&self) -> &ParamKind {
        &self.kind
    }

    /// Declared direction.
    pub fn dir(&self) -> ParamDir {
        self.dir
    }

    /// Declared default, if any.
    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

/// Failure reported by a handler; surfaces as an InternalError reply.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct HandlerError(pub String);

impl HandlerError {
    /// Convenience constructor.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Handler invoked with coerced arguments; out/in-out slots may be mutated.
pub type SyncHandler = Arc<dyn Fn(&mut Vec<Value>) -> std::result::Result<Value, HandlerError> + Send + Sync>;

/// Handler that answers later through its [`DeferredReply`].
pub type DeferredHandler =
    Arc<dyn Fn(&mut Vec<Value>, DeferredReply) -> std::result::Result<(), HandlerError> + Send + Sync>;

/// How a handler produces its result.
pub(crate) enum HandlerKind {
    /// The returned value is the call result.
    Value(SyncHandler),
    /// Void return; object-form calls gather output parameters instead.
    Void(SyncHandler),
    /// The response is emitted later on the originating session.
    Deferred(DeferredHandler),
}

/// One registered overload of a method.
pub(crate) struct MethodSpec {
    pub(crate) params: Vec<ParamSpec>,
    pub(crate) handler: HandlerKind,
}

/// A named collection of handlers registered with a server or socket.
///
/// Dotted names such as `service.complex.prefix.for` are legal; the empty
/// name registers the anonymous service reachable by bare method names.
pub struct Service {
    name: String,
    methods: HashMap<String, Vec<MethodSpec>>,
}

impl Service {
    /// Start building a service under the given name.
    pub fn builder(name: impl Into<String>) -> ServiceBuilder {
        ServiceBuilder {
            service: Service {
                name: name.into(),
                methods: HashMap::new(),
            },
        }
    }

    /// Start building the anonymous service (methods called without prefix).
    pub fn anonymous() -> ServiceBuilder {
        Self::builder("")
    }

    /// The service name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The overload list registered under an unqualified method name.
    pub(crate) fn overloads(&self, method: &str) -> Option<&[MethodSpec]> {
        self.methods.get(method).map(Vec::as_slice)
    }

    /// Names of all registered methods.
    pub fn method_names(&self) -> Vec<&str> {
        self.methods.keys().map(String::as_str).collect()
    }
}

/// Fluent builder for [`Service`].
pub struct ServiceBuilder {
    service: Service,
}

impl ServiceBuilder {
    fn register(mut self, name: &str, params: Vec<ParamSpec>, handler: HandlerKind) -> Self {
        self.service
            .methods
            .entry(name.to_string())
            .or_default()
            .push(MethodSpec { params, handler });
        self
    }

    /// Register a handler whose return value is the call result.
    ///
    /// Registering the same name twice creates overloads; registration order
    /// is the final dispatch tie-break.
    pub fn method<F>(self, name: &str, params: Vec<ParamSpec>, handler: F) -> Self
    where
        F: Fn(&mut Vec<Value>) -> std::result::Result<Value, HandlerError> + Send + Sync + 'static,
    {
        self.register(name, params, HandlerKind::Value(Arc::new(handler)))
    }

    /// Register a void handler.
    ///
    /// Object-form calls gather out/in-out parameters into the result object;
    /// otherwise the result is `null`.
    pub fn method_void<F>(self, name: &str, params: Vec<ParamSpec>, handler: F) -> Self
    where
        F: Fn(&mut Vec<Value>) -> std::result::Result<Value, HandlerError> + Send + Sync + 'static,
    {
        self.register(name, params, HandlerKind::Void(Arc::new(handler)))
    }

    /// Register a handler that responds later through its [`DeferredReply`].
    pub fn method_deferred<F>(self, name: &str, params: Vec<ParamSpec>, handler: F) -> Self
    where
        F: Fn(&mut Vec<Value>, DeferredReply) -> std::result::Result<(), HandlerError>
            + Send
            + Sync
            + 'static,
    {
        self.register(name, params, HandlerKind::Deferred(Arc::new(handler)))
    }

    /// Finish building.
    pub fn build(self) -> Arc<Service> {
        Arc::new(self.service)
    }
}

/// Handle a deferred handler uses to answer its request later.
///
/// The handle captures the request id and the session's outbound queue, so
/// the eventual response is correlated and ordered like any other write.
/// For a notification origin there is no id and [`DeferredReply::respond`]
/// silently does nothing.
pub struct DeferredReply {
    id: Option<RequestId>,
    outbound: mpsc::Sender<Vec<u8>>,
    format: WireFormat,
}

impl DeferredReply {
    pub(crate) fn new(
        id: Option<RequestId>,
        outbound: mpsc::Sender<Vec<u8>>,
        format: WireFormat,
    ) -> Self {
        Self {
            id,
            outbound,
            format,
        }
    }

    /// The id of the originating request, if it had one.
    pub fn request_id(&self) -> Option<&RequestId> {
        self.id.as_ref()
    }

    /// Submit the result for the originating request.
    pub async fn respond(self, result: Value) -> Result<()> {
        let Some(id) = self.id else {
            return Ok(());
        };
        let message = Message::Response { id, result };
        self.outbound
            .send(message.to_json(self.format))
            .await
            .map_err(|_| RpcError::ConnectionClosed)
    }

    /// Submit an error for the originating request.
    pub async fn respond_error(self, code: i64, message: impl Into<String>) -> Result<()> {
        let Some(id) = self.id else {
            return Ok(());
        };
        let message = Message::Error {
            id,
            error: ErrorObject {
                code,
                message: message.into(),
                data: None,
            },
        };
        self.outbound
            .send(message.to_json(self.format))
            .await
            .map_err(|_| RpcError::ConnectionClosed)
    }
}
