//! JSON-RPC 2.0 message model.
//!
//! A [`Message`] is the in-memory envelope for everything that crosses the
//! wire: requests, notifications, responses, and errors. Construction helpers
//! mirror the four variants, and [`Message::from_json`] / [`Message::to_json`]
//! convert between the envelope and its wire bytes.
//!
//! # Example
//!
//! ```
//! use wirerpc::{Message, MessageType, WireFormat};
//!
//! let request = Message::request_with("service.echo", "hello");
//! assert_eq!(request.message_type(), MessageType::Request);
//!
//! let bytes = request.to_json(WireFormat::Compact);
//! let parsed = Message::from_json(&bytes);
//! assert_eq!(parsed, request);
//! ```

use std::sync::atomic::{AtomicI64, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::JSONRPC_VERSION;

/// Standard JSON-RPC 2.0 error codes, plus library extensions.
pub mod error_codes {
    /// Malformed JSON was received.
    pub const PARSE_ERROR: i64 = -32700;
    /// Well-formed JSON that is not a valid request object.
    pub const INVALID_REQUEST: i64 = -32600;
    /// The method does not resolve to a registered handler.
    pub const METHOD_NOT_FOUND: i64 = -32601;
    /// The arguments did not bind to any handler overload.
    pub const INVALID_PARAMS: i64 = -32602;
    /// A handler failed or something unexpected happened server-side.
    pub const INTERNAL_ERROR: i64 = -32603;

    /// A blocking call expired before the response arrived.
    ///
    /// First value outside the reserved `-32768..=-32000` band.
    pub const TIMEOUT: i64 = -31999;
}

/// Process-wide request id counter.
static NEXT_REQUEST_ID: AtomicI64 = AtomicI64::new(1);

fn next_request_id() -> RequestId {
    RequestId::Number(NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed))
}

/// The id of a request, echoed verbatim on its response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RequestId {
    /// Integer id.
    Number(i64),
    /// String id.
    Str(String),
    /// Absent or null id.
    Null,
}

impl RequestId {
    /// Convert to the JSON value used on the wire.
    pub fn to_value(&self) -> Value {
        match self {
            RequestId::Number(n) => json!(n),
            RequestId::Str(s) => json!(s),
            RequestId::Null => Value::Null,
        }
    }

    /// Parse an id out of a JSON value. Unrepresentable ids become `Null`.
    pub fn from_value(value: &Value) -> RequestId {
        match value {
            Value::Number(n) => n.as_i64().map(RequestId::Number).unwrap_or(RequestId::Null),
            Value::String(s) => RequestId::Str(s.clone()),
            _ => RequestId::Null,
        }
    }

    /// Whether this id is the null id.
    pub fn is_null(&self) -> bool {
        matches!(self, RequestId::Null)
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestId::Number(n) => write!(f, "{}", n),
            RequestId::Str(s) => write!(f, "{}", s),
            RequestId::Null => write!(f, "null"),
        }
    }
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        RequestId::Number(n)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        RequestId::Str(s.to_string())
    }
}

/// The error member of an Error message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    /// Numeric error code, see [`error_codes`].
    pub code: i64,
    /// Human-readable error description.
    pub message: String,
    /// Optional structured error payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Wire rendering selected per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WireFormat {
    /// Single-line JSON, no extra whitespace.
    #[default]
    Compact,
    /// Pretty-printed JSON. Framing is structural, so this stays decodable.
    Indented,
}

/// Variant tag of a [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    /// A call expecting exactly one response.
    Request,
    /// A request without an id; no response is produced.
    Notification,
    /// A successful reply carrying a result.
    Response,
    /// A failure reply carrying an error object.
    Error,
}

/// A JSON-RPC 2.0 message.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Method call with an id; the peer must answer it.
    Request {
        /// Correlation id, unique among in-flight requests on a session.
        id: RequestId,
        /// Dotted method name, e.g. `service.echo`.
        method: String,
        /// Arguments: absent, an array, or an object.
        params: Option<Value>,
    },
    /// Method call without an id; fire-and-forget.
    Notification {
        /// Dotted method name.
        method: String,
        /// Arguments: absent, an array, or an object.
        params: Option<Value>,
    },
    /// Successful reply to a request.
    Response {
        /// Echoed request id.
        id: RequestId,
        /// Call result, `null` for void methods.
        result: Value,
    },
    /// Failure reply to a request, or a locally synthesized failure.
    Error {
        /// Echoed request id, `null` when the origin had none.
        id: RequestId,
        /// Code, message and optional data.
        error: ErrorObject,
    },
}

/// Wrap a params value per the request construction rule: arrays and objects
/// pass through, anything else becomes a one-element array.
fn normalize_params(params: Value) -> Value {
    match params {
        Value::Array(_) | Value::Object(_) => params,
        other => Value::Array(vec![other]),
    }
}

impl Message {
    /// Create a request with a fresh id and no parameters.
    pub fn request(method: impl Into<String>) -> Message {
        Message::Request {
            id: next_request_id(),
            method: method.into(),
            params: None,
        }
    }

    /// Create a request with a fresh id and the given parameters.
    ///
    /// A single non-array, non-object value is wrapped into a one-element
    /// array, so `request_with("m", 1)` sends `"params": [1]`.
    pub fn request_with(method: impl Into<String>, params: impl Into<Value>) -> Message {
        Message::Request {
            id: next_request_id(),
            method: method.into(),
            params: Some(normalize_params(params.into())),
        }
    }

    /// Create a notification (a request without an id).
    pub fn notification(method: impl Into<String>) -> Message {
        Message::Notification {
            method: method.into(),
            params: None,
        }
    }

    /// Create a notification with parameters, wrapped like [`Message::request_with`].
    pub fn notification_with(method: impl Into<String>, params: impl Into<Value>) -> Message {
        Message::Notification {
            method: method.into(),
            params: Some(normalize_params(params.into())),
        }
    }

    /// Create the successful response to `original`, copying its id.
    pub fn response(original: &Message, result: Value) -> Message {
        Message::Response {
            id: original.reply_id(),
            result,
        }
    }

    /// Create the error response to `original`, copying its id when it has one.
    pub fn error_response(original: &Message, code: i64, message: impl Into<String>) -> Message {
        Message::Error {
            id: original.reply_id(),
            error: ErrorObject {
                code,
                message: message.into(),
                data: None,
            },
        }
    }

    /// Like [`Message::error_response`] with an attached data payload.
    pub fn error_response_with_data(
        original: &Message,
        code: i64,
        message: impl Into<String>,
        data: Value,
    ) -> Message {
        Message::Error {
            id: original.reply_id(),
            error: ErrorObject {
                code,
                message: message.into(),
                data: Some(data),
            },
        }
    }

    /// The id a reply to this message must carry.
    fn reply_id(&self) -> RequestId {
        self.id().cloned().unwrap_or(RequestId::Null)
    }

    /// Parse one complete JSON text into a message.
    ///
    /// This never fails: malformed JSON yields an Error message with code
    /// [`error_codes::PARSE_ERROR`] and a null id, and a well-formed object
    /// that is neither request, response nor error yields
    /// [`error_codes::INVALID_REQUEST`] with the id preserved when present.
    pub fn from_json(bytes: &[u8]) -> Message {
        let value: Value = match serde_json::from_slice(bytes) {
            Ok(v) => v,
            Err(err) => {
                return Message::Error {
                    id: RequestId::Null,
                    error: ErrorObject {
                        code: error_codes::PARSE_ERROR,
                        message: format!("invalid JSON: {}", err),
                        data: None,
                    },
                }
            }
        };

        let object = match value {
            Value::Object(map) => map,
            _ => {
                return Message::Error {
                    id: RequestId::Null,
                    error: ErrorObject {
                        code: error_codes::INVALID_REQUEST,
                        message: "message is not a JSON object".to_string(),
                        data: None,
                    },
                }
            }
        };

        Self::classify(object)
    }

    /// Classify a parsed JSON object by field presence.
    fn classify(object: Map<String, Value>) -> Message {
        let id = object.get("id").map(RequestId::from_value);

        if let Some(error) = object.get("error") {
            let code = error
                .get("code")
                .and_then(Value::as_i64)
                .unwrap_or(error_codes::INTERNAL_ERROR);
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let data = error.get("data").cloned();
            return Message::Error {
                id: id.unwrap_or(RequestId::Null),
                error: ErrorObject {
                    code,
                    message,
                    data,
                },
            };
        }

        if let Some(result) = object.get("result") {
            return Message::Response {
                id: id.unwrap_or(RequestId::Null),
                result: result.clone(),
            };
        }

        if let Some(method) = object.get("method").and_then(Value::as_str) {
            let params = object.get("params").cloned();
            return match id {
                Some(id) => Message::Request {
                    id,
                    method: method.to_string(),
                    params,
                },
                None => Message::Notification {
                    method: method.to_string(),
                    params,
                },
            };
        }

        Message::Error {
            id: id.unwrap_or(RequestId::Null),
            error: ErrorObject {
                code: error_codes::INVALID_REQUEST,
                message: "message has no method, result or error".to_string(),
                data: None,
            },
        }
    }

    /// Render the wire object for this message.
    pub fn to_value(&self) -> Value {
        let mut object = Map::new();
        object.insert("jsonrpc".to_string(), json!(JSONRPC_VERSION));

        match self {
            Message::Request { id, method, params } => {
                object.insert("id".to_string(), id.to_value());
                object.insert("method".to_string(), json!(method));
                if let Some(params) = params {
                    object.insert("params".to_string(), params.clone());
                }
            }
            Message::Notification { method, params } => {
                object.insert("method".to_string(), json!(method));
                if let Some(params) = params {
                    object.insert("params".to_string(), params.clone());
                }
            }
            Message::Response { id, result } => {
                object.insert("id".to_string(), id.to_value());
                object.insert("result".to_string(), result.clone());
            }
            Message::Error { id, error } => {
                object.insert("id".to_string(), id.to_value());
                object.insert(
                    "error".to_string(),
                    serde_json::to_value(error).unwrap_or(Value::Null),
                );
            }
        }

        Value::Object(object)
    }

    /// Serialize to wire bytes in the given format.
    pub fn to_json(&self, format: WireFormat) -> Vec<u8> {
        let value = self.to_value();
        let rendered = match format {
            WireFormat::Compact => serde_json::to_vec(&value),
            WireFormat::Indented => serde_json::to_vec_pretty(&value),
        };
        // A Value always serializes.
        rendered.unwrap_or_default()
    }

    /// The variant tag of this message.
    pub fn message_type(&self) -> MessageType {
        match self {
            Message::Request { .. } => MessageType::Request,
            Message::Notification { .. } => MessageType::Notification,
            Message::Response { .. } => MessageType::Response,
            Message::Error { .. } => MessageType::Error,
        }
    }

    /// The message id, if this variant carries one.
    pub fn id(&self) -> Option<&RequestId> {
        match self {
            Message::Request { id, .. }
            | Message::Response { id, .. }
            | Message::Error { id, .. } => Some(id),
            Message::Notification { .. } => None,
        }
    }

    /// The method name of a request or notification.
    pub fn method(&self) -> Option<&str> {
        match self {
            Message::Request { method, .. } | Message::Notification { method, .. } => {
                Some(method.as_str())
            }
            _ => None,
        }
    }

    /// The params of a request or notification.
    pub fn params(&self) -> Option<&Value> {
        match self {
            Message::Request { params, .. } | Message::Notification { params, .. } => {
                params.as_ref()
            }
            _ => None,
        }
    }

    /// The result of a response.
    pub fn result(&self) -> Option<&Value> {
        match self {
            Message::Response { result, .. } => Some(result),
            _ => None,
        }
    }

    /// The error code of an error message.
    pub fn error_code(&self) -> Option<i64> {
        match self {
            Message::Error { error, .. } => Some(error.code),
            _ => None,
        }
    }

    /// The error description of an error message.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Message::Error { error, .. } => Some(error.message.as_str()),
            _ => None,
        }
    }

    /// The error data of an error message.
    pub fn error_data(&self) -> Option<&Value> {
        match self {
            Message::Error { error, .. } => error.data.as_ref(),
            _ => None,
        }
    }

    /// A request or notification must name a method; everything else is
    /// valid by construction.
    pub fn is_valid(&self) -> bool {
        match self {
            Message::Request { method, .. } | Message::Notification { method, .. } => {
                !method.is_empty()
            }
            _ => true,
        }
    }
}
