//! One-shot reply handles for outstanding requests.
//!
//! Sending a request returns a [`Reply`]: a future for the single response or
//! error the peer owes. A reply can be observed by polling
//! ([`Reply::try_result`]), by callback ([`Reply::on_finished`]) or by an
//! awaited wait with timeout ([`Reply::wait_timeout`]). Dropping a pending
//! reply detaches the caller; the session releases the pending slot on its
//! own when the response eventually arrives.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::oneshot;

use crate::message::{error_codes, ErrorObject, Message, RequestId};

/// Pending request table shared between a session and its reply handles.
pub(crate) type PendingTable = Mutex<HashMap<RequestId, oneshot::Sender<Message>>>;

enum ReplyState {
    Pending(oneshot::Receiver<Message>),
    Finished(Message),
}

/// A one-shot future for a pending request.
///
/// States: pending, then finished with a Response, an Error, or a synthetic
/// timeout Error. Notifications yield an already-finished handle.
pub struct Reply {
    id: Option<RequestId>,
    state: ReplyState,
    /// Backref used to release the pending slot on timeout.
    pending: Weak<PendingTable>,
}

impl Reply {
    /// A handle waiting for the response to request `id`.
    pub(crate) fn pending(
        id: RequestId,
        rx: oneshot::Receiver<Message>,
        pending: &Arc<PendingTable>,
    ) -> Self {
        Self {
            id: Some(id),
            state: ReplyState::Pending(rx),
            pending: Arc::downgrade(pending),
        }
    }

    /// An already-finished handle, used for notifications.
    pub(crate) fn finished() -> Self {
        Self {
            id: None,
            state: ReplyState::Finished(Message::Response {
                id: RequestId::Null,
                result: Value::Null,
            }),
            pending: Weak::new(),
        }
    }

    /// The id of the request this reply belongs to, if any.
    pub fn id(&self) -> Option<&RequestId> {
        self.id.as_ref()
    }

    /// Poll for completion without waiting.
    ///
    /// Returns the resolved message once available; `None` while pending.
    pub fn try_result(&mut self) -> Option<&Message> {
        if let ReplyState::Pending(rx) = &mut self.state {
            match rx.try_recv() {
                Ok(message) => self.state = ReplyState::Finished(message),
                Err(oneshot::error::TryRecvError::Empty) => return None,
                Err(oneshot::error::TryRecvError::Closed) => {
                    self.state = ReplyState::Finished(closed_message(self.id.clone()));
                }
            }
        }

        match &self.state {
            ReplyState::Finished(message) => Some(message),
            ReplyState::Pending(_) => None,
        }
    }

    /// Wait until the reply resolves.
    ///
    /// Resolves to a synthetic internal error when the session goes away
    /// before a response arrives.
    pub async fn wait(self) -> Message {
        let id = self.id.clone();
        match self.state {
            ReplyState::Finished(message) => message,
            ReplyState::Pending(rx) => rx.await.unwrap_or_else(|_| closed_message(id)),
        }
    }

    /// Wait until the reply resolves or `timeout` elapses.
    ///
    /// On timeout the pending entry is removed from the session and a
    /// synthetic Error message with code [`error_codes::TIMEOUT`] is
    /// returned, echoing the request id.
    pub async fn wait_timeout(self, timeout: Duration) -> Message {
        let id = self.id.clone();
        let pending = self.pending.clone();

        match tokio::time::timeout(timeout, self.wait()).await {
            Ok(message) => message,
            Err(_) => {
                if let (Some(id), Some(pending)) = (&id, pending.upgrade()) {
                    let mut table = match pending.lock() {
                        Ok(guard) => guard,
                        Err(poisoned) => poisoned.into_inner(),
                    };
                    table.remove(id);
                }
                timeout_message(id)
            }
        }
    }

    /// Observe completion through a callback, consuming the handle.
    pub fn on_finished<F>(self, callback: F)
    where
        F: FnOnce(Message) + Send + 'static,
    {
        tokio::spawn(async move {
            callback(self.wait().await);
        });
    }
}

fn timeout_message(id: Option<RequestId>) -> Message {
    Message::Error {
        id: id.unwrap_or(RequestId::Null),
        error: ErrorObject {
            code: error_codes::TIMEOUT,
            message: "call timed out before a response arrived".to_string(),
            data: None,
        },
    }
}

fn closed_message(id: Option<RequestId>) -> Message {
    Message::Error {
        id: id.unwrap_or(RequestId::Null),
        error: ErrorObject {
            code: error_codes::INTERNAL_ERROR,
            message: "connection closed before a response arrived".to_string(),
            data: None,
        },
    }
}
