//! Outbound response handle shared by all handlers of a route chain.

use http::StatusCode;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;

/// Body written to a [Response].
#[derive(Clone, Debug, PartialEq)]
pub enum ResponseBody {
    Empty,
    Json(Value),
    Text(String),
}

/// Snapshot of everything written to a [Response].
#[derive(Clone, Debug, PartialEq)]
pub struct ResponseParts {
    pub status: StatusCode,
    pub headers: Vec<(String, String)>,
    pub body: ResponseBody,
    /// Set once a body has been written.
    pub sent: bool,
}

impl Default for ResponseParts {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: vec![],
            body: ResponseBody::Empty,
            sent: false,
        }
    }
}

/// Writable response. Clones share the same underlying state, so a middleware, the handler and
/// the host router all observe the same writes. Setters return `&Self` for chaining:
///
/// ```
/// use waypost::response::Response;
/// use waypost::http::StatusCode;
/// use serde_json::json;
///
/// let response = Response::default();
/// response.status(StatusCode::CREATED).json(json!({ "id": 1 }));
/// assert!(response.is_sent());
/// ```
#[derive(Clone, Debug, Default)]
pub struct Response {
    inner: Arc<Mutex<ResponseParts>>,
}

impl Response {
    pub fn status(&self, status: StatusCode) -> &Self {
        self.inner.lock().status = status;
        self
    }

    pub fn header(&self, name: impl Into<String>, value: impl Into<String>) -> &Self {
        self.inner.lock().headers.push((name.into(), value.into()));
        self
    }

    /// Writes a JSON body.
    pub fn json(&self, body: Value) -> &Self {
        self.write(ResponseBody::Json(body))
    }

    /// Writes a plain text body.
    pub fn send(&self, body: impl Into<String>) -> &Self {
        self.write(ResponseBody::Text(body.into()))
    }

    /// Finishes the response without a body.
    pub fn end(&self) -> &Self {
        self.write(ResponseBody::Empty)
    }

    #[inline]
    pub fn status_code(&self) -> StatusCode {
        self.inner.lock().status
    }

    #[inline]
    pub fn is_sent(&self) -> bool {
        self.inner.lock().sent
    }

    pub fn parts(&self) -> ResponseParts {
        self.inner.lock().clone()
    }

    fn write(&self, body: ResponseBody) -> &Self {
        let mut parts = self.inner.lock();
        parts.body = body;
        parts.sent = true;
        drop(parts);
        self
    }
}
