//! Incoming request as seen by route chains. Parsing is performed upstream by the host router
//! adapter; the request only exposes the already extracted mappings.

use http::Method;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Immutable request data shared by all handlers of a route chain. Cloning is cheap.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Request {
    inner: Arc<RequestParts>,
}

/// Owned contents of a [Request].
#[derive(Clone, Debug, PartialEq)]
pub struct RequestParts {
    pub method: Method,
    pub path: String,
    /// Captures of the matched route pattern, e.g. `id` for `/users/:id`.
    pub params: Map<String, Value>,
    pub query: Map<String, Value>,
    /// Header names are expected to be lower-case.
    pub headers: Map<String, Value>,
    /// Parsed body; `Value::Null` when there is none.
    pub body: Value,
}

impl Default for RequestParts {
    fn default() -> Self {
        Self {
            method: Method::GET,
            path: "/".to_string(),
            params: Default::default(),
            query: Default::default(),
            headers: Default::default(),
            body: Value::Null,
        }
    }
}

impl From<RequestParts> for Request {
    fn from(value: RequestParts) -> Self {
        Self {
            inner: Arc::new(value),
        }
    }
}

impl Request {
    pub fn builder() -> RequestBuilder {
        RequestBuilder::default()
    }

    #[inline]
    pub fn method(&self) -> &Method {
        &self.inner.method
    }

    #[inline]
    pub fn path(&self) -> &str {
        &self.inner.path
    }

    #[inline]
    pub fn params(&self) -> &Map<String, Value> {
        &self.inner.params
    }

    #[inline]
    pub fn query(&self) -> &Map<String, Value> {
        &self.inner.query
    }

    #[inline]
    pub fn headers(&self) -> &Map<String, Value> {
        &self.inner.headers
    }

    #[inline]
    pub fn body(&self) -> &Value {
        &self.inner.body
    }

    /// Returns a copy of this request with path captures replaced. Used by routers once a route
    /// pattern has matched.
    pub fn with_params(&self, params: Map<String, Value>) -> Self {
        let mut parts = self.inner.as_ref().clone();
        parts.params = params;
        parts.into()
    }
}

/// Builder for [Request]s, mostly useful for host adapters and tests.
#[derive(Clone, Debug, Default)]
pub struct RequestBuilder {
    parts: RequestParts,
}

impl RequestBuilder {
    pub fn method(mut self, method: Method) -> Self {
        self.parts.method = method;
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.parts.path = path.into();
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parts.params.insert(name.into(), value.into());
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parts.query.insert(name.into(), value.into());
        self
    }

    /// Adds a header, lower-casing its name.
    pub fn header(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.parts
            .headers
            .insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.parts.body = body;
        self
    }

    pub fn build(self) -> Request {
        self.parts.into()
    }
}
