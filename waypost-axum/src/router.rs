//! [Router] implementation backed by axum. Routes are collected in a [RouteTable] and served by a
//! single axum handler, which keeps express-style semantics: routes are tried in registration
//! order and a chain calling `next` falls through to the next matching route.

use axum::body::{boxed, Bytes, Empty};
use axum::extract::{Query, State};
use axum::http::header::{HeaderName, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response as AxumResponse};
use axum::Json;
use itertools::Itertools;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{error, warn};
use waypost::error::ErrorPtr;
use waypost::handler::RequestHandler;
use waypost::request::Request;
use waypost::response::{ResponseBody, ResponseParts};
use waypost::router::{Dispatch, RouteTable, Router};

/// Collects controller routes and turns them into an [axum::Router].
#[derive(Clone, Debug, Default)]
pub struct AxumRouter {
    routes: RouteTable,
}

impl Router for AxumRouter {
    fn get(&mut self, path: &str, handlers: Vec<RequestHandler>) {
        self.routes.get(path, handlers);
    }

    fn post(&mut self, path: &str, handlers: Vec<RequestHandler>) {
        self.routes.post(path, handlers);
    }

    fn put(&mut self, path: &str, handlers: Vec<RequestHandler>) {
        self.routes.put(path, handlers);
    }

    fn delete(&mut self, path: &str, handlers: Vec<RequestHandler>) {
        self.routes.delete(path, handlers);
    }

    fn nest(&mut self, prefix: &str, routes: RouteTable) {
        self.routes.nest(prefix, routes);
    }
}

impl AxumRouter {
    pub fn new() -> Self {
        Default::default()
    }

    #[inline]
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Creates an [axum::Router] serving all registered routes as its fallback, so explicit
    /// axum routes added to the result take precedence.
    pub fn into_router(self) -> axum::Router {
        axum::Router::new()
            .fallback(handle_request)
            .with_state(Arc::new(self.routes))
    }
}

async fn handle_request(
    State(routes): State<Arc<RouteTable>>,
    method: Method,
    uri: Uri,
    query: Option<Query<Vec<(String, String)>>>,
    headers: HeaderMap,
    body: Bytes,
) -> AxumResponse {
    let body = match parse_body(&headers, &body) {
        Ok(body) => body,
        Err(error) => {
            warn!(path = uri.path(), "Malformed JSON request body: {}", error);
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let mut request = Request::builder()
        .method(method.clone())
        .path(uri.path())
        .body(body);

    if let Some(Query(query)) = query {
        for (name, value) in collect_query(query) {
            request = request.query(name, value);
        }
    }

    for (name, value) in collect_headers(&headers) {
        request = request.header(&name, value);
    }

    let response = render(routes.dispatch(request.build()).await);
    if method == Method::HEAD {
        let (parts, _) = response.into_parts();
        AxumResponse::from_parts(parts, boxed(Empty::new()))
    } else {
        response
    }
}

/// Parses JSON bodies. Bodies of other content types are ignored.
fn parse_body(headers: &HeaderMap, body: &[u8]) -> Result<Value, serde_json::Error> {
    if body.is_empty() || !json_content_type(headers) {
        Ok(Value::Null)
    } else {
        serde_json::from_slice(body)
    }
}

fn json_content_type(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers
        .get(CONTENT_TYPE)
        .and_then(|content_type| content_type.to_str().ok())
    else {
        return false;
    };

    let Ok(mime) = content_type.parse::<mime::Mime>() else {
        return false;
    };

    mime.type_() == "application"
        && (mime.subtype() == "json" || mime.suffix().map_or(false, |name| name == "json"))
}

/// Query parameters by name. Repeated names are collected into arrays.
fn collect_query(query: Vec<(String, String)>) -> Map<String, Value> {
    let mut collected = Map::new();
    for (name, value) in query {
        match collected.get_mut(&name) {
            Some(Value::Array(values)) => values.push(Value::String(value)),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(value)]);
            }
            None => {
                collected.insert(name, Value::String(value));
            }
        }
    }

    collected
}

/// Header values by lower-cased name. Repeated headers are joined with `, `; values which are
/// not valid strings are skipped.
fn collect_headers(headers: &HeaderMap) -> Map<String, Value> {
    headers
        .keys()
        .filter_map(|name| {
            let values = headers
                .get_all(name)
                .iter()
                .filter_map(|value| value.to_str().ok())
                .join(", ");

            (!values.is_empty()).then(|| (name.as_str().to_string(), Value::String(values)))
        })
        .collect()
}

fn render(dispatch: Result<Dispatch, ErrorPtr>) -> AxumResponse {
    match dispatch {
        Ok(Dispatch::Handled { response, value }) => render_parts(response, value),
        Ok(Dispatch::NotFound) => StatusCode::NOT_FOUND.into_response(),
        Err(error) => {
            error!("Unhandled error processing request: {}", error);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn render_parts(parts: ResponseParts, value: Value) -> AxumResponse {
    let mut response = match parts.body {
        ResponseBody::Json(body) => Json(body).into_response(),
        ResponseBody::Text(text) => text.into_response(),
        ResponseBody::Empty if !value.is_null() => Json(value).into_response(),
        ResponseBody::Empty => ().into_response(),
    };

    *response.status_mut() = parts.status;
    for (name, value) in parts.headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            (Ok(name), Ok(value)) => {
                response.headers_mut().append(name, value);
            }
            _ => warn!(name = %name, "Skipping invalid response header"),
        }
    }

    response
}
