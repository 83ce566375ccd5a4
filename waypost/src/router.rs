//! Router abstraction which compiled controllers are registered with, along with [RouteTable] -
//! an in-memory router also used as the sub-router holding a single controller's routes.

use crate::error::ErrorPtr;
use crate::handler::{run_chain, ChainOutcome, RequestHandler};
use crate::metadata::HttpVerb;
use crate::request::Request;
use crate::response::{Response, ResponseParts};
use derivative::Derivative;
#[cfg(test)]
use mockall::automock;
use percent_encoding::percent_decode_str;
use serde_json::{Map, Value};
use tracing::debug;

/// Host router accepting route registrations. Paths use the `/segment/:capture` syntax.
#[cfg_attr(test, automock)]
pub trait Router {
    fn get(&mut self, path: &str, handlers: Vec<RequestHandler>);

    fn post(&mut self, path: &str, handlers: Vec<RequestHandler>);

    fn put(&mut self, path: &str, handlers: Vec<RequestHandler>);

    fn delete(&mut self, path: &str, handlers: Vec<RequestHandler>);

    /// Mounts all routes of `routes` under `prefix`.
    fn nest(&mut self, prefix: &str, routes: RouteTable);
}

/// Verb-generic registration for any [Router].
pub trait RouterExt: Router {
    fn route(&mut self, verb: HttpVerb, path: &str, handlers: Vec<RequestHandler>) {
        match verb {
            HttpVerb::Get => self.get(path, handlers),
            HttpVerb::Post => self.post(path, handlers),
            HttpVerb::Put => self.put(path, handlers),
            HttpVerb::Delete => self.delete(path, handlers),
        }
    }
}

impl<R: Router + ?Sized> RouterExt for R {}

/// A registered route.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct RouteEntry {
    pub verb: HttpVerb,
    pub path: String,
    #[derivative(Debug = "ignore")]
    pub handlers: Vec<RequestHandler>,
}

/// Result of [RouteTable::dispatch].
#[derive(Clone, Debug, PartialEq)]
pub enum Dispatch {
    /// A route chain handled the request.
    Handled {
        response: ResponseParts,
        value: Value,
    },
    /// No route matched, or every matching chain passed the request on.
    NotFound,
}

/// In-memory router keeping routes in registration order.
#[derive(Clone, Debug, Default)]
pub struct RouteTable {
    routes: Vec<RouteEntry>,
}

impl Router for RouteTable {
    fn get(&mut self, path: &str, handlers: Vec<RequestHandler>) {
        self.push(HttpVerb::Get, path, handlers);
    }

    fn post(&mut self, path: &str, handlers: Vec<RequestHandler>) {
        self.push(HttpVerb::Post, path, handlers);
    }

    fn put(&mut self, path: &str, handlers: Vec<RequestHandler>) {
        self.push(HttpVerb::Put, path, handlers);
    }

    fn delete(&mut self, path: &str, handlers: Vec<RequestHandler>) {
        self.push(HttpVerb::Delete, path, handlers);
    }

    fn nest(&mut self, prefix: &str, routes: RouteTable) {
        self.routes
            .extend(routes.routes.into_iter().map(|route| RouteEntry {
                path: join_path(prefix, &route.path),
                ..route
            }));
    }
}

impl RouteTable {
    pub fn new() -> Self {
        Default::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    #[inline]
    pub fn routes(&self) -> &[RouteEntry] {
        &self.routes
    }

    #[inline]
    pub fn into_routes(self) -> Vec<RouteEntry> {
        self.routes
    }

    /// Finds the first route registered for given verb and path pattern.
    pub fn find(&self, verb: HttpVerb, path: &str) -> Option<&RouteEntry> {
        self.routes
            .iter()
            .find(|route| route.verb == verb && route.path == path)
    }

    fn push(&mut self, verb: HttpVerb, path: &str, handlers: Vec<RequestHandler>) {
        debug!(%verb, path, "Adding route");
        self.routes.push(RouteEntry {
            verb,
            path: normalize_path(path),
            handlers,
        });
    }

    /// Runs the request through every route matching its method and path, in registration
    /// order, until one of them handles it.
    pub async fn dispatch(&self, request: Request) -> Result<Dispatch, ErrorPtr> {
        let Some(verb) = HttpVerb::from_method(request.method()) else {
            return Ok(Dispatch::NotFound);
        };

        let response = Response::default();
        for route in self.routes.iter().filter(|route| route.verb == verb) {
            let Some(params) = match_path(&route.path, request.path()) else {
                continue;
            };

            debug!(%verb, pattern = %route.path, path = request.path(), "Dispatching request");

            let request = request.with_params(params);
            if let ChainOutcome::Handled(value) =
                run_chain(&route.handlers, &request, &response).await?
            {
                return Ok(Dispatch::Handled {
                    response: response.parts(),
                    value,
                });
            }
        }

        Ok(Dispatch::NotFound)
    }
}

/// Ensures a leading slash and removes a trailing one. An empty path becomes `/`.
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Joins a mount prefix with a route path.
pub fn join_path(prefix: &str, path: &str) -> String {
    let prefix = normalize_path(prefix);
    let path = normalize_path(path);

    match (prefix.as_str(), path.as_str()) {
        ("/", path) => path.to_string(),
        (prefix, "/") => prefix.to_string(),
        (prefix, path) => format!("{prefix}{path}"),
    }
}

/// Matches a path against a pattern, returning percent-decoded captured segments. Empty segments
/// are ignored, so trailing slashes do not matter.
pub fn match_path(pattern: &str, path: &str) -> Option<Map<String, Value>> {
    let mut pattern_segments = pattern.split('/').filter(|segment| !segment.is_empty());
    let mut path_segments = path.split('/').filter(|segment| !segment.is_empty());
    let mut params = Map::new();

    loop {
        match (pattern_segments.next(), path_segments.next()) {
            (None, None) => return Some(params),
            (Some(expected), Some(actual)) => {
                if let Some(name) = expected.strip_prefix(':') {
                    params.insert(name.to_string(), Value::from(decode_segment(actual)));
                } else if expected != actual {
                    return None;
                }
            }
            _ => return None,
        }
    }
}

/// Segments which do not decode to valid UTF-8 are kept as they are.
fn decode_segment(segment: &str) -> String {
    percent_decode_str(segment)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}
