//! Routing metadata accumulated for controller types.
//!
//! A [ControllerMetadata] holds the base URL of a controller and a [RouteDeclaration] per handler
//! member. Declarations can be made in any order and from multiple places - every accessor
//! creates missing entries on first use, so partial declarations of the same member merge into a
//! single route:
//!
//! ```
//! use waypost::metadata::{ControllerMetadata, HttpVerb, ParameterBinding};
//!
//! let mut metadata = ControllerMetadata::new("UserController");
//! metadata.set_base_url("/users");
//!
//! // parameters can be declared before the verb
//! metadata
//!     .ensure_route("show")
//!     .add_parameter(ParameterBinding::path_number(0, "id"));
//! metadata.ensure_route("show").get("/:id");
//!
//! let route = metadata.route("show").unwrap();
//! assert_eq!(route.verb(), Some(HttpVerb::Get));
//! assert_eq!(route.parameters().len(), 1);
//! ```

use crate::config::ConflictPolicy;
use crate::error::ConfigurationError;
use crate::handler::RequestHandler;
use derivative::Derivative;
use derive_more::Constructor;
use fxhash::{FxHashMap, FxHashSet};
use http::Method;
use itertools::Itertools;
use std::fmt::{Display, Formatter};
use tracing::warn;

/// HTTP verbs supported by route declarations.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum HttpVerb {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpVerb::Get => "GET",
            HttpVerb::Post => "POST",
            HttpVerb::Put => "PUT",
            HttpVerb::Delete => "DELETE",
        }
    }

    pub fn method(&self) -> Method {
        match self {
            HttpVerb::Get => Method::GET,
            HttpVerb::Post => Method::POST,
            HttpVerb::Put => Method::PUT,
            HttpVerb::Delete => Method::DELETE,
        }
    }

    /// Maps a request method to a verb, if it is one of the supported ones. `HEAD` requests are
    /// served by `GET` routes.
    pub fn from_method(method: &Method) -> Option<Self> {
        match *method {
            Method::GET | Method::HEAD => Some(HttpVerb::Get),
            Method::POST => Some(HttpVerb::Post),
            Method::PUT => Some(HttpVerb::Put),
            Method::DELETE => Some(HttpVerb::Delete),
            _ => None,
        }
    }
}

impl Display for HttpVerb {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source of a single handler argument.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ParameterKind {
    /// The whole [Request](crate::request::Request).
    Request,
    /// The shared [Response](crate::response::Response).
    Response,
    /// The [Next](crate::next::Next) continuation.
    Next,
    /// A path capture, or all of them.
    Path,
    /// A path capture parsed as a number.
    PathNumber,
    /// A query parameter, or all of them.
    Query,
    /// A query parameter parsed as a number.
    QueryNumber,
    /// A field of the body, or the whole body.
    Body,
    /// A header, or all of them.
    Header,
}

/// Describes how to produce the argument at `slot` of a handler.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Constructor)]
pub struct ParameterBinding {
    pub slot: usize,
    pub kind: ParameterKind,
    /// Key within the source collection. `None` binds the whole collection.
    pub source_key: Option<String>,
    /// Only meaningful for the numeric kinds.
    pub is_float: bool,
}

impl ParameterBinding {
    fn keyed(slot: usize, kind: ParameterKind, key: &str) -> Self {
        Self::new(slot, kind, Some(key.to_string()), false)
    }

    fn whole(slot: usize, kind: ParameterKind) -> Self {
        Self::new(slot, kind, None, false)
    }

    pub fn request(slot: usize) -> Self {
        Self::whole(slot, ParameterKind::Request)
    }

    pub fn response(slot: usize) -> Self {
        Self::whole(slot, ParameterKind::Response)
    }

    pub fn next(slot: usize) -> Self {
        Self::whole(slot, ParameterKind::Next)
    }

    pub fn path(slot: usize, key: &str) -> Self {
        Self::keyed(slot, ParameterKind::Path, key)
    }

    pub fn all_path(slot: usize) -> Self {
        Self::whole(slot, ParameterKind::Path)
    }

    pub fn path_number(slot: usize, key: &str) -> Self {
        Self::keyed(slot, ParameterKind::PathNumber, key)
    }

    pub fn path_float(slot: usize, key: &str) -> Self {
        Self::new(slot, ParameterKind::PathNumber, Some(key.to_string()), true)
    }

    pub fn query(slot: usize, key: &str) -> Self {
        Self::keyed(slot, ParameterKind::Query, key)
    }

    pub fn all_query(slot: usize) -> Self {
        Self::whole(slot, ParameterKind::Query)
    }

    pub fn query_number(slot: usize, key: &str) -> Self {
        Self::keyed(slot, ParameterKind::QueryNumber, key)
    }

    pub fn query_float(slot: usize, key: &str) -> Self {
        Self::new(slot, ParameterKind::QueryNumber, Some(key.to_string()), true)
    }

    pub fn body(slot: usize, key: &str) -> Self {
        Self::keyed(slot, ParameterKind::Body, key)
    }

    pub fn whole_body(slot: usize) -> Self {
        Self::whole(slot, ParameterKind::Body)
    }

    pub fn header(slot: usize, key: &str) -> Self {
        Self::keyed(slot, ParameterKind::Header, key)
    }

    pub fn all_headers(slot: usize) -> Self {
        Self::whole(slot, ParameterKind::Header)
    }
}

/// A repeated verb declaration on the same member.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct VerbConflict {
    pub existing: (HttpVerb, String),
    pub declared: (HttpVerb, String),
}

/// Description of a single handler: verb, path, parameter bindings and middleware.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct RouteDeclaration {
    member: String,
    verb: Option<HttpVerb>,
    path: String,
    parameters: Vec<ParameterBinding>,
    #[derivative(Debug = "ignore")]
    middleware: Vec<RequestHandler>,
    catch_errors: bool,
    arity: Option<usize>,
    conflicts: Vec<VerbConflict>,
    conflict_policy: ConflictPolicy,
}

impl RouteDeclaration {
    fn new(member: &str, conflict_policy: ConflictPolicy) -> Self {
        Self {
            member: member.to_string(),
            verb: None,
            path: String::new(),
            parameters: vec![],
            middleware: vec![],
            catch_errors: false,
            arity: None,
            conflicts: vec![],
            conflict_policy,
        }
    }

    /// Sets the verb, path and middleware of this route. Declaring a different verb or path for
    /// a route which already has one is recorded as a conflict and resolved according to the
    /// [ConflictPolicy].
    pub fn set_verb_and_path(
        &mut self,
        verb: HttpVerb,
        path: &str,
        middleware: Vec<RequestHandler>,
    ) -> &mut Self {
        if let Some(existing) = self.verb {
            if existing != verb || self.path != path {
                warn!(
                    member = %self.member,
                    "Route declared as {} '{}' and {} '{}' - applying {:?}",
                    existing,
                    self.path,
                    verb,
                    path,
                    self.conflict_policy
                );

                self.conflicts.push(VerbConflict {
                    existing: (existing, self.path.clone()),
                    declared: (verb, path.to_string()),
                });

                if self.conflict_policy == ConflictPolicy::FirstWins {
                    return self;
                }
            }
        }

        self.verb = Some(verb);
        self.path = path.to_string();
        self.middleware = middleware;
        self
    }

    #[inline]
    pub fn get(&mut self, path: &str) -> &mut Self {
        self.set_verb_and_path(HttpVerb::Get, path, vec![])
    }

    #[inline]
    pub fn post(&mut self, path: &str) -> &mut Self {
        self.set_verb_and_path(HttpVerb::Post, path, vec![])
    }

    #[inline]
    pub fn put(&mut self, path: &str) -> &mut Self {
        self.set_verb_and_path(HttpVerb::Put, path, vec![])
    }

    #[inline]
    pub fn delete(&mut self, path: &str) -> &mut Self {
        self.set_verb_and_path(HttpVerb::Delete, path, vec![])
    }

    /// Appends a parameter binding. Slot collisions are only detected by [Self::validate].
    pub fn add_parameter(&mut self, binding: ParameterBinding) -> &mut Self {
        self.parameters.push(binding);
        self
    }

    /// Enables the error-wrapping adapter for this route.
    pub fn catch_and_send_error(&mut self) -> &mut Self {
        self.catch_errors = true;
        self
    }

    /// Records the number of arguments the handler takes, enabling range checks.
    pub fn set_arity(&mut self, arity: usize) -> &mut Self {
        self.arity = Some(arity);
        self
    }

    #[inline]
    pub fn member(&self) -> &str {
        &self.member
    }

    #[inline]
    pub fn verb(&self) -> Option<HttpVerb> {
        self.verb
    }

    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[inline]
    pub fn parameters(&self) -> &[ParameterBinding] {
        &self.parameters
    }

    #[inline]
    pub fn middleware(&self) -> &[RequestHandler] {
        &self.middleware
    }

    #[inline]
    pub fn catches_errors(&self) -> bool {
        self.catch_errors
    }

    #[inline]
    pub fn arity(&self) -> Option<usize> {
        self.arity
    }

    #[inline]
    pub fn conflicts(&self) -> &[VerbConflict] {
        &self.conflicts
    }

    /// Slot holding the response which receives reported errors: the last response binding, or
    /// the default response slot when the route declares no bindings.
    pub fn response_slot(&self) -> Option<usize> {
        if self.parameters.is_empty() {
            return Some(1);
        }

        self.parameters
            .iter()
            .rev()
            .find(|binding| binding.kind == ParameterKind::Response)
            .map(|binding| binding.slot)
    }

    /// Checks parameter slots for duplicates, gaps and out-of-range indices, and optionally
    /// rejects recorded verb conflicts.
    pub fn validate(
        &self,
        controller: &str,
        reject_verb_conflicts: bool,
    ) -> Result<(), ConfigurationError> {
        if reject_verb_conflicts {
            if let Some(conflict) = self.conflicts.first() {
                return Err(ConfigurationError::ConflictingVerbs {
                    controller: controller.to_string(),
                    member: self.member.clone(),
                    first: format!("{} '{}'", conflict.existing.0, conflict.existing.1),
                    second: format!("{} '{}'", conflict.declared.0, conflict.declared.1),
                });
            }
        }

        let mut bound = FxHashSet::default();
        for binding in &self.parameters {
            if !bound.insert(binding.slot) {
                return Err(ConfigurationError::DuplicateSlot {
                    controller: controller.to_string(),
                    member: self.member.clone(),
                    slot: binding.slot,
                });
            }
        }

        let Some(arity) = self.arity else {
            return Ok(());
        };

        if self.parameters.is_empty() {
            // the default arguments: request, response, next
            bound.extend(0..3);
        } else if let Some(slot) = bound.iter().copied().filter(|slot| *slot >= arity).min() {
            return Err(ConfigurationError::SlotOutOfRange {
                controller: controller.to_string(),
                member: self.member.clone(),
                slot,
                arity,
            });
        }

        match (0..arity).find(|slot| !bound.contains(slot)) {
            Some(slot) => Err(ConfigurationError::UnboundSlot {
                controller: controller.to_string(),
                member: self.member.clone(),
                slot,
            }),
            None => Ok(()),
        }
    }
}

/// Routing metadata of a single controller type.
#[derive(Clone, Debug)]
pub struct ControllerMetadata {
    type_name: String,
    base_url: String,
    routes: FxHashMap<String, RouteDeclaration>,
    conflict_policy: ConflictPolicy,
}

impl ControllerMetadata {
    pub fn new(type_name: &str) -> Self {
        Self::with_policy(type_name, ConflictPolicy::default())
    }

    pub fn with_policy(type_name: &str, conflict_policy: ConflictPolicy) -> Self {
        Self {
            type_name: type_name.to_string(),
            base_url: String::new(),
            routes: FxHashMap::default(),
            conflict_policy,
        }
    }

    #[inline]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    #[inline]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sets the prefix for all routes of this controller. The path is used verbatim.
    pub fn set_base_url(&mut self, path: &str) -> &mut Self {
        self.base_url = path.to_string();
        self
    }

    /// Returns the declaration for given member, creating an empty one if needed.
    pub fn ensure_route(&mut self, member: &str) -> &mut RouteDeclaration {
        let conflict_policy = self.conflict_policy;
        self.routes
            .entry(member.to_string())
            .or_insert_with(|| RouteDeclaration::new(member, conflict_policy))
    }

    #[inline]
    pub fn route(&self, member: &str) -> Option<&RouteDeclaration> {
        self.routes.get(member)
    }

    /// Returns all declared routes ordered by member name.
    pub fn routes(&self) -> impl Iterator<Item = &RouteDeclaration> {
        self.routes
            .values()
            .sorted_by(|left, right| left.member.cmp(&right.member))
    }

    #[inline]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Validates every route. See [RouteDeclaration::validate].
    pub fn validate(&self, reject_verb_conflicts: bool) -> Result<(), ConfigurationError> {
        self.routes()
            .try_for_each(|route| route.validate(&self.type_name, reject_verb_conflicts))
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ConflictPolicy;
    use crate::error::ConfigurationError;
    use crate::metadata::{ControllerMetadata, HttpVerb, ParameterBinding, VerbConflict};
    use http::Method;

    #[test]
    fn should_map_request_methods() {
        assert_eq!(HttpVerb::from_method(&Method::GET), Some(HttpVerb::Get));
        assert_eq!(HttpVerb::from_method(&Method::HEAD), Some(HttpVerb::Get));
        assert_eq!(HttpVerb::from_method(&Method::DELETE), Some(HttpVerb::Delete));
        assert_eq!(HttpVerb::from_method(&Method::PATCH), None);
    }

    #[test]
    fn should_create_route_once() {
        let mut metadata = ControllerMetadata::new("Test");
        metadata
            .ensure_route("show")
            .add_parameter(ParameterBinding::request(0));
        metadata
            .ensure_route("show")
            .add_parameter(ParameterBinding::response(1));

        assert_eq!(metadata.route_count(), 1);
        assert_eq!(metadata.route("show").unwrap().parameters().len(), 2);
        assert_eq!(metadata.route("show").unwrap().verb(), None);
    }

    #[test]
    fn should_overwrite_base_url() {
        let mut metadata = ControllerMetadata::new("Test");
        assert_eq!(metadata.base_url(), "");

        metadata.set_base_url("users").set_base_url("/people");
        assert_eq!(metadata.base_url(), "/people");
    }

    #[test]
    fn should_apply_last_verb_by_default() {
        let mut metadata = ControllerMetadata::new("Test");
        metadata.ensure_route("show").get("/a").post("/b");

        let route = metadata.route("show").unwrap();
        assert_eq!(route.verb(), Some(HttpVerb::Post));
        assert_eq!(route.path(), "/b");
        assert_eq!(
            route.conflicts(),
            &[VerbConflict {
                existing: (HttpVerb::Get, "/a".to_string()),
                declared: (HttpVerb::Post, "/b".to_string()),
            }]
        );
    }

    #[test]
    fn should_keep_first_verb_with_first_wins() {
        let mut metadata = ControllerMetadata::with_policy("Test", ConflictPolicy::FirstWins);
        metadata.ensure_route("show").get("/a").delete("/b");

        let route = metadata.route("show").unwrap();
        assert_eq!(route.verb(), Some(HttpVerb::Get));
        assert_eq!(route.path(), "/a");
        assert_eq!(route.conflicts().len(), 1);
    }

    #[test]
    fn should_not_record_identical_redeclaration() {
        let mut metadata = ControllerMetadata::new("Test");
        metadata.ensure_route("show").get("/a").get("/a");

        assert!(metadata.route("show").unwrap().conflicts().is_empty());
    }

    #[test]
    fn should_reject_conflicts_when_requested() {
        let mut metadata = ControllerMetadata::new("Test");
        metadata.ensure_route("show").get("/a").put("/a");

        assert!(metadata.validate(false).is_ok());
        assert!(matches!(
            metadata.validate(true).unwrap_err(),
            ConfigurationError::ConflictingVerbs { .. }
        ));
    }

    #[test]
    fn should_detect_duplicate_slots() {
        let mut metadata = ControllerMetadata::new("Test");
        metadata
            .ensure_route("show")
            .get("/")
            .add_parameter(ParameterBinding::query(0, "a"))
            .add_parameter(ParameterBinding::query(0, "b"));

        assert_eq!(
            metadata.validate(false).unwrap_err(),
            ConfigurationError::DuplicateSlot {
                controller: "Test".to_string(),
                member: "show".to_string(),
                slot: 0,
            }
        );
    }

    #[test]
    fn should_detect_out_of_range_slots() {
        let mut metadata = ControllerMetadata::new("Test");
        metadata
            .ensure_route("show")
            .get("/")
            .add_parameter(ParameterBinding::query(0, "a"))
            .add_parameter(ParameterBinding::query(3, "b"))
            .set_arity(2);

        assert!(matches!(
            metadata.validate(false).unwrap_err(),
            ConfigurationError::SlotOutOfRange {
                slot: 3,
                arity: 2,
                ..
            }
        ));
    }

    #[test]
    fn should_detect_unbound_slots() {
        let mut metadata = ControllerMetadata::new("Test");
        metadata
            .ensure_route("show")
            .get("/")
            .add_parameter(ParameterBinding::query(1, "a"))
            .set_arity(2);

        assert!(matches!(
            metadata.validate(false).unwrap_err(),
            ConfigurationError::UnboundSlot { slot: 0, .. }
        ));
    }

    #[test]
    fn should_accept_default_arguments() {
        let mut metadata = ControllerMetadata::new("Test");
        metadata.ensure_route("none").get("/").set_arity(0);
        metadata.ensure_route("all").get("/all").set_arity(3);

        assert!(metadata.validate(false).is_ok());

        metadata.ensure_route("extra").get("/extra").set_arity(4);
        assert!(matches!(
            metadata.validate(false).unwrap_err(),
            ConfigurationError::UnboundSlot { slot: 3, .. }
        ));
    }

    #[test]
    fn should_find_response_slot() {
        let mut metadata = ControllerMetadata::new("Test");
        metadata.ensure_route("default").get("/");
        metadata
            .ensure_route("bound")
            .get("/bound")
            .add_parameter(ParameterBinding::body(0, "name"))
            .add_parameter(ParameterBinding::response(2));
        metadata
            .ensure_route("unbound")
            .get("/unbound")
            .add_parameter(ParameterBinding::request(0));

        assert_eq!(metadata.route("default").unwrap().response_slot(), Some(1));
        assert_eq!(metadata.route("bound").unwrap().response_slot(), Some(2));
        assert_eq!(metadata.route("unbound").unwrap().response_slot(), None);
    }

    #[test]
    fn should_order_routes_by_member() {
        let mut metadata = ControllerMetadata::new("Test");
        metadata.ensure_route("b").get("/b");
        metadata.ensure_route("a").get("/a");
        metadata.ensure_route("c").get("/c");

        let members: Vec<_> = metadata.routes().map(|route| route.member()).collect();
        assert_eq!(members, vec!["a", "b", "c"]);
    }
}
