//! Declarative controllers for express-style routers.
//!
//! Handlers are grouped in [*Controllers*](controller::Controller), whose routes and handler
//! parameters are described by [metadata](metadata). At startup, the metadata is compiled into
//! route registrations of any [Router](router::Router), and on every request the declared
//! parameter bindings are used to build handler arguments from the incoming request.
//!
//! ### Simple usage example
//!
//! ```
//! use serde_json::{json, Value};
//! use std::sync::Arc;
//! use waypost::controller;
//! use waypost::registry::ControllerRegistry;
//! use waypost::request::Request;
//! use waypost::router::{Dispatch, RouteTable};
//!
//! struct UserController;
//!
//! // mark the impl block as a controller - this will scan all functions for the route and
//! // parameter attributes and generate metadata declarations out of them
//! #[controller(path = "/users")]
//! impl UserController {
//!     // responds to GET /users/:id, with the "id" capture parsed as a number
//!     #[get("/:id")]
//!     async fn show(&self, #[num_param("id")] id: Option<i64>) -> Value {
//!         json!({ "id": id })
//!     }
//! }
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let mut router = RouteTable::new();
//! ControllerRegistry::default()
//!     .register(&mut router, Arc::new(UserController))
//!     .unwrap();
//!
//! let dispatch = router
//!     .dispatch(Request::builder().path("/users/7").build())
//!     .await
//!     .unwrap();
//!
//! assert!(matches!(dispatch, Dispatch::Handled { value, .. } if value == json!({ "id": 7 })));
//! # });
//! ```
//!
//! ### Features
//!
//! * `derive` - automatically import helper proc macros

pub mod argument;
pub mod catch;
pub mod compiler;
pub mod config;
pub mod controller;
pub mod error;
pub mod handler;
pub mod metadata;
pub mod next;
pub mod registry;
pub mod request;
pub mod resolver;
pub mod response;
pub mod router;

pub use http;

#[cfg(feature = "derive")]
pub use waypost_derive::*;
