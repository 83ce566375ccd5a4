//! [axum](https://crates.io/crates/axum) integration for
//! [waypost](https://crates.io/crates/waypost) controllers.
//!
//! [AxumRouter](router::AxumRouter) implements the waypost [Router](waypost::router::Router)
//! trait, so controllers can be registered with it directly. Incoming requests are translated
//! into waypost [requests](waypost::request::Request) (path captures, query, lower-cased headers
//! and JSON body), run through the matching route chains, and the resulting
//! [response](waypost::response::Response) is rendered back.
//!
//! ### Simple usage example
//!
//! ```no_run
//! use std::sync::Arc;
//! use waypost::controller;
//! use waypost::registry::register_controller;
//! use waypost_axum::router::AxumRouter;
//!
//! struct ExampleController;
//!
//! #[controller]
//! impl ExampleController {
//!     #[get("/")]
//!     async fn hello_world(&self) -> &'static str {
//!         "Hello world!"
//!     }
//! }
//!
//! // note: for the sake of simplicity, errors are unwrapped, rather than
//! // gracefully handled
//! #[tokio::main]
//! async fn main() {
//!     let mut router = AxumRouter::new();
//!     register_controller(&mut router, Arc::new(ExampleController))
//!         .expect("unable to register controller");
//!
//!     router
//!         .serve("127.0.0.1:8080", std::future::pending())
//!         .await
//!         .expect("error running server");
//! }
//! ```

pub mod router;
pub mod server;

pub use axum;
