use serde_json::{json, Value};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use waypost::controller;
use waypost::registry::register_controller;
use waypost_axum::router::AxumRouter;

// a plain struct serving as our controller - any state it needs can be passed in when
// registering
struct ExampleController {
    greeting: String,
}

// mark the impl block as a controller - this will scan all functions for the route attributes and
// declare routes out of them
#[controller]
impl ExampleController {
    // this function will respond to GET request for http://localhost:8080/
    #[get("/")]
    async fn hello_world(&self) -> &'static str {
        "Hello world!"
    }

    // path captures, query values, headers and body fields are bound to parameters by attributes
    #[get("/:user")]
    async fn hello_user(
        &self,
        #[param("user")] user: Option<String>,
        #[num_query("times")] times: Option<i64>,
    ) -> Value {
        json!({
            "message": format!("{} {}!", self.greeting, user.unwrap_or_default()),
            "times": times.unwrap_or(1),
        })
    }
}

// note: for the sake of simplicity, errors are unwrapped, rather than gracefully handled
#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut router = AxumRouter::new();
    register_controller(
        &mut router,
        Arc::new(ExampleController {
            greeting: "Hello".to_string(),
        }),
    )
    .expect("unable to register controller");

    // requests should be forwarded to ExampleController
    router
        .serve("127.0.0.1:8080", async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .expect("error running server");
}
