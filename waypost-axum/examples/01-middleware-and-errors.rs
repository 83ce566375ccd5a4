// note: this example assumes you've analyzed the previous one

use std::sync::Arc;
use thiserror::Error;
use tracing_subscriber::EnvFilter;
use waypost::controller;
use waypost::handler::{handler_fn, RequestHandler};
use waypost::http::StatusCode;
use waypost::next::Next;
use waypost::registry::register_controller;
use waypost::request::Request;
use waypost::response::Response;
use waypost_axum::router::AxumRouter;

#[derive(Error, Debug)]
#[error("item name cannot be empty")]
struct EmptyName;

// middleware runs before the handler and decides whether to pass the request on
fn require_token() -> RequestHandler {
    handler_fn(|request: Request, response: Response, next: Next| async move {
        if request.headers().contains_key("x-token") {
            next.call();
        } else {
            response
                .status(StatusCode::UNAUTHORIZED)
                .send("missing token");
        }
    })
}

struct ItemController;

#[controller(path = "/items")]
impl ItemController {
    // errors of this handler are sent as 400 {"error": "..."} to the bound response
    #[post("/", middleware = [require_token()])]
    #[catch_and_send_error]
    async fn create(
        &self,
        #[body("name")] name: Option<String>,
        #[response] response: Response,
    ) -> Result<String, EmptyName> {
        let name = name.filter(|name| !name.is_empty()).ok_or(EmptyName)?;
        response.status(StatusCode::CREATED);
        Ok(name)
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut router = AxumRouter::new();
    register_controller(&mut router, Arc::new(ItemController))
        .expect("unable to register controller");

    router
        .serve("127.0.0.1:8080", async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .expect("error running server");
}
