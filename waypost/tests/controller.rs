use serde_json::{json, Map, Value};
use std::sync::Arc;
use thiserror::Error;
use waypost::controller;
use waypost::error::ConfigurationError;
use waypost::handler::{handler_fn, RequestHandler};
use waypost::http::{Method, StatusCode};
use waypost::metadata::HttpVerb;
use waypost::next::Next;
use waypost::registry::{register_controller, ControllerRegistry};
use waypost::request::Request;
use waypost::response::{Response, ResponseBody, ResponseParts};
use waypost::router::{Dispatch, RouteTable};

#[derive(Error, Debug)]
#[error("name is required")]
struct ValidationError;

fn require_tenant() -> RequestHandler {
    handler_fn(|request: Request, response: Response, next: Next| async move {
        if request.headers().contains_key("x-tenant") {
            next.call();
        } else {
            response.status(StatusCode::UNAUTHORIZED).end();
        }
    })
}

struct UserController;

#[controller(path = "/users")]
impl UserController {
    #[get("/:id")]
    async fn show(&self, #[num_param("id")] id: Option<i64>) -> Value {
        json!({ "id": id })
    }

    #[get("/")]
    async fn list(
        &self,
        #[query("name")] name: Option<String>,
        #[num_query("limit")] limit: Option<i64>,
        #[num_query("ratio", float)] ratio: Option<f64>,
    ) -> Value {
        json!({ "name": name, "limit": limit, "ratio": ratio })
    }

    #[post("/")]
    #[catch_and_send_error]
    async fn create(
        &self,
        #[body("name")] name: Option<String>,
        #[header("x-tenant")] tenant: Option<String>,
        #[response] response: Response,
    ) -> Result<Value, ValidationError> {
        let name = name.ok_or(ValidationError)?;
        response.status(StatusCode::CREATED);
        Ok(json!({ "name": name, "tenant": tenant }))
    }

    #[delete("/:id", middleware = [require_tenant()])]
    async fn remove(&self, #[param("id")] id: Option<String>) -> Value {
        json!({ "removed": id })
    }

    #[put("/top")]
    #[delete("/bottom")]
    fn ordered(&self) -> &'static str {
        "ordered"
    }

    #[get("/raw/:anything")]
    fn raw(&self, request: Request, response: Response, _next: Next) {
        response
            .status(StatusCode::ACCEPTED)
            .send(request.path().to_string());
    }

    #[get("/broken/now")]
    #[catch_and_send_error]
    async fn broken(
        &self,
        #[query] _query: Option<Map<String, Value>>,
    ) -> Result<(), ValidationError> {
        Err(ValidationError)
    }

    // not a route
    fn helper(&self) -> i32 {
        42
    }
}

struct GapController;

#[controller]
impl GapController {
    #[get("/gap")]
    fn gap(&self, #[param("a")] _a: Option<String>, _b: Option<String>) {}
}

struct GlobalController;

#[controller(path = "/global")]
impl GlobalController {
    #[get]
    fn index(&self) -> &'static str {
        "global"
    }
}

fn router() -> RouteTable {
    let mut router = RouteTable::new();
    ControllerRegistry::default()
        .register(&mut router, Arc::new(UserController))
        .unwrap();
    router
}

async fn handled(router: &RouteTable, request: Request) -> (ResponseParts, Value) {
    match router.dispatch(request).await.unwrap() {
        Dispatch::Handled { response, value } => (response, value),
        Dispatch::NotFound => panic!("request not handled"),
    }
}

#[tokio::test]
async fn should_bind_numeric_path_parameter() {
    let (_, value) = handled(&router(), Request::builder().path("/users/7").build()).await;
    assert_eq!(value, json!({ "id": 7 }));

    let (_, value) = handled(&router(), Request::builder().path("/users/abc").build()).await;
    assert_eq!(value, json!({ "id": null }));
}

#[tokio::test]
async fn should_bind_query_parameters() {
    let (_, value) = handled(
        &router(),
        Request::builder()
            .path("/users")
            .query("name", "kate")
            .query("limit", "10items")
            .query("ratio", "3.14")
            .build(),
    )
    .await;

    assert_eq!(value, json!({ "name": "kate", "limit": 10, "ratio": 3.14 }));
}

#[tokio::test]
async fn should_bind_body_header_and_response() {
    let (response, value) = handled(
        &router(),
        Request::builder()
            .method(Method::POST)
            .path("/users")
            .header("X-Tenant", "acme")
            .body(json!({ "name": "kate" }))
            .build(),
    )
    .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(value, json!({ "name": "kate", "tenant": "acme" }));
}

#[tokio::test]
async fn should_send_caught_errors() {
    let (response, value) = handled(
        &router(),
        Request::builder()
            .method(Method::POST)
            .path("/users")
            .body(json!({}))
            .build(),
    )
    .await;

    assert_eq!(value, Value::Null);
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.body,
        ResponseBody::Json(json!({ "error": "name is required" }))
    );
}

#[tokio::test]
async fn should_propagate_errors_without_response() {
    let error = router()
        .dispatch(Request::builder().path("/users/broken/now").build())
        .await
        .unwrap_err();

    assert_eq!(error.to_string(), "name is required");
}

#[tokio::test]
async fn should_run_middleware_before_handler() {
    let (response, value) = handled(
        &router(),
        Request::builder()
            .method(Method::DELETE)
            .path("/users/5")
            .build(),
    )
    .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(response.sent);
    assert_eq!(value, Value::Null);

    let (_, value) = handled(
        &router(),
        Request::builder()
            .method(Method::DELETE)
            .path("/users/5")
            .header("x-tenant", "acme")
            .build(),
    )
    .await;

    assert_eq!(value, json!({ "removed": "5" }));
}

#[tokio::test]
async fn should_apply_top_most_verb() {
    let router = router();
    assert!(router.find(HttpVerb::Put, "/users/top").is_some());
    assert!(router.find(HttpVerb::Delete, "/users/bottom").is_none());

    let (_, value) = handled(
        &router,
        Request::builder()
            .method(Method::PUT)
            .path("/users/top")
            .build(),
    )
    .await;
    assert_eq!(value, json!("ordered"));
}

#[tokio::test]
async fn should_pass_default_arguments() {
    let (response, _) = handled(
        &router(),
        Request::builder().path("/users/raw/x").build(),
    )
    .await;

    assert_eq!(response.status, StatusCode::ACCEPTED);
    assert_eq!(response.body, ResponseBody::Text("/users/raw/x".to_string()));
}

#[test]
fn should_declare_only_annotated_methods() {
    let mut registry = ControllerRegistry::default();
    let metadata = registry.declare::<UserController>();

    assert_eq!(metadata.base_url(), "/users");
    assert_eq!(metadata.route_count(), 7);
    assert!(metadata.route("helper").is_none());
    assert_eq!(metadata.route("ordered").unwrap().conflicts().len(), 1);
    assert_eq!(UserController.helper(), 42);
}

#[test]
fn should_reject_unbound_slots() {
    let mut router = RouteTable::new();
    assert!(matches!(
        ControllerRegistry::default().register(&mut router, Arc::new(GapController)),
        Err(ConfigurationError::UnboundSlot { slot: 1, .. })
    ));
}

#[tokio::test]
async fn should_register_with_global_registry() {
    let mut router = RouteTable::new();
    register_controller(&mut router, Arc::new(GlobalController)).unwrap();

    let (_, value) = handled(&router, Request::builder().path("/global").build()).await;
    assert_eq!(value, json!("global"));
}
