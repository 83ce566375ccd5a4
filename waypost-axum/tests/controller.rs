use portpicker::pick_unused_port;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::oneshot;
use waypost::controller;
use waypost::registry::ControllerRegistry;
use waypost::response::Response;
use waypost_axum::router::AxumRouter;

#[derive(Error, Debug)]
#[error("unknown user")]
struct UnknownUser;

struct TestController;

#[controller(path = "/test")]
impl TestController {
    #[get("/:user_id")]
    async fn hello_user(&self, #[num_param("user_id")] user_id: Option<i64>) -> Value {
        json!({ "user": user_id })
    }

    #[post("/")]
    #[catch_and_send_error]
    async fn post_something(
        &self,
        #[body("name")] name: Option<String>,
        #[header("x-source")] source: Option<String>,
        #[response] response: Response,
    ) -> Result<(), UnknownUser> {
        let name = name.ok_or(UnknownUser)?;
        response
            .status(StatusCode::CREATED)
            .json(json!({ "posted": name, "source": source }));
        Ok(())
    }
}

#[tokio::test]
async fn should_serve_controller() {
    let mut router = AxumRouter::new();
    ControllerRegistry::default()
        .register(&mut router, Arc::new(TestController))
        .unwrap();

    let address = format!("127.0.0.1:{}", pick_unused_port().unwrap());
    let (shutdown_sender, shutdown_receiver) = oneshot::channel::<()>();

    let server_address = address.clone();
    let handle = tokio::spawn(async move {
        router
            .serve(&server_address, async {
                let _ = shutdown_receiver.await;
            })
            .await
            .unwrap();
    });

    let client = reqwest::Client::new();
    let base = format!("http://{address}/test");

    // the server may not be listening yet
    let mut response = None;
    for _ in 0..50 {
        match client.get(format!("{base}/42")).send().await {
            Ok(result) => {
                response = Some(result);
                break;
            }
            Err(_) => tokio::time::sleep(std::time::Duration::from_millis(20)).await,
        }
    }

    let response = response.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.json::<Value>().await.unwrap(),
        json!({ "user": 42 })
    );

    let response = client
        .post(&base)
        .header("X-Source", "test")
        .json(&json!({ "name": "kate" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        response.json::<Value>().await.unwrap(),
        json!({ "posted": "kate", "source": "test" })
    );

    let response = client
        .post(&base)
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>().await.unwrap(),
        json!({ "error": "unknown user" })
    );

    let response = client
        .delete(format!("{base}/42"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    shutdown_sender.send(()).unwrap();
    handle.await.unwrap();
}
