//! Mock API server plumbing shared by the async tests.

use http::{Method, Request, Response, StatusCode};
use kube::Client;
use kube::client::Body;
use serde_json::{Value, json};
use std::time::Duration;

type ApiServerHandle = tower_test::mock::Handle<Request<Body>, Response<Body>>;

/// Answers requests from a mocked client in a fixed order.
pub struct ApiServer(ApiServerHandle);

/// One expected request and the canned response it gets.
pub struct Exchange {
    method: Method,
    path: String,
    status: StatusCode,
    body: Value,
}

impl Exchange {
    pub fn get(path: &str, body: Value) -> Self {
        Self {
            method: Method::GET,
            path: path.to_string(),
            status: StatusCode::OK,
            body,
        }
    }

    pub fn post(path: &str, body: Value) -> Self {
        Self {
            method: Method::POST,
            path: path.to_string(),
            status: StatusCode::CREATED,
            body,
        }
    }

    pub fn not_found(method: Method, path: &str, resource: &str, name: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            status: StatusCode::NOT_FOUND,
            body: status_body(404, "NotFound", &format!("{resource} \"{name}\" not found")),
        }
    }

    pub fn conflict(path: &str, resource: &str, name: &str) -> Self {
        Self {
            method: Method::POST,
            path: path.to_string(),
            status: StatusCode::CONFLICT,
            body: status_body(
                409,
                "AlreadyExists",
                &format!("{resource} \"{name}\" already exists"),
            ),
        }
    }

    pub fn forbidden(path: &str) -> Self {
        Self {
            method: Method::GET,
            path: path.to_string(),
            status: StatusCode::FORBIDDEN,
            body: status_body(403, "Forbidden", "forbidden"),
        }
    }
}

impl ApiServer {
    /// Serves `exchanges` in order, asserting each request's method and path.
    ///
    /// The returned handle resolves to the server so the test can check that no
    /// further requests were made.
    pub fn serve(mut self, exchanges: Vec<Exchange>) -> tokio::task::JoinHandle<Self> {
        tokio::spawn(async move {
            for exchange in exchanges {
                let (request, send) = self
                    .0
                    .next_request()
                    .await
                    .expect("client made fewer requests than expected");
                assert_eq!(request.method(), exchange.method);
                assert_eq!(request.uri().path(), exchange.path);

                let body = serde_json::to_vec(&exchange.body).unwrap();
                send.send_response(
                    Response::builder()
                        .status(exchange.status)
                        .body(Body::from(body))
                        .unwrap(),
                );
            }
            self
        })
    }

    /// Waits for the client side to go away and fails if it issued another request.
    pub async fn assert_no_more_requests(mut self) {
        let next = tokio::time::timeout(Duration::from_secs(1), self.0.next_request())
            .await
            .expect("mock client was not dropped");
        if let Some((request, _)) = next {
            panic!("unexpected request: {} {}", request.method(), request.uri());
        }
    }
}

pub fn mock_client() -> (Client, ApiServer) {
    let (mock_service, handle) = tower_test::mock::pair::<Request<Body>, Response<Body>>();
    let client = Client::new(mock_service, "default");
    (client, ApiServer(handle))
}

pub fn list_body(api_version: &str, kind: &str, items: Vec<Value>) -> Value {
    json!({
        "apiVersion": api_version,
        "kind": format!("{kind}List"),
        "metadata": { "resourceVersion": "1" },
        "items": items,
    })
}

fn status_body(code: u16, reason: &str, message: &str) -> Value {
    json!({
        "kind": "Status",
        "apiVersion": "v1",
        "metadata": {},
        "status": "Failure",
        "message": message,
        "reason": reason,
        "code": code,
    })
}
