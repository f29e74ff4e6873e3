//! Request-level tests that drive the real router over the in-memory store.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use crate::models::NewUser;
use crate::routes::api_routes;
use crate::state::AppState;
use crate::store::Store;

mod events;

pub(crate) struct TestApp {
    pub router: Router,
    pub state: AppState,
}

pub(crate) struct TestUser {
    pub id: Uuid,
    pub auth: String,
}

impl TestApp {
    pub fn new() -> Self {
        Self::from_state(AppState::in_memory())
    }

    pub fn with_store(store: Arc<dyn Store>) -> Self {
        Self::from_state(AppState::new(store))
    }

    fn from_state(state: AppState) -> Self {
        Self {
            router: api_routes(state.clone()),
            state,
        }
    }

    /// Seeds a user and API token straight into the store, skipping password hashing.
    pub async fn user(&self, username: &str, first_name: &str, last_name: &str) -> TestUser {
        let user = self
            .state
            .store
            .insert_user(NewUser {
                username: username.to_string(),
                email: format!("{}@example.com", username),
                password_hash: "!".to_string(),
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
            })
            .await
            .unwrap();

        let token = format!("{}-token", username);
        self.state.store.insert_token(&token, user.id).await.unwrap();

        TestUser {
            id: user.id,
            auth: format!("Token {}", token),
        }
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        auth: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        send(self.router.clone(), method, uri, auth, body).await
    }

    pub async fn create_event(&self, owner: &TestUser, name: &str) -> Value {
        let (status, body) = self
            .send(
                Method::POST,
                "/eventos",
                Some(&owner.auth),
                Some(serde_json::json!({
                    "nombre": name,
                    "fecha": "2030-05-01T18:00:00Z",
                    "descripcion": "Charlas y networking",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"].clone()
    }
}

pub(crate) async fn send(
    router: Router,
    method: Method,
    uri: &str,
    auth: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        request = request.header(header::AUTHORIZATION, auth);
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, body)
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();
    let (status, body) = app.send(Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn test_full_router_adds_security_headers() {
    let config = crate::config::Config {
        database_url: String::new(),
        max_connections: 1,
        host: std::net::Ipv4Addr::LOCALHOST.into(),
        port: 0,
        storage: crate::config::StorageBackend::Memory,
        cors_allowed_origins: None,
        production: false,
    };
    let router = crate::routes::create_routes(AppState::in_memory(), &config);

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert_eq!(response.headers()["x-frame-options"], "DENY");
    assert!(response.headers().get("strict-transport-security").is_none());
}
