//! Shared harness: the full router over a fresh in-memory store, driven with
//! `tower::ServiceExt::oneshot`.
#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;

use api_adapters::{build_router, AppState, PageLimits, Ports};
use auth_adapters::{Argon2PasswordHasher, JwtTokenService};
use domains::Role;
use services::Credentials;
use storage_adapters::MemoryStore;

pub const PASSWORD: &str = "correct-horse";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let ports = Ports {
            stories: store.clone(),
            chapters: store.clone(),
            comments: store.clone(),
            users: store.clone(),
            hasher: Arc::new(Argon2PasswordHasher::new()),
            tokens: Arc::new(JwtTokenService::new(
                &SecretString::from("integration-test-secret".to_string()),
                "inkwell-test",
                30,
            )),
        };
        let state = AppState::new(
            ports,
            PageLimits {
                default_page_size: 10,
                max_page_size: 50,
            },
        );
        Self {
            router: build_router(state.clone()),
            state,
            store,
        }
    }

    /// Creates an admin account directly and returns its bearer token.
    pub async fn admin_token(&self) -> String {
        self.state
            .accounts
            .create_user(
                Credentials {
                    username: "admin".into(),
                    password: PASSWORD.into(),
                },
                Role::Admin,
            )
            .await
            .unwrap();
        let (status, body) = self
            .send(
                Method::POST,
                "/api/auth/login",
                None,
                Some(serde_json::json!({ "username": "admin", "password": PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    /// Registers a reader through the API and returns its bearer token.
    pub async fn reader_token(&self, username: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/auth/register",
                None,
                Some(serde_json::json!({ "username": username, "password": PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&json).unwrap())
            }
            None => Body::empty(),
        };
        self.send_request(request.body(body).unwrap()).await
    }

    pub async fn send_request(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }

    /// Creates a story with the given volume titles; returns its detail JSON.
    pub async fn story(&self, admin: &str, title: &str, volumes: &[&str]) -> Value {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/stories",
                Some(admin),
                Some(serde_json::json!({
                    "title": title,
                    "author": "Test Author",
                    "volumes": volumes,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }

    pub async fn chapter(&self, admin: &str, story_id: &str, volume_id: &str, title: &str, is_raw: bool) -> Value {
        let (status, body) = self
            .send(
                Method::POST,
                &format!("/api/stories/{story_id}/volumes/{volume_id}/chapters"),
                Some(admin),
                Some(serde_json::json!({
                    "title": title,
                    "content": format!("<p>{title}</p>"),
                    "isRaw": is_raw,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }
}

pub fn id_of(value: &Value) -> String {
    value["id"].as_str().unwrap().to_string()
}

pub fn error_code(body: &Value) -> &str {
    body["error"]["code"].as_str().unwrap_or_default()
}
