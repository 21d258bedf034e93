//! Common test utilities for integration tests
//!
//! The router runs over an in-memory store with a cheap password hash, so
//! every test gets a fresh, isolated application without a database:
//! - Test application setup
//! - Request helpers that decode the JSON envelope
//! - User and admin registration shortcuts

#![allow(dead_code)]

use std::collections::HashMap;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::Value;
use taskdesk_api::app::{build_router, AppState};
use taskdesk_api::config::Config;
use tower::Service as _;

pub const JWT_SECRET: &str = "integration-test-secret-at-least-32-bytes";

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "admin-secret";

/// Configuration for tests, with optional overrides
pub fn test_config(overrides: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = [
        ("DATABASE_URL", "postgresql://localhost/taskdesk_test"),
        ("JWT_SECRET", JWT_SECRET),
        ("PASSWORD_MEMORY_KIB", "1024"),
        ("PASSWORD_ITERATIONS", "1"),
        ("PASSWORD_PARALLELISM", "1"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    for (k, v) in overrides {
        vars.insert(k.to_string(), v.to_string());
    }

    Config::from_lookup(|key| vars.get(key).cloned()).unwrap()
}

/// Decoded response
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Test context holding a router over a fresh in-memory store
pub struct TestContext {
    pub state: AppState,
    pub app: axum::Router,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_config(test_config(&[]))
    }

    pub fn with_config(config: Config) -> Self {
        let state = AppState::in_memory(config);
        let app = build_router(state.clone());
        Self { state, app }
    }

    /// Sends a request and decodes the body (empty body -> `Null`)
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.send_request(request).await
    }

    pub async fn send_request(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().call(request).await.unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                panic!("non-JSON body ({}): {}", status, String::from_utf8_lossy(&bytes))
            })
        };

        TestResponse { status, body }
    }

    pub async fn get(&self, uri: &str, token: &str) -> TestResponse {
        self.send(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.send(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> TestResponse {
        self.send(Method::DELETE, uri, Some(token), None).await
    }

    /// Registers a user and returns `(user id, token)`
    pub async fn register(&self, name: &str, email: &str, password: &str) -> (String, String) {
        let response = self
            .post(
                "/api/auth/register",
                None,
                serde_json::json!({ "name": name, "email": email, "password": password }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);

        let id = response.body["data"]["user"]["id"].as_str().unwrap().to_string();
        let token = response.body["data"]["token"].as_str().unwrap().to_string();
        (id, token)
    }

    /// Registers a throwaway user with a unique email
    pub async fn register_user(&self, name: &str) -> (String, String) {
        let email = format!("{}-{}@example.com", name.to_lowercase(), uuid::Uuid::new_v4());
        self.register(name, &email, "secret1").await
    }

    /// Ensures the admin account and logs in as it
    pub async fn admin_token(&self) -> String {
        self.state
            .credentials
            .ensure_admin("Admin User", ADMIN_EMAIL, ADMIN_PASSWORD)
            .await
            .unwrap();

        let response = self
            .post(
                "/api/auth/login",
                None,
                serde_json::json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);

        response.body["data"]["token"].as_str().unwrap().to_string()
    }

    /// Creates a task and returns its id
    pub async fn create_task(&self, token: &str, body: Value) -> String {
        let response = self.post("/api/tasks", Some(token), body).await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body["data"]["id"].as_str().unwrap().to_string()
    }
}

/// Field names of a validation failure, sorted
pub fn error_fields(body: &Value) -> Vec<String> {
    let mut fields: Vec<String> = body["errors"]
        .as_array()
        .map(|errors| {
            errors
                .iter()
                .filter_map(|e| e["field"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();
    fields.sort();
    fields
}

/// Messages of a validation failure
pub fn error_messages(body: &Value) -> Vec<String> {
    body["errors"]
        .as_array()
        .map(|errors| {
            errors
                .iter()
                .filter_map(|e| e["message"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
