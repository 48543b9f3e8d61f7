#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Duration;
use serde_json::{json, Value};
use tower::ServiceExt;

use client_contract_api::auth::{hash_password, JwtService, UserDirectory};
use client_contract_api::database::{MemoryStore, Store};
use client_contract_api::{app, AppState};

pub const TEST_SECRET: &str = "integration-test-secret";
pub const ADMIN: (&str, &str) = ("superAdmin", "admin123");
/// Lowest bcrypt cost, so every test app hashes quickly
const HASH_COST: u32 = 4;

/// The full router over a fresh in-memory store
pub struct TestApp {
    pub router: Router,
    pub store: Arc<dyn Store>,
    pub jwt: Arc<JwtService>,
    pub token: Option<String>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestResponse {
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }
}

impl TestApp {
    pub fn new() -> Self {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let jwt = JwtService::new(TEST_SECRET, Duration::hours(1)).expect("test secret is not empty");
        let hash = |password: &str| hash_password(password, HASH_COST).expect("cost is in range");
        let directory = UserDirectory::default()
            .with_user(ADMIN.0, "ADMIN", hash(ADMIN.1))
            .with_user("user", "USER", hash("user123"));
        let state = AppState::new(store.clone(), jwt, Arc::new(directory));
        let jwt = state.jwt.clone();
        Self {
            router: app(state),
            store,
            jwt,
            token: None,
        }
    }

    /// A fresh app already logged in as the admin user
    pub async fn authenticated() -> Result<Self> {
        let mut app = Self::new();
        let res = app
            .post("/api/auth/login", json!({ "username": ADMIN.0, "password": ADMIN.1 }))
            .await?;
        anyhow::ensure!(res.status == StatusCode::OK, "login failed: {}", res.body);
        let token = res.data()["token"].as_str().context("token missing")?.to_string();
        app.token = Some(token);
        Ok(app)
    }

    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> Result<TestResponse> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = &self.token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).with_context(|| format!("non-JSON body for {}", uri))?
        };
        Ok(TestResponse { status, body })
    }

    pub async fn get(&self, uri: &str) -> Result<TestResponse> {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> Result<TestResponse> {
        self.send(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Option<Value>) -> Result<TestResponse> {
        self.send(Method::PUT, uri, body).await
    }

    pub async fn delete(&self, uri: &str) -> Result<TestResponse> {
        self.send(Method::DELETE, uri, None).await
    }

    /// Create a person through the API and return its id
    pub async fn create_person(&self, name: &str, email: &str) -> Result<String> {
        let res = self
            .post(
                "/api/clients",
                json!({
                    "name": name,
                    "email": email,
                    "phone": "+123456",
                    "type": "PERSON",
                    "birthDate": "1990-01-01"
                }),
            )
            .await?;
        anyhow::ensure!(res.status == StatusCode::CREATED, "create person failed: {}", res.body);
        Ok(res.data()["id"].as_str().context("id missing")?.to_string())
    }

    /// Create a contract through the API and return its id
    pub async fn create_contract(&self, body: Value) -> Result<i64> {
        let res = self.post("/api/contracts", body).await?;
        anyhow::ensure!(res.status == StatusCode::CREATED, "create contract failed: {}", res.body);
        res.data()["id"].as_i64().context("contract id missing")
    }
}
