// tests/common/mod.rs

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use yamdb::{
    config::Config,
    error::AppError,
    mail::{DynMailer, Mailer},
    models::user::{NewUser, User},
    policy::Role,
    routes,
    state::AppState,
    store::{DynStore, MemoryStore, Store},
    utils::jwt::sign_jwt,
};

pub const TEST_SECRET: &str = "test_secret_for_integration_tests";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    pub subject: String,
    pub body: String,
    pub from: String,
    pub to: String,
}

/// Keeps every message in memory so tests can read confirmation codes back.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentMail>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }

    /// The most recent message addressed to `to`.
    pub fn last_to(&self, to: &str) -> Option<SentMail> {
        self.sent().into_iter().rev().find(|m| m.to == to)
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, subject: &str, body: &str, from: &str, to: &str) -> Result<(), AppError> {
        self.sent.lock().unwrap().push(SentMail {
            subject: subject.to_string(),
            body: body.to_string(),
            from: from.to_string(),
            to: to.to_string(),
        });
        Ok(())
    }
}

/// The real router over an in-memory store, plus handles to inspect it.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub mailer: Arc<RecordingMailer>,
    pub config: Config,
}

pub fn spawn_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let mailer = Arc::new(RecordingMailer::default());
    let config = Config::for_secret(TEST_SECRET);

    let dyn_store: DynStore = store.clone();
    let dyn_mailer: DynMailer = mailer.clone();

    let state = AppState {
        store: dyn_store,
        mailer: dyn_mailer,
        config: config.clone(),
    };

    TestApp {
        router: routes::create_router(state),
        store,
        mailer,
        config,
    }
}

impl TestApp {
    /// Inserts a user directly and returns it with a valid bearer token.
    pub async fn user(&self, username: &str, role: Role) -> (User, String) {
        let user = self
            .store
            .create_user(&NewUser {
                username: username.to_string(),
                email: format!("{}@example.com", username),
                role,
                ..Default::default()
            })
            .await
            .expect("Failed to create test user");
        let token = sign_jwt(&user, TEST_SECRET, 600).expect("Failed to sign token");
        (user, token)
    }

    pub async fn admin(&self) -> String {
        self.user("admin", Role::Admin).await.1
    }

    /// Sends one request through the router and decodes the JSON body
    /// (`Value::Null` for empty bodies).
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&json).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router failed to respond");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::PATCH, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, token, None).await
    }

    /// The confirmation code from the latest mail sent to `email`.
    pub fn confirmation_code(&self, email: &str) -> String {
        let mail = self.mailer.last_to(email).expect("No mail sent");
        mail.body
            .split("confirmation code is: ")
            .nth(1)
            .and_then(|rest| rest.split_whitespace().next())
            .expect("No code in mail body")
            .to_string()
    }
}
