//! Test fixtures
//!
//! Synthetic user identities and the auth/user service calls that create,
//! look up and remove them. Every call is a single pass-through request: no
//! retry, no polling. Waiting for side effects (such as the welcome email) is
//! left to [`MailCorrelator`](crate::mail::MailCorrelator).

use crate::config::ServiceUrls;
use crate::health::join_url;
use rand::Rng;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Password accepted by the auth service's password policy
pub const TEST_PASSWORD: &str = "Test@123456";

const TEST_FIRST_NAME: &str = "TestUser";
const TEST_LAST_NAME: &str = "AutoTest";

/// Default request timeout (30 seconds)
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 6;

/// Fixture errors
#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: Value },
}

impl FixtureError {
    /// HTTP status of a rejected request
    pub fn status(&self) -> Option<u16> {
        match self {
            FixtureError::UnexpectedStatus { status, .. } => Some(*status),
            FixtureError::Http(e) => e.status().map(|s| s.as_u16()),
        }
    }

    /// Whether the service answered 409 Conflict
    pub fn is_conflict(&self) -> bool {
        self.status() == Some(StatusCode::CONFLICT.as_u16())
    }
}

/// A synthetic user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestUser {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

/// Status and decoded JSON body of a successful call
#[derive(Debug, Clone)]
pub struct ServiceResponse {
    pub status: u16,
    pub body: Value,
}

impl ServiceResponse {
    /// Field at a JSON pointer, e.g. `/data/accessToken`
    pub fn pointer(&self, pointer: &str) -> Option<&Value> {
        self.body.pointer(pointer)
    }

    /// String field at a JSON pointer
    pub fn str_at(&self, pointer: &str) -> Option<&str> {
        self.pointer(pointer).and_then(Value::as_str)
    }
}

/// Unique address: `e2e-test-{unix millis}-{random base36}@example.com`
pub fn generate_test_email() -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect();

    format!(
        "e2e-test-{}-{}@example.com",
        chrono::Utc::now().timestamp_millis(),
        suffix
    )
}

/// A fresh user with a unique email and the standard test credentials
pub fn generate_user() -> TestUser {
    TestUser {
        email: generate_test_email(),
        password: TEST_PASSWORD.to_string(),
        first_name: TEST_FIRST_NAME.to_string(),
        last_name: TEST_LAST_NAME.to_string(),
    }
}

/// Client for the auth and user services
#[derive(Debug, Clone)]
pub struct FixtureFactory {
    auth_url: String,
    user_url: String,
    client: reqwest::Client,
}

impl FixtureFactory {
    /// Create a factory for the auth and user services in `services`
    pub fn new(services: &ServiceUrls) -> Self {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");

        Self::with_client(services, client)
    }

    /// Create a factory on top of an existing client
    pub fn with_client(services: &ServiceUrls, client: reqwest::Client) -> Self {
        Self {
            auth_url: services.auth.clone(),
            user_url: services.user.clone(),
            client,
        }
    }

    /// See [`generate_user`]
    pub fn generate_user(&self) -> TestUser {
        generate_user()
    }

    /// `POST {auth}/api/auth/register`
    pub async fn register(&self, user: &TestUser) -> Result<ServiceResponse, FixtureError> {
        debug!(email = %user.email, "Registering user");
        let request = self
            .client
            .post(join_url(&self.auth_url, "/api/auth/register"))
            .json(user);
        Self::send(request).await
    }

    /// `POST {auth}/api/auth/login`
    pub async fn login(&self, email: &str, password: &str) -> Result<ServiceResponse, FixtureError> {
        debug!(email = %email, "Logging in");
        let request = self
            .client
            .post(join_url(&self.auth_url, "/api/auth/login"))
            .json(&json!({ "email": email, "password": password }));
        Self::send(request).await
    }

    /// `GET {user}/api/users/findByEmail?email=...`, bearer token optional
    pub async fn get_user_by_email(
        &self,
        email: &str,
        token: Option<&str>,
    ) -> Result<ServiceResponse, FixtureError> {
        let mut request = self
            .client
            .get(join_url(&self.user_url, "/api/users/findByEmail"))
            .query(&[("email", email)]);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        Self::send(request).await
    }

    /// `DELETE {user}/api/users/{id}`.
    ///
    /// Cleanup helper: failures are logged and reported as `false`.
    pub async fn delete_user(&self, user_id: &str, token: &str) -> bool {
        let url = join_url(&self.user_url, &format!("/api/users/{}", user_id));
        let request = self.client.delete(url).bearer_auth(token);

        match Self::send(request).await {
            Ok(_) => true,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Failed to delete user");
                false
            }
        }
    }

    async fn send(request: reqwest::RequestBuilder) -> Result<ServiceResponse, FixtureError> {
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        // Empty or non-JSON bodies are kept as a plain string
        let body = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text))
        };

        if !status.is_success() {
            return Err(FixtureError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        Ok(ServiceResponse {
            status: status.as_u16(),
            body,
        })
    }
}
