//! E2E Registration Flow Tests
//!
//! The user lifecycle across auth service, user service, message broker,
//! notification service and the mail sandbox.
//!
//! ## Test Coverage
//!
//! - Registration triggers a welcome email to the new address
//! - Registering the same email twice is a conflict
//! - Login with the registered credentials returns a token
//! - Login with a wrong password is rejected
//! - The user service finds the registered user by email, and deletes it

use super::common::{is_mailpit_available, E2ETestEnv};
use serial_test::serial;

/// Pull an access token out of a login response, whatever its envelope
fn access_token(body: &serde_json::Value) -> Option<String> {
    ["/data/accessToken", "/accessToken", "/data/token", "/token"]
        .iter()
        .find_map(|pointer| body.pointer(pointer).and_then(|v| v.as_str()))
        .map(str::to_string)
}

/// Pull a user id out of a lookup response
fn user_id(body: &serde_json::Value) -> Option<String> {
    ["/data/id", "/data/_id", "/id", "/_id", "/data/user/id"]
        .iter()
        .find_map(|pointer| body.pointer(pointer).and_then(|v| v.as_str()))
        .map(str::to_string)
}

#[tokio::test]
#[serial]
async fn test_registration_sends_welcome_email() {
    crate::skip_unless_available!("auth", "user");
    if !is_mailpit_available().await {
        eprintln!("Skipping test: mail sandbox not available");
        return;
    }
    let env = E2ETestEnv::from_env();

    assert!(env.mail.clear().await, "Mail sandbox should accept a clear");

    let user = env.register_new_user().await;

    let welcome = env
        .mail
        .wait_for_subject(
            "Welcome",
            Some(&user.email),
            &env.mail_poll("Welcome email was not delivered"),
        )
        .await
        .unwrap_or_else(|e| panic!("{e}"));

    assert!(welcome.is_addressed_to(&user.email));
    assert!(welcome.subject.contains("Welcome"));
    println!("Received '{}' for {}", welcome.subject, user.email);
}

#[tokio::test]
#[serial]
async fn test_duplicate_registration_is_conflict() {
    crate::skip_unless_available!("auth");
    let env = E2ETestEnv::from_env();

    let user = env.register_new_user().await;

    let err = env
        .fixtures
        .register(&user)
        .await
        .expect_err("Second registration should fail");

    assert!(err.is_conflict(), "Expected 409 Conflict, got: {err}");
}

#[tokio::test]
#[serial]
async fn test_login_with_registered_credentials() {
    crate::skip_unless_available!("auth");
    let env = E2ETestEnv::from_env();

    let user = env.register_new_user().await;

    let response = env
        .fixtures
        .login(&user.email, &user.password)
        .await
        .unwrap_or_else(|e| panic!("Login failed: {e}"));

    assert_eq!(response.status, 200);
    assert!(
        access_token(&response.body).is_some(),
        "Login response should carry an access token: {}",
        response.body
    );
}

#[tokio::test]
#[serial]
async fn test_login_with_wrong_password_is_rejected() {
    crate::skip_unless_available!("auth");
    let env = E2ETestEnv::from_env();

    let user = env.register_new_user().await;

    let err = env
        .fixtures
        .login(&user.email, "Wrong@123456")
        .await
        .expect_err("Login with a wrong password should fail");

    let status = err.status().unwrap_or_default();
    assert!(
        status == 400 || status == 401,
        "Expected 400/401, got: {err}"
    );
}

#[tokio::test]
#[serial]
async fn test_user_lookup_and_cleanup() {
    crate::skip_unless_available!("auth", "user");
    let env = E2ETestEnv::from_env();

    let user = env.register_new_user().await;
    let login = env
        .fixtures
        .login(&user.email, &user.password)
        .await
        .unwrap_or_else(|e| panic!("Login failed: {e}"));
    let token = access_token(&login.body).expect("Login response should carry a token");

    let found = env
        .fixtures
        .get_user_by_email(&user.email, Some(&token))
        .await
        .unwrap_or_else(|e| panic!("Lookup failed: {e}"));
    let id = user_id(&found.body).expect("Lookup response should carry the user id");

    assert!(env.fixtures.delete_user(&id, &token).await);
}
