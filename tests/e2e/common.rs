//! Common E2E Test Infrastructure
//!
//! Provides shared utilities for E2E tests:
//! - Configuration from the environment
//! - Service availability checks (tests skip when the stack is down)
//! - Fixture, mail and probe clients wired to the configured URLs

use e2e_harness::config::HarnessConfig;
use e2e_harness::fixtures::{FixtureFactory, TestUser};
use e2e_harness::health::{HttpHealthProbe, ReadinessProbe, ServiceDescriptor, ServiceProbe};
use e2e_harness::mail::MailCorrelator;
use e2e_harness::poll::PollConfig;
use std::time::Duration;

/// Timeout of the availability check that decides whether to skip
const AVAILABILITY_TIMEOUT: Duration = Duration::from_secs(2);

/// E2E Test Environment
pub struct E2ETestEnv {
    pub config: HarnessConfig,
    pub fixtures: FixtureFactory,
    pub mail: MailCorrelator,
}

impl E2ETestEnv {
    /// Build the environment from the service URL environment variables
    pub fn from_env() -> Self {
        e2e_harness::logging::init_test_subscriber();

        let config = HarnessConfig::from_env().expect("Invalid service URLs in environment");
        let fixtures = FixtureFactory::new(&config.services);
        let mail = MailCorrelator::new(&config.services.mailpit);

        Self {
            config,
            fixtures,
            mail,
        }
    }

    /// Probe for the service behind `key` (`auth`, `user`, ...)
    pub fn probe(&self, key: &str) -> ServiceProbe {
        let url = self
            .config
            .services
            .get(key)
            .unwrap_or_else(|| panic!("Unknown service key: {}", key));
        ServiceProbe::new(url)
    }

    /// Poll configuration for email arrival
    pub fn mail_poll(&self, message: &str) -> PollConfig {
        self.config
            .mail
            .poll_config()
            .expect("Invalid mail poll configuration")
            .with_message(message)
    }

    /// Register a fresh user, panicking on failure
    pub async fn register_new_user(&self) -> TestUser {
        let user = self.fixtures.generate_user();
        let response = self
            .fixtures
            .register(&user)
            .await
            .unwrap_or_else(|e| panic!("Registration of {} failed: {}", user.email, e));
        assert!(
            (200..300).contains(&response.status),
            "Registration should succeed, got: {}",
            response.status
        );
        user
    }
}

/// Check once, without retrying, whether every service in `keys` answers `/health`
pub async fn are_services_available(keys: &[&str]) -> bool {
    let env = E2ETestEnv::from_env();
    let probe = HttpHealthProbe::new(AVAILABILITY_TIMEOUT);

    for key in keys {
        let Some(url) = env.config.services.get(key) else {
            return false;
        };
        let service = ServiceDescriptor::new(*key, url);
        if !matches!(probe.check(&service).await, Ok(true)) {
            return false;
        }
    }
    true
}

/// Check whether the Mailpit API answers
pub async fn is_mailpit_available() -> bool {
    let env = E2ETestEnv::from_env();
    let client = reqwest::Client::new();
    match client
        .get(format!("{}/messages", env.config.services.mailpit.trim_end_matches('/')))
        .timeout(AVAILABILITY_TIMEOUT)
        .send()
        .await
    {
        Ok(resp) => resp.status().is_success(),
        Err(_) => false,
    }
}

/// Skip the current test unless the listed services are available
#[macro_export]
macro_rules! skip_unless_available {
    ($($key:expr),+ $(,)?) => {
        if !$crate::e2e::common::are_services_available(&[$($key),+]).await {
            eprintln!("Skipping test: services not available");
            return;
        }
    };
}

