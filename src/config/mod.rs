//! Configuration module for the E2E harness
//!
//! Holds the base URLs of every service under test plus the timing used for
//! readiness gating and mail polling. Configuration is built explicitly, either
//! from environment variables ([`HarnessConfig::from_env`]) or from a YAML file
//! with environment variable expansion ([`HarnessConfig::load`]), and passed to
//! each component at construction.

use crate::health::ServiceDescriptor;
use crate::poll::{PollConfig, PollError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

// ============================================================================
// Environment Variables
// ============================================================================

pub const AUTH_SERVICE_URL_VAR: &str = "AUTH_SERVICE_URL";
pub const USER_SERVICE_URL_VAR: &str = "USER_SERVICE_URL";
pub const MESSAGE_BROKER_SERVICE_URL_VAR: &str = "MESSAGE_BROKER_SERVICE_URL";
pub const NOTIFICATION_SERVICE_URL_VAR: &str = "NOTIFICATION_SERVICE_URL";
pub const MAILPIT_API_URL_VAR: &str = "MAILPIT_API_URL";

/// Service keys accepted in `readiness.services`
pub const SERVICE_KEYS: [&str; 4] = ["auth", "user", "message_broker", "notification"];

// ============================================================================
// Validation Helpers
// ============================================================================

/// Validate that a URL starts with http:// or https://
fn is_valid_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Read an environment variable, falling back to `default` when unset or empty
fn env_or(var: &str, default: String) -> String {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => default,
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl From<PollError> for ConfigError {
    fn from(err: PollError) -> Self {
        ConfigError::ValidationError(err.to_string())
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HarnessConfig {
    #[serde(default)]
    pub services: ServiceUrls,
    #[serde(default)]
    pub readiness: ReadinessConfig,
    #[serde(default)]
    pub mail: MailConfig,
}

impl HarnessConfig {
    /// Load configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        ConfigLoader::load(path)
    }

    /// Build configuration from the service URL environment variables.
    ///
    /// Unset variables fall back to the localhost defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            services: ServiceUrls::from_env(),
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, url) in self.services.entries() {
            if !is_valid_http_url(url) {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid URL for '{}': '{}' must start with http:// or https://",
                    key, url
                )));
            }
        }

        if self.readiness.services.is_empty() {
            return Err(ConfigError::ValidationError(
                "At least one service must be gated for readiness".into(),
            ));
        }

        for key in &self.readiness.services {
            if self.services.get(key).is_none() {
                return Err(ConfigError::ValidationError(format!(
                    "Unknown readiness service '{}': must be one of {}",
                    key,
                    SERVICE_KEYS.join(", ")
                )));
            }
        }

        if self.readiness.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "readiness.request_timeout_secs must be positive".into(),
            ));
        }

        self.readiness.poll_config("readiness")?;
        self.mail.poll_config()?;

        Ok(())
    }

    /// Services gated before the suite, in configured order
    pub fn readiness_targets(&self) -> Vec<ServiceDescriptor> {
        self.readiness
            .services
            .iter()
            .filter_map(|key| {
                self.services
                    .get(key)
                    .map(|url| ServiceDescriptor::new(display_name(key), url))
            })
            .collect()
    }
}

/// Human-readable name for a service key
pub fn display_name(key: &str) -> String {
    match key {
        "auth" => "Auth Service".to_string(),
        "user" => "User Service".to_string(),
        "message_broker" => "Message Broker".to_string(),
        "notification" => "Notification Service".to_string(),
        other => other.to_string(),
    }
}

/// Base URLs of the services under test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceUrls {
    #[serde(default = "default_auth_url")]
    pub auth: String,
    #[serde(default = "default_user_url")]
    pub user: String,
    #[serde(default = "default_message_broker_url")]
    pub message_broker: String,
    #[serde(default = "default_notification_url")]
    pub notification: String,
    /// Mailpit REST API root, including the `/api/v1` prefix
    #[serde(default = "default_mailpit_url")]
    pub mailpit: String,
}

impl ServiceUrls {
    /// Read every URL from its environment variable
    pub fn from_env() -> Self {
        Self {
            auth: env_or(AUTH_SERVICE_URL_VAR, default_auth_url()),
            user: env_or(USER_SERVICE_URL_VAR, default_user_url()),
            message_broker: env_or(
                MESSAGE_BROKER_SERVICE_URL_VAR,
                default_message_broker_url(),
            ),
            notification: env_or(NOTIFICATION_SERVICE_URL_VAR, default_notification_url()),
            mailpit: env_or(MAILPIT_API_URL_VAR, default_mailpit_url()),
        }
    }

    /// Look up a service URL by key
    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            "auth" => Some(&self.auth),
            "user" => Some(&self.user),
            "message_broker" => Some(&self.message_broker),
            "notification" => Some(&self.notification),
            _ => None,
        }
    }

    fn entries(&self) -> [(&'static str, &str); 5] {
        [
            ("auth", &self.auth),
            ("user", &self.user),
            ("message_broker", &self.message_broker),
            ("notification", &self.notification),
            ("mailpit", &self.mailpit),
        ]
    }
}

impl Default for ServiceUrls {
    fn default() -> Self {
        Self {
            auth: default_auth_url(),
            user: default_user_url(),
            message_broker: default_message_broker_url(),
            notification: default_notification_url(),
            mailpit: default_mailpit_url(),
        }
    }
}

fn default_auth_url() -> String {
    "http://localhost:3001".to_string()
}

fn default_user_url() -> String {
    "http://localhost:3002".to_string()
}

fn default_message_broker_url() -> String {
    "http://localhost:3003".to_string()
}

fn default_notification_url() -> String {
    "http://localhost:3004".to_string()
}

fn default_mailpit_url() -> String {
    "http://localhost:8025/api/v1".to_string()
}

/// Pre-suite readiness gating
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadinessConfig {
    /// Budget per service. Default: 60
    #[serde(default = "default_readiness_timeout")]
    pub timeout_secs: u64,
    /// Delay between health checks. Default: 2000
    #[serde(default = "default_readiness_interval")]
    pub interval_millis: u64,
    /// Timeout of a single health request. Default: 5
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Service keys to gate, checked in this order. Default: auth, user
    #[serde(default = "default_readiness_services")]
    pub services: Vec<String>,
}

impl ReadinessConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_millis)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Poll configuration for one service.
    ///
    /// The interval is clamped to the timeout, so a short budget still gets one check.
    pub fn poll_config(&self, service_name: &str) -> Result<PollConfig, PollError> {
        PollConfig::new(
            self.timeout(),
            self.interval().min(self.timeout()),
            format!("{} did not become ready", service_name),
        )
    }
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_readiness_timeout(),
            interval_millis: default_readiness_interval(),
            request_timeout_secs: default_request_timeout(),
            services: default_readiness_services(),
        }
    }
}

fn default_readiness_timeout() -> u64 {
    60
}

fn default_readiness_interval() -> u64 {
    2000
}

fn default_request_timeout() -> u64 {
    5
}

fn default_readiness_services() -> Vec<String> {
    vec!["auth".to_string(), "user".to_string()]
}

/// Mail arrival polling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MailConfig {
    /// Budget for an email to arrive. Default: 10000
    #[serde(default = "default_mail_timeout")]
    pub timeout_millis: u64,
    /// Delay between mailbox fetches. Default: 500
    #[serde(default = "default_mail_interval")]
    pub interval_millis: u64,
}

impl MailConfig {
    pub fn poll_config(&self) -> Result<PollConfig, PollError> {
        PollConfig::new(
            Duration::from_millis(self.timeout_millis),
            Duration::from_millis(self.interval_millis),
            "Email not received within timeout",
        )
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            timeout_millis: default_mail_timeout(),
            interval_millis: default_mail_interval(),
        }
    }
}

fn default_mail_timeout() -> u64 {
    10_000
}

fn default_mail_interval() -> u64 {
    500
}
