//! Condition polling
//!
//! Re-evaluates an asynchronous condition until it yields a value or the time
//! budget runs out.
//!
//! A condition returns `Result<Option<T>, E>`:
//! - `Ok(Some(value))` - the condition holds, polling stops and `value` is returned
//! - `Ok(None)` - not yet, poll again after the interval
//! - `Err(_)` - transient failure, treated exactly like `Ok(None)`
//!
//! Only exhaustion of the time budget is reported to the caller, as
//! [`PollError::Timeout`].
//!
//! # Example
//!
//! ```no_run
//! use e2e_harness::poll::{ConditionPoller, PollConfig};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PollConfig::builder()
//!     .timeout(Duration::from_secs(10))
//!     .interval(Duration::from_millis(500))
//!     .timeout_message("auth service never answered")
//!     .build()?;
//!
//! let client = &reqwest::Client::new();
//! let status = ConditionPoller::new(config)
//!     .wait_for(move || async move {
//!         let response = client.get("http://localhost:3001/health").send().await?;
//!         Ok::<_, reqwest::Error>(response.status().is_success().then_some(response.status()))
//!     })
//!     .await?;
//! # let _ = status;
//! # Ok(())
//! # }
//! ```

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::debug;

/// Default overall time budget (10 seconds)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default delay between attempts (500 milliseconds)
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);

/// Default message carried by a timeout
pub const DEFAULT_TIMEOUT_MESSAGE: &str = "Condition not met within timeout";

/// Polling errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PollError {
    #[error("{message} (gave up after {attempts} attempts in {elapsed:?})")]
    Timeout {
        message: String,
        attempts: u32,
        elapsed: Duration,
    },

    #[error("Invalid poll configuration: {0}")]
    InvalidConfig(String),
}

impl PollError {
    /// Whether the time budget was exhausted
    pub fn is_timeout(&self) -> bool {
        matches!(self, PollError::Timeout { .. })
    }

    /// The caller-supplied message of a timeout
    pub fn timeout_message(&self) -> Option<&str> {
        match self {
            PollError::Timeout { message, .. } => Some(message),
            PollError::InvalidConfig(_) => None,
        }
    }
}

/// Timing and reporting parameters of one polling run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    timeout: Duration,
    interval: Duration,
    timeout_message: String,
}

impl PollConfig {
    /// Create a validated poll configuration
    ///
    /// Both durations must be non-zero and `interval` may not exceed `timeout`.
    pub fn new(
        timeout: Duration,
        interval: Duration,
        timeout_message: impl Into<String>,
    ) -> Result<Self, PollError> {
        if timeout.is_zero() {
            return Err(PollError::InvalidConfig("timeout must be positive".into()));
        }
        if interval.is_zero() {
            return Err(PollError::InvalidConfig("interval must be positive".into()));
        }
        if interval > timeout {
            return Err(PollError::InvalidConfig(format!(
                "interval {:?} exceeds timeout {:?}",
                interval, timeout
            )));
        }

        Ok(Self {
            timeout,
            interval,
            timeout_message: timeout_message.into(),
        })
    }

    /// Create a builder starting from the defaults
    pub fn builder() -> PollConfigBuilder {
        PollConfigBuilder::default()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn timeout_message(&self) -> &str {
        &self.timeout_message
    }

    /// Same timing, different timeout message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.timeout_message = message.into();
        self
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            interval: DEFAULT_INTERVAL,
            timeout_message: DEFAULT_TIMEOUT_MESSAGE.to_string(),
        }
    }
}

/// Builder for PollConfig
#[derive(Default)]
pub struct PollConfigBuilder {
    timeout: Option<Duration>,
    interval: Option<Duration>,
    timeout_message: Option<String>,
}

impl PollConfigBuilder {
    /// Set the overall time budget
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the delay between attempts
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Set the message reported on timeout
    pub fn timeout_message(mut self, message: &str) -> Self {
        self.timeout_message = Some(message.to_string());
        self
    }

    /// Build the PollConfig
    pub fn build(self) -> Result<PollConfig, PollError> {
        PollConfig::new(
            self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            self.interval.unwrap_or(DEFAULT_INTERVAL),
            self.timeout_message
                .unwrap_or_else(|| DEFAULT_TIMEOUT_MESSAGE.to_string()),
        )
    }
}

/// Bounded retry loop over an asynchronous condition
#[derive(Debug, Clone, Default)]
pub struct ConditionPoller {
    config: PollConfig,
}

impl ConditionPoller {
    pub fn new(config: PollConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Poll `condition` until it yields a value or the timeout elapses.
    ///
    /// The condition is always evaluated at least once. After every miss the
    /// poller sleeps for the interval and only then checks the budget, so a
    /// timeout is never reported before `timeout` has elapsed.
    pub async fn wait_for<T, E, F, Fut>(&self, mut condition: F) -> Result<T, PollError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
        E: Display,
    {
        let start = Instant::now();
        let mut attempts: u32 = 0;

        loop {
            attempts = attempts.saturating_add(1);
            match condition().await {
                Ok(Some(value)) => {
                    debug!(attempts, elapsed = ?start.elapsed(), "Condition met");
                    return Ok(value);
                }
                Ok(None) => debug!(attempts, "Condition not met yet"),
                Err(e) => debug!(attempts, error = %e, "Condition check failed, retrying"),
            }

            tokio::time::sleep(self.config.interval).await;

            let elapsed = start.elapsed();
            if elapsed >= self.config.timeout {
                return Err(PollError::Timeout {
                    message: self.config.timeout_message.clone(),
                    attempts,
                    elapsed,
                });
            }
        }
    }

    /// Poll a boolean condition until it returns `true`.
    pub async fn wait_until<E, F, Fut>(&self, mut condition: F) -> Result<(), PollError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool, E>>,
        E: Display,
    {
        self.wait_for(|| {
            let check = condition();
            async move { check.await.map(|ok| ok.then_some(())) }
        })
        .await
    }
}

/// Poll `condition` with `config`.
///
/// Shorthand for `ConditionPoller::new(config.clone()).wait_for(condition)`.
pub async fn wait_for<T, E, F, Fut>(config: &PollConfig, condition: F) -> Result<T, PollError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
    E: Display,
{
    ConditionPoller::new(config.clone()).wait_for(condition).await
}
