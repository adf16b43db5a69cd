//! E2E Harness Library
//!
//! Black-box end-to-end testing of a set of independently deployed services
//! (auth, user, message broker, notification, Mailpit mail sandbox) through
//! their public HTTP interfaces only.
//!
//! # Features
//!
//! - **Condition Polling**: bounded retry of async checks, transient failures tolerated
//! - **Readiness Gating**: sequential, fail-fast health gating before a suite runs
//! - **Mail Correlation**: find captured emails by recipient and subject
//! - **Fixtures**: unique synthetic users plus register/login/lookup/delete calls
//!
//! # Example
//!
//! ```no_run
//! use e2e_harness::{config::HarnessConfig, fixtures::FixtureFactory, mail::MailCorrelator};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = HarnessConfig::from_env()?;
//!     let fixtures = FixtureFactory::new(&config.services);
//!     let mail = MailCorrelator::new(&config.services.mailpit);
//!
//!     let user = fixtures.generate_user();
//!     fixtures.register(&user).await?;
//!
//!     let poll = config.mail.poll_config()?;
//!     let welcome = mail.wait_for_subject("Welcome", Some(&user.email), &poll).await?;
//!     println!("{}", welcome.subject);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod fixtures;
pub mod health;
pub mod logging;
pub mod mail;
pub mod poll;

// Re-export commonly used types
pub use config::HarnessConfig;
pub use health::{ServiceDescriptor, ServiceReadinessAggregator};
pub use mail::{MailCorrelator, MailMessage};
pub use poll::{ConditionPoller, PollConfig, PollError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
