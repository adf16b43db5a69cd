//! Mail capture correlation
//!
//! Reads the messages captured by the Mailpit sandbox and matches them by
//! recipient and subject. Delivery through the notification pipeline is
//! asynchronous, so callers that need a message to show up compose
//! [`MailCorrelator::find_by_subject`] with the
//! [`ConditionPoller`](crate::poll::ConditionPoller), or use
//! [`MailCorrelator::wait_for_subject`] which does exactly that.
//!
//! The correlator keeps no state: every call fetches the full message list.
//! Sandbox failures are logged and reported as "nothing there" (`list` returns
//! an empty vector, `clear` returns `false`).
//!
//! # Example
//!
//! ```no_run
//! use e2e_harness::mail::MailCorrelator;
//! use e2e_harness::poll::PollConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mail = MailCorrelator::new("http://localhost:8025/api/v1");
//! mail.clear().await;
//!
//! // ... trigger a registration ...
//!
//! let welcome = mail
//!     .wait_for_subject("Welcome", Some("e2e-test@example.com"), &PollConfig::default())
//!     .await?;
//! println!("received: {}", welcome.subject);
//! # Ok(())
//! # }
//! ```

use crate::health::join_url;
use crate::poll::{ConditionPoller, PollConfig, PollError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::convert::Infallible;
use std::time::Duration;
use tracing::{debug, warn};

/// Default request timeout against the sandbox (10 seconds)
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// A mailbox address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MailAddress {
    #[serde(default, deserialize_with = "null_as_default")]
    pub address: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

/// A captured message, as listed by the sandbox
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MailMessage {
    #[serde(default, rename = "ID")]
    pub id: String,
    #[serde(default)]
    pub from: Option<MailAddress>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub to: Vec<MailAddress>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subject: String,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
    /// Every other field the sandbox reports
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MailMessage {
    /// Whether `address` is among the recipients (exact match)
    pub fn is_addressed_to(&self, address: &str) -> bool {
        self.to.iter().any(|to| to.address == address)
    }
}

/// Mailpit reports `null` for absent recipients, subjects and names
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::de::Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `GET /messages` response
///
/// Entries stay raw so one malformed message only drops itself.
#[derive(Debug, Default, Deserialize)]
struct MessagesResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    messages: Vec<Value>,
}

impl MessagesResponse {
    fn into_messages(self) -> Vec<MailMessage> {
        self.messages
            .into_iter()
            .filter_map(|raw| match serde_json::from_value::<MailMessage>(raw) {
                Ok(message) => Some(message),
                Err(e) => {
                    debug!(error = %e, "Skipping unreadable captured email");
                    None
                }
            })
            .collect()
    }
}

/// Stateless reader over the mail sandbox API
#[derive(Debug, Clone)]
pub struct MailCorrelator {
    api_url: String,
    client: reqwest::Client,
}

impl MailCorrelator {
    /// Create a correlator for the sandbox API rooted at `api_url`
    pub fn new(api_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");

        Self::with_client(api_url, client)
    }

    /// Create a correlator on top of an existing client
    pub fn with_client(api_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            api_url: api_url.into(),
            client,
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn messages_url(&self) -> String {
        join_url(&self.api_url, "/messages")
    }

    /// Current messages, optionally only those sent to `recipient`.
    ///
    /// Returns an empty vector when the sandbox cannot be read.
    pub async fn list(&self, recipient: Option<&str>) -> Vec<MailMessage> {
        let messages = match self.fetch().await {
            Ok(messages) => messages,
            Err(e) => {
                warn!(error = %e, "Failed to get emails from mail sandbox");
                return Vec::new();
            }
        };

        match recipient {
            Some(address) => messages
                .into_iter()
                .filter(|msg| msg.is_addressed_to(address))
                .collect(),
            None => messages,
        }
    }

    async fn fetch(&self) -> Result<Vec<MailMessage>, reqwest::Error> {
        let response = self
            .client
            .get(self.messages_url())
            .send()
            .await?
            .error_for_status()?;
        let body: MessagesResponse = response.json().await?;
        let messages = body.into_messages();
        debug!(count = messages.len(), "Fetched captured emails");
        Ok(messages)
    }

    /// First message (in sandbox order) whose subject contains `subject`.
    pub async fn find_by_subject(
        &self,
        subject: &str,
        recipient: Option<&str>,
    ) -> Option<MailMessage> {
        self.list(recipient)
            .await
            .into_iter()
            .find(|msg| msg.subject.contains(subject))
    }

    /// Poll [`find_by_subject`](Self::find_by_subject) until a message shows up.
    pub async fn wait_for_subject(
        &self,
        subject: &str,
        recipient: Option<&str>,
        config: &PollConfig,
    ) -> Result<MailMessage, PollError> {
        ConditionPoller::new(config.clone())
            .wait_for(move || async move {
                Ok::<_, Infallible>(self.find_by_subject(subject, recipient).await)
            })
            .await
    }

    /// Delete every captured message. Returns whether the sandbox accepted it.
    pub async fn clear(&self) -> bool {
        let result = self
            .client
            .delete(self.messages_url())
            .send()
            .await
            .and_then(|response| response.error_for_status());

        match result {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "Failed to clear emails from mail sandbox");
                false
            }
        }
    }
}
