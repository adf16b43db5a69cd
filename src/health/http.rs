//! HTTP health probe
//!
//! Issues `GET {base_url}/health` with a short per-request timeout. A service
//! counts as ready only on an exact `200 OK` carrying a non-empty body.

use super::{ProbeError, ReadinessProbe, ServiceDescriptor};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;

/// Default timeout of a single health request (5 seconds)
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Health probe over HTTP
#[derive(Debug, Clone)]
pub struct HttpHealthProbe {
    client: reqwest::Client,
}

impl HttpHealthProbe {
    /// Create a probe whose requests give up after `request_timeout`
    pub fn new(request_timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .expect("Failed to build HTTP client");

        Self { client }
    }

    /// Create a probe on top of an existing client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpHealthProbe {
    fn default() -> Self {
        Self::new(DEFAULT_REQUEST_TIMEOUT)
    }
}

#[async_trait]
impl ReadinessProbe for HttpHealthProbe {
    async fn check(&self, service: &ServiceDescriptor) -> Result<bool, ProbeError> {
        let url = service.endpoint("/health");
        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if status != StatusCode::OK {
            debug!(service = %service.name, status = status.as_u16(), "Health check not OK");
            return Ok(false);
        }

        let body = response.bytes().await?;
        Ok(!body.is_empty())
    }
}
