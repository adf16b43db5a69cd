//! Operational endpoint probes
//!
//! Typed reads of the endpoints every service under test exposes:
//!
//! | Endpoint        | Body                                                   |
//! |-----------------|--------------------------------------------------------|
//! | `/health`       | `{status, service, version, timestamp}`                |
//! | `/health/ready` | `{status: "ready", checks: {database, externalServices}}` |
//! | `/health/live`  | `{status: "alive", uptime}`                            |
//! | `/metrics`      | `{uptime, memory: {heapUsedMB, status}, process}`      |
//!
//! Unlike [`HttpHealthProbe`](super::HttpHealthProbe) these are single-shot
//! reads meant for assertions, so every failure is returned to the caller.

use super::{join_url, ProbeError};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Default request timeout (10 seconds)
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: Value,
}

/// `GET /health/ready`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessReport {
    pub status: String,
    pub checks: ReadinessChecks,
}

/// Dependency checks inside a readiness report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessChecks {
    pub database: Value,
    pub external_services: Value,
}

impl ReadinessChecks {
    /// `checks.database.status`, when reported
    pub fn database_status(&self) -> Option<&str> {
        self.database.get("status").and_then(Value::as_str)
    }
}

/// `GET /health/live`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessReport {
    pub status: String,
    /// Seconds since process start
    pub uptime: f64,
}

/// `GET /metrics`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsReport {
    pub uptime: f64,
    pub memory: MemoryReport,
    pub process: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryReport {
    /// Reported either as a number or a preformatted string
    #[serde(rename = "heapUsedMB")]
    pub heap_used_mb: Value,
    pub status: String,
}

/// Operational endpoint client for one service
#[derive(Debug, Clone)]
pub struct ServiceProbe {
    base_url: String,
    client: reqwest::Client,
}

impl ServiceProbe {
    /// Create a probe for the service at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");

        Self::with_client(base_url, client)
    }

    /// Create a probe on top of an existing client
    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn health(&self) -> Result<HealthReport, ProbeError> {
        self.get_json("/health").await
    }

    pub async fn readiness(&self) -> Result<ReadinessReport, ProbeError> {
        self.get_json("/health/ready").await
    }

    pub async fn liveness(&self) -> Result<LivenessReport, ProbeError> {
        self.get_json("/health/live").await
    }

    pub async fn metrics(&self) -> Result<MetricsReport, ProbeError> {
        self.get_json("/metrics").await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ProbeError> {
        let url = join_url(&self.base_url, path);
        debug!(url = %url, "Probing endpoint");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(ProbeError::UnexpectedStatus {
                url,
                status: status.as_u16(),
            });
        }

        Ok(response.json().await?)
    }
}
