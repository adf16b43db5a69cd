//! Service health module
//!
//! Readiness gating of the services under test and typed access to their
//! operational endpoints.
//!
//! - [`ReadinessProbe`]: single health check against one service
//! - [`HttpHealthProbe`]: the probe over `GET {base_url}/health`
//! - [`ServiceReadinessAggregator`]: sequential, fail-fast gating of a service list
//! - [`ServiceProbe`]: typed `/health`, `/health/ready`, `/health/live` and `/metrics` reads

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod endpoints;
pub mod http;
pub mod readiness;

pub use endpoints::{
    HealthReport, LivenessReport, MemoryReport, MetricsReport, ReadinessChecks, ReadinessReport,
    ServiceProbe,
};
pub use http::HttpHealthProbe;
pub use readiness::{ReadinessError, ServiceReadinessAggregator};

/// Probe errors
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status} from {url}")]
    UnexpectedStatus { url: String, status: u16 },
}

/// A service under test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    /// Name used in logs and failure messages
    pub name: String,
    /// Base URL without trailing path, e.g. `http://localhost:3001`
    pub base_url: String,
}

impl ServiceDescriptor {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
        }
    }

    /// Absolute URL of `path` on this service
    pub fn endpoint(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }
}

/// Join a base URL and an absolute path without doubling the slash
pub(crate) fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Readiness probe trait
#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    /// Check once whether the service is ready.
    ///
    /// `Ok(false)` and `Err(_)` both mean "not yet" to the aggregator.
    async fn check(&self, service: &ServiceDescriptor) -> Result<bool, ProbeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let service = ServiceDescriptor::new("Auth Service", "http://localhost:3001/");
        assert_eq!(service.endpoint("/health"), "http://localhost:3001/health");
        assert_eq!(
            service.endpoint("health/ready"),
            "http://localhost:3001/health/ready"
        );
    }
}
