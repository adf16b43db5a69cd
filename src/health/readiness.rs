//! Service readiness aggregation
//!
//! Gates a test suite on a list of services. Services are checked one at a
//! time, in list order, each with its own time budget. The first service that
//! does not become ready aborts the run and later services are never probed,
//! so a failure always names exactly one service.
//!
//! # Example
//!
//! ```no_run
//! use e2e_harness::config::HarnessConfig;
//! use e2e_harness::health::ServiceReadinessAggregator;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HarnessConfig::from_env()?;
//! let aggregator = ServiceReadinessAggregator::from_config(&config.readiness);
//! aggregator
//!     .await_services(&config.readiness_targets(), config.readiness.timeout())
//!     .await?;
//! # Ok(())
//! # }
//! ```

use super::{HttpHealthProbe, ReadinessProbe, ServiceDescriptor};
use crate::config::ReadinessConfig;
use crate::poll::{ConditionPoller, PollConfig, PollError};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info};

/// Readiness errors
#[derive(Error, Debug)]
pub enum ReadinessError {
    #[error("Service '{service}' is not ready: {source}")]
    ServiceNotReady {
        service: String,
        #[source]
        source: PollError,
    },

    #[error("Invalid readiness configuration for '{service}': {source}")]
    InvalidConfig {
        service: String,
        #[source]
        source: PollError,
    },
}

impl ReadinessError {
    /// Name of the service that failed
    pub fn service(&self) -> &str {
        match self {
            ReadinessError::ServiceNotReady { service, .. }
            | ReadinessError::InvalidConfig { service, .. } => service,
        }
    }
}

/// Sequential, fail-fast readiness gate
pub struct ServiceReadinessAggregator<P = HttpHealthProbe> {
    probe: P,
    interval: Duration,
}

impl ServiceReadinessAggregator<HttpHealthProbe> {
    /// Aggregator over HTTP health checks using the configured timings
    pub fn from_config(config: &ReadinessConfig) -> Self {
        Self::new(HttpHealthProbe::new(config.request_timeout()), config.interval())
    }
}

impl<P: ReadinessProbe> ServiceReadinessAggregator<P> {
    /// Create an aggregator that checks every `interval`
    pub fn new(probe: P, interval: Duration) -> Self {
        Self { probe, interval }
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }

    /// Wait for every service in order, stopping at the first that stays down.
    pub async fn await_services(
        &self,
        services: &[ServiceDescriptor],
        per_service_timeout: Duration,
    ) -> Result<(), ReadinessError> {
        info!(count = services.len(), "Waiting for services to be ready");

        for service in services {
            self.await_service(service, per_service_timeout).await?;
        }

        info!("All services ready");
        Ok(())
    }

    /// Wait for a single service
    pub async fn await_service(
        &self,
        service: &ServiceDescriptor,
        timeout: Duration,
    ) -> Result<(), ReadinessError> {
        // A budget shorter than the interval still gets one check
        let config = PollConfig::new(
            timeout,
            self.interval.min(timeout),
            format!("{} did not become ready", service.name),
        )
        .map_err(|source| ReadinessError::InvalidConfig {
            service: service.name.clone(),
            source,
        })?;

        info!(service = %service.name, url = %service.base_url, "Checking service");

        let probe = &self.probe;
        let result = ConditionPoller::new(config)
            .wait_until(move || async move {
                let ready = probe.check(service).await;
                if !matches!(ready, Ok(true)) {
                    debug!(service = %service.name, "Waiting for service");
                }
                ready
            })
            .await;

        match result {
            Ok(()) => {
                info!(service = %service.name, "Service is ready");
                Ok(())
            }
            Err(source) => {
                error!(service = %service.name, error = %source, "Service failed to become ready");
                Err(ReadinessError::ServiceNotReady {
                    service: service.name.clone(),
                    source,
                })
            }
        }
    }
}
