//! E2E Health Check Tests
//!
//! Operational endpoints of the auth and user services.
//!
//! ## Test Coverage
//!
//! - `/health` reports healthy with service name, version and timestamp
//! - `/health/ready` reports ready with database and external service checks
//! - `/health/live` reports alive with a positive uptime
//! - `/metrics` reports uptime, memory and process information

use super::common::E2ETestEnv;
use serial_test::serial;
use std::time::Duration;

const SERVICES: [&str; 2] = ["auth", "user"];

#[test]
fn test_env_builds_from_defaults() {
    let env = E2ETestEnv::from_env();
    assert!(env.mail.api_url().starts_with("http"));
    assert!(env.mail_poll("x").timeout() >= Duration::from_secs(1));
}

#[tokio::test]
#[serial]
async fn test_health_endpoint_reports_healthy() {
    crate::skip_unless_available!("auth", "user");
    let env = E2ETestEnv::from_env();

    for key in SERVICES {
        let report = env
            .probe(key)
            .health()
            .await
            .unwrap_or_else(|e| panic!("{key} /health failed: {e}"));

        assert_eq!(report.status, "healthy", "{key} should be healthy");
        assert!(!report.service.is_empty());
        assert!(!report.version.is_empty());
        assert!(!report.timestamp.is_null());
        println!("{key}: {} v{}", report.service, report.version);
    }
}

#[tokio::test]
#[serial]
async fn test_ready_endpoint_reports_dependencies() {
    crate::skip_unless_available!("auth", "user");
    let env = E2ETestEnv::from_env();

    for key in SERVICES {
        let report = env
            .probe(key)
            .readiness()
            .await
            .unwrap_or_else(|e| panic!("{key} /health/ready failed: {e}"));

        assert_eq!(report.status, "ready");
        assert!(!report.checks.database.is_null());
        assert!(!report.checks.external_services.is_null());
        println!("{key}: database {:?}", report.checks.database_status());
    }
}

#[tokio::test]
#[serial]
async fn test_live_endpoint_reports_uptime() {
    crate::skip_unless_available!("auth", "user");
    let env = E2ETestEnv::from_env();

    for key in SERVICES {
        let report = env
            .probe(key)
            .liveness()
            .await
            .unwrap_or_else(|e| panic!("{key} /health/live failed: {e}"));

        assert_eq!(report.status, "alive");
        assert!(report.uptime > 0.0, "{key} uptime should be positive");
    }
}

#[tokio::test]
#[serial]
async fn test_metrics_endpoint_reports_memory() {
    crate::skip_unless_available!("auth", "user");
    let env = E2ETestEnv::from_env();

    for key in SERVICES {
        let report = env
            .probe(key)
            .metrics()
            .await
            .unwrap_or_else(|e| panic!("{key} /metrics failed: {e}"));

        assert!(!report.process.is_null());
        assert!(!report.memory.status.is_empty());
        println!(
            "{key}: heap {} MB ({})",
            report.memory.heap_used_mb, report.memory.status
        );
    }
}
