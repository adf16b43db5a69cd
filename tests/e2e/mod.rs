//! End-to-End Tests for the services under test
//!
//! These tests drive the deployed services through their public HTTP APIs
//! only. They run serially so one test's emails are never matched by
//! another's recipient filter.
//!
//! ## Test Categories
//!
//! - `health_checks`: `/health`, `/health/ready`, `/health/live`, `/metrics`
//! - `registration_flow`: user lifecycle plus welcome email delivery

pub mod common;
pub mod health_checks;
pub mod registration_flow;
