//! End-to-end tests for the creator-scout pipeline
//!
//! Every test drives the real HTTP client against a wiremock server, so the
//! request shapes, response parsing and file outputs are all exercised.

pub mod error_scenarios;
pub mod pipeline_test;
