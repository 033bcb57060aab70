//! Library for collecting Kubernetes deployment metrics from Dynatrace
//!
//! This crate provides the core functionality for:
//! - Authenticated access to the entity, metrics and dashboard endpoints
//! - Deployment discovery and heap scope resolution
//! - Per-deployment metric aggregation and report rendering
//! - Dashboard definitions for the same metrics
//! - Logging setup

pub mod api;
pub mod dashboard;
pub mod error;
pub mod models;
pub mod observability;
pub mod report;

pub use api::{ApiClient, ClientConfig, WorkloadApi};
pub use error::{MetricsError, Result};
pub use models::*;
