//! Core library for the fleet scanner
//!
//! This crate provides the core functionality for:
//! - Metrics history storage (in-memory and JSON-lines)
//! - Underutilization and CPU spike policy evaluation
//! - Cost projection and impact ranking
//! - Concurrent multi-region scan cycles
//! - Alert formatting and delivery
//! - Health checks and observability

pub mod alert;
pub mod cost;
pub mod error;
pub mod health;
pub mod history;
pub mod models;
pub mod observability;
pub mod policy;
pub mod scan;

pub use error::{Collaborator, FleetError, FleetResult};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{ScannerMetrics, StructuredLogger};
