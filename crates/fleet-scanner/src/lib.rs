//! Fleet scanner daemon internals
//!
//! Split from the binary so the HTTP API can be exercised by integration
//! tests.

pub mod api;
pub mod config;
