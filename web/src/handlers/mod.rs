//! Reusable HTTP handlers.

pub mod health;

pub use health::{ReadinessReport, readiness_response};
