//! Axum integration for the RSVP registration service.
//!
//! Handlers stay thin: extract the request, call a provider or send a
//! command through a `Store`, map the result onto a response.
//!
//! - [`AppError`]: status + code + message, rendered as JSON
//! - [`ApiJson`] and [`ApiQuery`]: body and query extractors that reject with 400
//! - [`CorrelationId`] and [`correlation_id_layer`]: one ID per request,
//!   echoed in `X-Correlation-ID` and recorded on the request span
//! - [`handlers::readiness_response`]: aggregates component health checks

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;

pub use error::AppError;
pub use extractors::{ApiJson, ApiQuery, CorrelationId};
pub use middleware::{CORRELATION_ID_HEADER, correlation_id_layer};
