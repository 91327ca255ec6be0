//! Request extractors.
//!
//! - [`CorrelationId`]: the request's correlation ID
//! - [`ApiJson`]: JSON body whose rejections render as 400 [`AppError`]s
//! - [`ApiQuery`]: query string with the same rejection behaviour

use crate::error::AppError;
use crate::middleware::CORRELATION_ID_HEADER;
use axum::{
    Json, async_trait,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;

/// Correlation ID of the current request.
///
/// Taken from the request extensions when `correlation_id_layer` ran, else
/// from a valid `X-Correlation-ID` header, else freshly generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelationId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let from_header = || {
            parts
                .headers
                .get(CORRELATION_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| Uuid::parse_str(s.trim()).ok())
        };

        let id = parts
            .extensions
            .get::<Uuid>()
            .copied()
            .or_else(from_header)
            .unwrap_or_else(Uuid::new_v4);

        Ok(Self(id))
    }
}

/// JSON request body.
///
/// Behaves like [`axum::Json`] except that every rejection (malformed JSON,
/// wrong content type, missing or mistyped field) is a `400 Bad Request`
/// carrying the deserializer's message.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Json::<T>::from_request(req, state)
            .await
            .map(|Json(value)| Self(value))
            .map_err(|rejection| {
                tracing::debug!(error = %rejection.body_text(), "Rejected request body");
                AppError::bad_request(rejection.body_text())
            })
    }
}

/// Query string parameters.
///
/// Like [`axum::extract::Query`], but an unparsable value (`?page=abc`) is a
/// `400 Bad Request` with the usual `{code, message}` body.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| Self(value))
            .map_err(|rejection| {
                tracing::debug!(error = %rejection.body_text(), "Rejected query string");
                AppError::bad_request(rejection.body_text())
            })
    }
}
