//! Correlation ID middleware.
//!
//! Every request gets a correlation ID: the valid UUID the client sent in
//! `X-Correlation-ID`, or a fresh one. The ID is stored in the request
//! extensions (see [`CorrelationId`](crate::CorrelationId)), recorded on an
//! `http_request` span wrapping the handler and echoed in the response header.
//!
//! ```ignore
//! let app = Router::new()
//!     .route("/events", get(list_events))
//!     .layer(correlation_id_layer());
//! ```

use axum::{extract::Request, http::HeaderValue, response::Response};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::Instrument;
use uuid::Uuid;

/// Header carrying the correlation ID in both directions.
pub const CORRELATION_ID_HEADER: &str = "X-Correlation-ID";

/// Layer that assigns and echoes correlation IDs.
#[must_use]
pub const fn correlation_id_layer() -> CorrelationIdLayer {
    CorrelationIdLayer
}

/// See [`correlation_id_layer`].
#[derive(Clone, Copy, Debug, Default)]
pub struct CorrelationIdLayer;

impl<S> Layer<S> for CorrelationIdLayer {
    type Service = CorrelationIdService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CorrelationIdService { inner }
    }
}

/// Service produced by [`CorrelationIdLayer`].
#[derive(Clone, Debug)]
pub struct CorrelationIdService<S> {
    inner: S,
}

fn incoming_id(req: &Request) -> Option<Uuid> {
    let raw = req.headers().get(CORRELATION_ID_HEADER)?.to_str().ok()?;
    Uuid::parse_str(raw.trim()).ok()
}

impl<S> Service<Request> for CorrelationIdService<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let correlation_id = incoming_id(&req).unwrap_or_else(Uuid::new_v4);
        req.extensions_mut().insert(correlation_id);

        let span = tracing::info_span!(
            "http_request",
            %correlation_id,
            method = %req.method(),
            path = %req.uri().path(),
        );
        let response = self.inner.call(req).instrument(span);

        Box::pin(async move {
            let mut response = response.await?;
            if let Ok(value) = HeaderValue::from_str(&correlation_id.to_string()) {
                response.headers_mut().insert(CORRELATION_ID_HEADER, value);
            }
            Ok(response)
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::CorrelationId;
    use axum::{Router, body::Body, routing::get};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/id", get(|CorrelationId(id): CorrelationId| async move { id.to_string() }))
            .layer(correlation_id_layer())
    }

    async fn call(header: Option<&str>) -> (String, String) {
        let mut builder = Request::builder().uri("/id");
        if let Some(value) = header {
            builder = builder.header(CORRELATION_ID_HEADER, value);
        }
        let response = app().oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();

        let echoed = response
            .headers()
            .get(CORRELATION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (echoed, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn client_id_is_kept() {
        let id = Uuid::new_v4().to_string();
        let (echoed, seen_by_handler) = call(Some(&id)).await;

        assert_eq!(echoed, id);
        assert_eq!(seen_by_handler, id);
    }

    #[tokio::test]
    async fn missing_id_is_generated() {
        let (echoed, seen_by_handler) = call(None).await;

        assert!(Uuid::parse_str(&echoed).is_ok());
        assert_eq!(echoed, seen_by_handler);
    }

    #[tokio::test]
    async fn malformed_id_is_replaced() {
        let (echoed, _) = call(Some("not-a-uuid")).await;

        assert_ne!(echoed, "not-a-uuid");
        assert!(Uuid::parse_str(&echoed).is_ok());
    }
}
