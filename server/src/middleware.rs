//! Axum middleware: correlation-ID tracking and the admin gate.
//!
//! The correlation layer extracts the `X-Correlation-ID` header (or
//! generates a fresh UUID), wraps the request in a tracing span, logs
//! completion with the status code, and reflects the ID back in the
//! response - every request is traceable end to end.

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::{HeaderValue, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Layer, Service};
use tracing::Instrument as _;
use uuid::Uuid;

/// Header name for correlation ID.
pub const CORRELATION_ID_HEADER: &str = "X-Correlation-ID";

/// Create a layer that adds correlation-ID tracking to all requests.
#[must_use]
pub fn correlation_id_layer() -> CorrelationIdLayer {
    CorrelationIdLayer
}

/// Layer for correlation-ID tracking.
#[derive(Clone, Debug)]
pub struct CorrelationIdLayer;

impl<S> Layer<S> for CorrelationIdLayer {
    type Service = CorrelationIdMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CorrelationIdMiddleware { inner }
    }
}

/// Middleware service for correlation-ID tracking.
#[derive(Clone, Debug)]
pub struct CorrelationIdMiddleware<S> {
    inner: S,
}

impl<S> Service<Request> for CorrelationIdMiddleware<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future =
        std::pin::Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let correlation_id = req
            .headers()
            .get(CORRELATION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);

        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let span = tracing::info_span!(
            "request",
            %method,
            %path,
            correlation_id = %correlation_id,
        );

        let future = self.inner.call(req);
        Box::pin(
            async move {
                let started = Instant::now();
                let mut response = future.await?;

                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = started.elapsed().as_millis(),
                    "Request completed"
                );

                if let Ok(value) = HeaderValue::from_str(&correlation_id.to_string()) {
                    response.headers_mut().insert(CORRELATION_ID_HEADER, value);
                }
                Ok(response)
            }
            .instrument(span),
        )
    }
}

/// Gate a route behind the configured admin Basic credentials.
///
/// Responds 401 with a `WWW-Authenticate` challenge when the header is
/// missing or the credentials do not match.
pub async fn require_admin(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let authorized = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(decode_basic)
        .is_some_and(|(user, pass)| user == state.admin.username && pass == state.admin.password);

    if !authorized {
        tracing::warn!("Rejected unauthenticated event-creation request");
        let mut response = AppError::unauthorized("Authentication required").into_response();
        response.headers_mut().insert(
            header::WWW_AUTHENTICATE,
            HeaderValue::from_static("Basic realm=\"turnstile\""),
        );
        return response;
    }

    next.run(req).await
}

/// Decode `Basic <base64(user:pass)>` into its credential pair.
fn decode_basic(header: &str) -> Option<(String, String)> {
    let encoded = header.strip_prefix("Basic ")?;
    let decoded = BASE64.decode(encoded.trim()).ok()?;
    let text = String::from_utf8(decoded).ok()?;
    let (user, pass) = text.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_well_formed_basic_header() {
        // "admin:password123"
        let header = format!("Basic {}", BASE64.encode("admin:password123"));
        assert_eq!(
            decode_basic(&header),
            Some(("admin".to_string(), "password123".to_string()))
        );
    }

    #[test]
    fn rejects_malformed_headers() {
        assert_eq!(decode_basic("Bearer token"), None);
        assert_eq!(decode_basic("Basic not-base64!!!"), None);
        let no_colon = format!("Basic {}", BASE64.encode("just-a-user"));
        assert_eq!(decode_basic(&no_colon), None);
    }
}
