//! Rate-Limit HTTP Middleware
//!
//! Translates admission decisions into HTTP signals: `X-RateLimit-*` headers
//! on every accounted response and a structured 429 body on rejection.

use super::limiter::{RateLimitDecision, RateLimiter};
use crate::catalog::types::ErrorResponse;
use axum::Json;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderValue, StatusCode, header::HeaderName};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::net::SocketAddr;
use std::sync::Arc;

const LIMIT_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const REMAINING_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
const RETRY_AFTER_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-retry-after-seconds");

pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    let client = client_ip(&request, peer);

    match limiter.check(&client) {
        RateLimitDecision::Bypassed => next.run(request).await,
        RateLimitDecision::Admitted { limit, remaining } => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert(LIMIT_HEADER, HeaderValue::from(limit));
            headers.insert(REMAINING_HEADER, HeaderValue::from(remaining));
            response
        }
        RateLimitDecision::Rejected {
            limit,
            retry_after_secs,
        } => {
            let body = ErrorResponse::new(
                StatusCode::TOO_MANY_REQUESTS.as_u16(),
                format!("request limit exceeded, maximum {limit} requests per minute"),
            );
            let mut response =
                (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
            let headers = response.headers_mut();
            headers.insert(LIMIT_HEADER, HeaderValue::from(limit));
            headers.insert(REMAINING_HEADER, HeaderValue::from(0u64));
            headers.insert(RETRY_AFTER_HEADER, HeaderValue::from(retry_after_secs));
            response
        }
    }
}

/// Caller identity: first `X-Forwarded-For` entry when present (proxies and
/// load balancers prepend the real client), otherwise the socket peer.
fn client_ip(request: &Request, peer: SocketAddr) -> String {
    let forwarded = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty() && !value.eq_ignore_ascii_case("unknown"));

    match forwarded {
        Some(ip) => ip.to_string(),
        None => peer.ip().to_string(),
    }
}
