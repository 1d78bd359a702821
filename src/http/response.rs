//! Response assembly.
//!
//! # Responsibilities
//! - Build the client response for an upstream answer
//! - Answer CORS preflight
//! - Map relay errors to status codes and headers
//!
//! # Design Decisions
//! - Upstream headers are not forwarded; the answer is re-wrapped with a
//!   fixed header set
//! - Individual upstream failures are never shown to the client

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::relay::error::{RelayError, ValidationError};
use crate::relay::validator::ALLOWED_METHODS;
use crate::resilience::RelayAnswer;
use crate::security::headers::{apply_cors, apply_security, PREFLIGHT_MAX_AGE};
use crate::upstream::client::DNS_MESSAGE;

/// Response carrying an upstream DNS answer.
pub fn answer_response(answer: RelayAnswer, cache_ttl_secs: u64) -> Response {
    let mut response = Response::new(Body::from(answer.body));
    *response.status_mut() = answer.status;

    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(DNS_MESSAGE));
    apply_cors(headers);
    if let Ok(value) = HeaderValue::from_str(&format!("public, max-age={}", cache_ttl_secs)) {
        headers.insert(header::CACHE_CONTROL, value);
    }
    apply_security(headers);
    response
}

/// CORS preflight answer.
pub fn preflight_response() -> Response {
    let mut response = StatusCode::NO_CONTENT.into_response();
    let headers = response.headers_mut();
    apply_cors(headers);
    headers.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static(PREFLIGHT_MAX_AGE));
    response
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut response = match &self {
            RelayError::Admission(_) => {
                (status, "Rate limit exceeded. Please try again later.").into_response()
            }
            RelayError::Validation(ValidationError::MethodNotAllowed(_)) => {
                (status, "Method not allowed").into_response()
            }
            RelayError::Validation(e) => (status, format!("Bad request: {}", e)).into_response(),
            RelayError::Exhausted(_) => {
                (status, "DNS query failed: all upstream resolvers failed").into_response()
            }
        };

        let headers = response.headers_mut();
        match &self {
            RelayError::Admission(e) => {
                headers.insert(header::RETRY_AFTER, HeaderValue::from(e.retry_after_secs()));
            }
            RelayError::Validation(ValidationError::MethodNotAllowed(_)) => {
                headers.insert(header::ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
            }
            _ => {}
        }
        response
    }
}
