//! Response header policy.
//!
//! # Responsibilities
//! - Permissive CORS for browser DoH clients
//! - Security headers on DNS answers
//!
//! # Design Decisions
//! - CORS is wide open (`*`); the relay carries no credentials
//! - HSTS is emitted even though TLS terminates at the edge

use axum::http::{header, HeaderMap, HeaderValue};

use crate::relay::validator::ALLOWED_METHODS;

/// Preflight cache lifetime in seconds.
pub const PREFLIGHT_MAX_AGE: &str = "86400";

const HSTS: &str = "max-age=31536000; includeSubDomains";

/// Add the CORS headers shared by answers and preflight responses.
pub fn apply_cors(headers: &mut HeaderMap) {
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOWED_METHODS));
    headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("Content-Type"));
}

/// Add security headers sent with DNS answers.
pub fn apply_security(headers: &mut HeaderMap) {
    headers.insert(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(header::STRICT_TRANSPORT_SECURITY, HeaderValue::from_static(HSTS));
}
