//! Request validation.
//!
//! Checks method, content type, size and encoding before any upstream call.
//! DNS messages are never parsed, only measured.

use axum::body::{Body, Bytes};
use axum::http::{header, Method, Request};
use futures_util::StreamExt;

use crate::relay::error::ValidationError;
use crate::upstream::client::{DnsQuery, DNS_MESSAGE};

/// Query parameter carrying the base64url-encoded DNS message.
pub const DNS_PARAM: &str = "dns";

/// Methods accepted on the relay endpoint, as advertised in `Allow`.
pub const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";

/// True if `value` is non-empty unpadded base64url (`[A-Za-z0-9_-]+`).
pub fn is_base64url(value: &str) -> bool {
    !value.is_empty()
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Extract the DNS query from a GET query string.
pub fn validate_get(query: Option<&str>) -> Result<DnsQuery, ValidationError> {
    let mut dns = None;
    let mut passthrough = Vec::new();

    for (key, value) in url::form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
        if key == DNS_PARAM {
            dns.get_or_insert(value.into_owned());
        } else {
            passthrough.push((key.into_owned(), value.into_owned()));
        }
    }

    let dns = dns.filter(|d| !d.is_empty()).ok_or(ValidationError::MissingDnsParam)?;
    if !is_base64url(&dns) {
        return Err(ValidationError::InvalidDnsParam);
    }

    Ok(DnsQuery::Get { dns, passthrough })
}

/// Read a POST body, rejecting empty or oversized messages.
pub async fn read_message(body: Body, max_bytes: usize) -> Result<Bytes, ValidationError> {
    let mut stream = body.into_data_stream();
    let mut message = Vec::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| ValidationError::BodyRead(e.to_string()))?;
        if message.len() + chunk.len() > max_bytes {
            return Err(ValidationError::BodyTooLarge { limit: max_bytes });
        }
        message.extend_from_slice(&chunk);
    }

    if message.is_empty() {
        return Err(ValidationError::EmptyBody);
    }
    Ok(Bytes::from(message))
}

/// Validate a relay request into a `DnsQuery`.
///
/// OPTIONS is answered by the caller before validation.
pub async fn validate(request: Request<Body>, max_bytes: usize) -> Result<DnsQuery, ValidationError> {
    let method = request.method().clone();
    match method {
        Method::GET => validate_get(request.uri().query()),
        Method::POST => {
            let content_type = request
                .headers()
                .get(header::CONTENT_TYPE)
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());
            if content_type.as_deref() != Some(DNS_MESSAGE) {
                return Err(ValidationError::UnsupportedContentType(content_type));
            }

            let body = read_message(request.into_body(), max_bytes).await?;
            Ok(DnsQuery::Post { body })
        }
        other => Err(ValidationError::MethodNotAllowed(other)),
    }
}
