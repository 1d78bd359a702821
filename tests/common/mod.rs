//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::{to_bytes, Body, Bytes};
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use futures_util::future::BoxFuture;
use tokio::net::TcpListener;

use doh_relay::config::{ProviderConfig, ProviderList, RelayConfig};
use doh_relay::http::HttpServer;
use doh_relay::lifecycle::Shutdown;

/// RFC 8484 example query for www.example.com, base64url without padding.
pub const EXAMPLE_QUERY_B64: &str = "AAABAAABAAAAAAAAA3d3dwdleGFtcGxlA2NvbQAAAQAB";

/// The same query in wire format.
pub const EXAMPLE_QUERY: &[u8] = &[
    0x00, 0x00, 0x01, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x03, b'w', b'w',
    b'w', 0x07, b'e', b'x', b'a', b'm', b'p', b'l', b'e', 0x03, b'c', b'o', b'm', 0x00, 0x00,
    0x01, 0x00, 0x01,
];

pub const ANSWER: &[u8] = b"\x00\x00\x81\x80answer";

/// What a mock upstream saw.
#[derive(Debug, Clone)]
pub struct UpstreamCall {
    pub method: String,
    pub query: Option<String>,
    pub content_type: Option<String>,
    pub body: Bytes,
}

type Behaviour = Arc<dyn Fn(UpstreamCall) -> BoxFuture<'static, (u16, Vec<u8>)> + Send + Sync>;

#[derive(Clone)]
struct MockState {
    behaviour: Behaviour,
    calls: Arc<AtomicU32>,
    seen: Arc<Mutex<Vec<UpstreamCall>>>,
}

/// Handle to a running mock DoH upstream.
pub struct MockUpstream {
    pub addr: SocketAddr,
    calls: Arc<AtomicU32>,
    seen: Arc<Mutex<Vec<UpstreamCall>>>,
}

impl MockUpstream {
    pub fn url(&self) -> String {
        format!("http://{}/dns-query", self.addr)
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<UpstreamCall> {
        self.seen.lock().unwrap().clone()
    }
}

async fn mock_handler(State(state): State<MockState>, request: Request<Body>) -> Response {
    state.calls.fetch_add(1, Ordering::SeqCst);

    let method = request.method().to_string();
    let query = request.uri().query().map(str::to_string);
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = to_bytes(request.into_body(), usize::MAX).await.unwrap_or_default();

    let call = UpstreamCall { method, query, content_type, body };
    state.seen.lock().unwrap().push(call.clone());

    let (status, body) = (state.behaviour)(call).await;
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, [(header::CONTENT_TYPE, "application/dns-message")], body).into_response()
}

/// Start a programmable mock upstream on an ephemeral port.
pub async fn start_programmable_backend<F, Fut>(f: F) -> MockUpstream
where
    F: Fn(UpstreamCall) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = (u16, Vec<u8>)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let f = Arc::new(f);
    let behaviour: Behaviour = Arc::new(move |call| {
        let f = f.clone();
        Box::pin(async move { f(call).await })
    });
    let calls = Arc::new(AtomicU32::new(0));
    let seen = Arc::new(Mutex::new(Vec::new()));

    let state = MockState {
        behaviour,
        calls: calls.clone(),
        seen: seen.clone(),
    };
    let app = Router::new().fallback(mock_handler).with_state(state);

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockUpstream { addr, calls, seen }
}

/// Upstream that always answers with `ANSWER`.
pub async fn start_answering_backend() -> MockUpstream {
    start_programmable_backend(|_| async { (200, ANSWER.to_vec()) }).await
}

/// Upstream that always answers with `status`.
pub async fn start_failing_backend(status: u16) -> MockUpstream {
    start_programmable_backend(move |_| async move { (status, b"error".to_vec()) }).await
}

/// Upstream that answers every request with a `307` to `location`,
/// keeping the original query string.
pub async fn start_redirecting_backend(location: String) -> MockUpstream {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let calls = Arc::new(AtomicU32::new(0));
    let seen = Arc::new(Mutex::new(Vec::new()));

    let counter = calls.clone();
    let app = Router::new().fallback(move |request: Request<Body>| {
        let counter = counter.clone();
        let location = location.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            let target = match request.uri().query() {
                Some(query) => format!("{}?{}", location, query),
                None => location,
            };
            (StatusCode::TEMPORARY_REDIRECT, [(header::LOCATION, target)]).into_response()
        }
    });

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockUpstream { addr, calls, seen }
}

/// Upstream that never answers in time.
pub async fn start_hanging_backend() -> MockUpstream {
    start_programmable_backend(|_| async {
        tokio::time::sleep(Duration::from_secs(30)).await;
        (200, ANSWER.to_vec())
    })
    .await
}

pub fn provider(name: &str, upstream: &MockUpstream, weight: u32) -> ProviderConfig {
    ProviderConfig {
        name: name.into(),
        url: upstream.url(),
        weight,
        category: "test".into(),
        description: String::new(),
    }
}

/// Relay config pointing at the given providers, with short timeouts.
pub fn relay_config(providers: Vec<ProviderConfig>) -> RelayConfig {
    let mut config = RelayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.providers = ProviderList(providers);
    config.upstream.attempt_timeout_ms = 300;
    config.relay.selection_seed = Some(7);
    config
}

/// Running relay under test.
pub struct TestRelay {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
}

impl TestRelay {
    pub fn url(&self) -> String {
        format!("http://{}/dns-query", self.addr)
    }

    pub fn get_url(&self, dns: &str) -> String {
        format!("{}?dns={}", self.url(), dns)
    }
}

impl Drop for TestRelay {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub async fn start_relay(config: RelayConfig) -> TestRelay {
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config).unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestRelay { addr, shutdown }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
