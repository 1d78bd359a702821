//! Failure injection tests for upstream failover.

use axum::http::StatusCode;

mod common;

use common::*;

#[tokio::test]
async fn test_failover_reaches_healthy_provider() {
    let refusing = start_failing_backend(503).await;
    let hanging = start_hanging_backend().await;
    let healthy = start_answering_backend().await;

    let relay = start_relay(relay_config(vec![
        provider("refusing", &refusing, 50),
        provider("hanging", &hanging, 30),
        provider("healthy", &healthy, 20),
    ]))
    .await;

    let res = client()
        .get(relay.get_url(EXAMPLE_QUERY_B64))
        .send()
        .await
        .expect("relay unreachable");

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "application/dns-message");
    assert_eq!(res.bytes().await.unwrap().as_ref(), ANSWER);

    assert_eq!(healthy.calls(), 1);
    assert!(refusing.calls() <= 1);
    assert!(hanging.calls() <= 1);
}

#[tokio::test]
async fn test_all_providers_failing_returns_bad_gateway() {
    let a = start_failing_backend(500).await;
    let b = start_failing_backend(503).await;
    let c = start_hanging_backend().await;

    let relay = start_relay(relay_config(vec![
        provider("a", &a, 50),
        provider("b", &b, 30),
        provider("c", &c, 20),
    ]))
    .await;

    let res = client()
        .get(relay.get_url(EXAMPLE_QUERY_B64))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(
        res.text().await.unwrap(),
        "DNS query failed: all upstream resolvers failed"
    );

    // Each provider is tried exactly once.
    assert_eq!(a.calls(), 1);
    assert_eq!(b.calls(), 1);
    assert_eq!(c.calls(), 1);
}

#[tokio::test]
async fn test_redirected_provider_still_answers() {
    let moved_to = start_answering_backend().await;
    let moved = start_redirecting_backend(moved_to.url()).await;

    let relay = start_relay(relay_config(vec![provider("moved", &moved, 1)])).await;

    let res = client()
        .get(relay.get_url(EXAMPLE_QUERY_B64))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.bytes().await.unwrap().as_ref(), ANSWER);
    assert_eq!(moved.calls(), 1);
    assert_eq!(moved_to.calls(), 1);
    let seen = moved_to.seen();
    assert!(seen[0].query.as_deref().unwrap().starts_with("dns="));
}

#[tokio::test]
async fn test_oversized_answer_fails_over() {
    let bloated = start_programmable_backend(|_| async { (200, vec![0u8; 70_000]) }).await;
    let healthy = start_answering_backend().await;

    let relay = start_relay(relay_config(vec![
        provider("bloated", &bloated, 50),
        provider("healthy", &healthy, 50),
    ]))
    .await;

    let res = client()
        .get(relay.get_url(EXAMPLE_QUERY_B64))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.bytes().await.unwrap().as_ref(), ANSWER);
    assert_eq!(healthy.calls(), 1);
}

#[tokio::test]
async fn test_oversized_answer_from_only_provider_is_bad_gateway() {
    let bloated = start_programmable_backend(|_| async { (200, vec![0u8; 70_000]) }).await;
    let relay = start_relay(relay_config(vec![provider("bloated", &bloated, 1)])).await;

    let res = client()
        .get(relay.get_url(EXAMPLE_QUERY_B64))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(bloated.calls(), 1);
}

#[tokio::test]
async fn test_get_query_forwarded_unchanged() {
    let upstream = start_answering_backend().await;
    let relay = start_relay(relay_config(vec![provider("only", &upstream, 1)])).await;

    let res = client()
        .get(format!("{}&ct=application/dns-message", relay.get_url(EXAMPLE_QUERY_B64)))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["cache-control"], "public, max-age=300");
    assert_eq!(res.headers()["access-control-allow-origin"], "*");

    let seen = upstream.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].method, "GET");
    let query = seen[0].query.as_deref().unwrap();
    assert!(query.starts_with(&format!("dns={}", EXAMPLE_QUERY_B64)));
}

#[tokio::test]
async fn test_post_body_forwarded_unchanged() {
    let upstream = start_answering_backend().await;
    let relay = start_relay(relay_config(vec![provider("only", &upstream, 1)])).await;

    let res = client()
        .post(relay.url())
        .header("content-type", "application/dns-message")
        .body(EXAMPLE_QUERY.to_vec())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.bytes().await.unwrap().as_ref(), ANSWER);

    let seen = upstream.seen();
    assert_eq!(seen[0].method, "POST");
    assert_eq!(seen[0].content_type.as_deref(), Some("application/dns-message"));
    assert_eq!(seen[0].body.as_ref(), EXAMPLE_QUERY);
}

#[tokio::test]
async fn test_concurrent_queries_all_answered() {
    let upstream = start_answering_backend().await;
    let mut config = relay_config(vec![provider("only", &upstream, 1)]);
    config.rate_limit.enabled = false;
    let relay = start_relay(config).await;

    let client = client();
    let mut tasks = Vec::new();
    for _ in 0..50 {
        let client = client.clone();
        let url = relay.get_url(EXAMPLE_QUERY_B64);
        tasks.push(tokio::spawn(async move {
            client.get(url).send().await.map(|r| r.status())
        }));
    }

    for task in tasks {
        assert_eq!(task.await.unwrap().unwrap(), StatusCode::OK);
    }
    assert_eq!(upstream.calls(), 50);
}
