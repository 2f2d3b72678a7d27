//! Cancellation and deadlines around in-flight sends.

mod support;

use std::sync::Arc;
use std::time::{Duration, Instant};

use smsmux::{SendContext, SendOptions, Strategy};
use support::{provider, smsbao_account, smsbao_message};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn slow_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("0")
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn cancel_aborts_in_flight_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("0")
                .set_delay(Duration::from_secs(5)),
        )
        .expect(1)
        .mount(&server)
        .await;
    let provider = Arc::new(provider(
        Strategy::RoundRobin,
        [smsbao_account("bao", "user", &server.uri())],
    ));

    let ctx = SendContext::new();
    let task = {
        let provider = Arc::clone(&provider);
        let ctx = ctx.clone();
        tokio::spawn(async move {
            provider
                .send(&ctx, &smsbao_message(), &SendOptions::new())
                .await
        })
    };

    tokio::time::sleep(Duration::from_millis(100)).await;
    let cancelled_at = Instant::now();
    ctx.cancel();

    let err = task.await.unwrap().unwrap_err();
    assert!(
        cancelled_at.elapsed() < Duration::from_millis(75),
        "send kept running for {:?} after cancel",
        cancelled_at.elapsed()
    );
    assert_eq!(err.code(), "cancelled");
    assert_eq!(err.provider(), "smsbao");
    assert!(!err.is_retryable());

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn deadline_surfaces_as_cancelled() {
    let server = slow_server().await;
    let provider = provider(
        Strategy::RoundRobin,
        [smsbao_account("bao", "user", &server.uri())],
    );

    let started = Instant::now();
    let ctx = SendContext::new().with_timeout(Duration::from_millis(100));
    let err = provider
        .send(&ctx, &smsbao_message(), &SendOptions::new())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "cancelled");
    assert_eq!(err.message(), "deadline exceeded");
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn external_token_is_observed() {
    let server = slow_server().await;
    let provider = provider(
        Strategy::RoundRobin,
        [smsbao_account("bao", "user", &server.uri())],
    );

    let shutdown = CancellationToken::new();
    let ctx = SendContext::new().with_cancel_token(shutdown.child_token());
    let trigger = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            shutdown.cancel();
        })
    };
    let err = provider
        .send(&ctx, &smsbao_message(), &SendOptions::new())
        .await
        .unwrap_err();
    trigger.await.unwrap();
    assert_eq!(err.code(), "cancelled");
}

#[tokio::test]
async fn cancelled_before_send_makes_no_request() {
    let server = slow_server().await;
    let provider = provider(
        Strategy::RoundRobin,
        [smsbao_account("bao", "user", &server.uri())],
    );

    let ctx = SendContext::new();
    ctx.cancel();
    let err = provider
        .send(&ctx, &smsbao_message(), &SendOptions::new())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "cancelled");
    assert!(server.received_requests().await.unwrap().is_empty());
}
