use super::*;
use crate::types::FormParams;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct FlagInterceptor(Arc<Mutex<Vec<String>>>);

impl HttpInterceptor for FlagInterceptor {
    fn on_before_send(
        &self,
        _ctx: &HttpRequestContext,
        spec: &mut HttpRequestSpec,
    ) -> Result<(), SmsError> {
        spec.headers
            .insert("x-intercepted".to_string(), "1".to_string());
        self.0.lock().unwrap().push("before".into());
        Ok(())
    }

    fn on_response(&self, _ctx: &HttpRequestContext, _result: &SendResult) -> Result<(), SmsError> {
        self.0.lock().unwrap().push("response".into());
        Ok(())
    }

    fn on_error(&self, _ctx: &HttpRequestContext, _error: &SmsError) {
        self.0.lock().unwrap().push("error".into());
    }
}

fn ctx(url: &str) -> HttpRequestContext {
    HttpRequestContext {
        provider: "test".into(),
        account: "a".into(),
        method: "POST".into(),
        url: url.into(),
    }
}

fn config() -> HttpExecutionConfig {
    HttpExecutionConfig::new(reqwest::Client::new())
}

#[tokio::test]
async fn form_body_sets_default_content_type_and_query() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("POST", "/send")
        .match_query(mockito::Matcher::UrlEncoded("sig".into(), "ABC".into()))
        .match_header("content-type", "application/x-www-form-urlencoded")
        .match_body("a=1&b=x%20y")
        .with_status(200)
        .with_header("x-request-id", "r1")
        .with_body("ok")
        .create_async()
        .await;

    let url = format!("{}/send", server.url());
    let spec = HttpRequestSpec::post(&url)
        .query("sig", "ABC")
        .form(&FormParams::new().push("a", "1").push("b", "x y"));
    let res = execute_request(
        &config(),
        &ctx(&url),
        spec,
        RequestOverrides::default(),
        &SendContext::new(),
    )
    .await
    .unwrap();
    assert_eq!(res.status, 200);
    assert_eq!(res.body_text(), "ok");
    assert_eq!(res.headers.get("x-request-id").map(String::as_str), Some("r1"));
}

#[tokio::test]
async fn spec_and_option_headers_override_defaults() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("POST", "/json")
        .match_header("content-type", "application/json;charset=utf-8")
        .match_header("x-trace", "override")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let url = format!("{}/json", server.url());
    let spec = HttpRequestSpec::post(&url)
        .json(&serde_json::json!({"a": 1}))
        .unwrap()
        .header("Content-Type", "application/json;charset=utf-8")
        .header("X-Trace", "spec");
    let mut extra = BTreeMap::new();
    extra.insert("x-trace".to_string(), "override".to_string());
    let res = execute_request(
        &config(),
        &ctx(&url),
        spec,
        RequestOverrides {
            headers: Some(&extra),
            max_body_bytes: None,
        },
        &SendContext::new(),
    )
    .await
    .unwrap();
    assert_eq!(res.status, 200);
}

#[tokio::test]
async fn non_2xx_is_returned_for_the_handler() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("GET", "/bad")
        .with_status(502)
        .with_body("bad gateway")
        .create_async()
        .await;

    let url = format!("{}/bad", server.url());
    let res = execute_request(
        &config(),
        &ctx(&url),
        HttpRequestSpec::get(&url),
        RequestOverrides::default(),
        &SendContext::new(),
    )
    .await
    .unwrap();
    assert_eq!(res.status, 502);
    assert_eq!(res.body_text(), "bad gateway");
}

#[tokio::test]
async fn body_over_limit_fails() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("GET", "/big")
        .with_status(200)
        .with_body("x".repeat(64))
        .create_async()
        .await;

    let url = format!("{}/big", server.url());
    let err = execute_request(
        &config(),
        &ctx(&url),
        HttpRequestSpec::get(&url),
        RequestOverrides {
            headers: None,
            max_body_bytes: Some(16),
        },
        &SendContext::new(),
    )
    .await
    .unwrap_err();
    assert_eq!(err.code(), "transport_error");
    assert_eq!(err.provider(), "test");
    assert!(err.message().contains("16 bytes"));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn interceptors_observe_success_and_error() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("GET", "/seen")
        .match_header("x-intercepted", "1")
        .with_status(200)
        .with_body("0")
        .create_async()
        .await;

    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut cfg = config();
    cfg.interceptors
        .push(Arc::new(FlagInterceptor(calls.clone())));

    let url = format!("{}/seen", server.url());
    execute_request(
        &cfg,
        &ctx(&url),
        HttpRequestSpec::get(&url),
        RequestOverrides::default(),
        &SendContext::new(),
    )
    .await
    .unwrap();
    assert_eq!(*calls.lock().unwrap(), vec!["before", "response"]);

    let cancelled = SendContext::new();
    cancelled.cancel();
    let err = execute_request(
        &cfg,
        &ctx(&url),
        HttpRequestSpec::get(&url),
        RequestOverrides::default(),
        &cancelled,
    )
    .await
    .unwrap_err();
    assert_eq!(err.code(), "cancelled");
    assert_eq!(calls.lock().unwrap().last().map(String::as_str), Some("error"));
}

#[tokio::test]
async fn connection_failure_is_retryable_transport_error() {
    // nothing listens on port 9 (discard) on test hosts
    let url = "http://127.0.0.1:9/send";
    let err = execute_request(
        &config(),
        &ctx(url),
        HttpRequestSpec::get(url),
        RequestOverrides::default(),
        &SendContext::new(),
    )
    .await
    .unwrap_err();
    assert_eq!(err.code(), "transport_error");
    assert!(err.is_retryable());
}

struct SlowTransport;

#[async_trait::async_trait]
impl HttpTransport for SlowTransport {
    async fn execute(
        &self,
        _request: HttpTransportRequest,
    ) -> Result<HttpTransportResponse, SmsError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(HttpTransportResponse {
            status: 200,
            headers: HeaderMap::new(),
            body: b"late".to_vec(),
        })
    }
}

struct EchoTransport;

#[async_trait::async_trait]
impl HttpTransport for EchoTransport {
    async fn execute(
        &self,
        request: HttpTransportRequest,
    ) -> Result<HttpTransportResponse, SmsError> {
        Ok(HttpTransportResponse {
            status: 200,
            headers: HeaderMap::new(),
            body: request.url.into_bytes(),
        })
    }
}

#[tokio::test]
async fn custom_transport_sees_final_url() {
    let mut cfg = config();
    cfg.transport = Some(Arc::new(EchoTransport));
    let url = "https://api.smsbao.com/sms";
    let res = execute_request(
        &cfg,
        &ctx(url),
        HttpRequestSpec::get(url).query("u", "user"),
        RequestOverrides::default(),
        &SendContext::new(),
    )
    .await
    .unwrap();
    assert_eq!(res.body_text(), "https://api.smsbao.com/sms?u=user");
}

#[tokio::test]
async fn cancellation_aborts_in_flight_request() {
    let mut cfg = config();
    cfg.transport = Some(Arc::new(SlowTransport));
    let send_ctx = SendContext::new();
    let canceller = send_ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel();
    });

    let started = Instant::now();
    let err = execute_request(
        &cfg,
        &ctx("https://slow.local"),
        HttpRequestSpec::get("https://slow.local"),
        RequestOverrides::default(),
        &send_ctx,
    )
    .await
    .unwrap_err();
    assert_eq!(err.code(), "cancelled");
    assert_eq!(err.message(), REASON_CANCELLED);
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn deadline_surfaces_as_cancelled() {
    let mut cfg = config();
    cfg.transport = Some(Arc::new(SlowTransport));
    let send_ctx = SendContext::new().with_timeout(Duration::from_millis(30));
    let err = execute_request(
        &cfg,
        &ctx("https://slow.local"),
        HttpRequestSpec::get("https://slow.local"),
        RequestOverrides::default(),
        &send_ctx,
    )
    .await
    .unwrap_err();
    assert_eq!(err.code(), "cancelled");
    assert_eq!(err.message(), REASON_DEADLINE);
}
