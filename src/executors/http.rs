//! Execution of one [`HttpRequestSpec`].
//!
//! Builds the final request (headers, query, body), races it against the
//! caller's cancellation token and deadline, and reads the response body up
//! to a byte limit.

use reqwest::header::HeaderMap;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::transport::{HttpTransport, HttpTransportRequest, HttpTransportResponse};
use crate::error::SmsError;
use crate::types::{HttpRequestSpec, SendResult};
use crate::utils::cancel::{REASON_CANCELLED, REASON_DEADLINE, SendContext};
use crate::utils::headers::{build_request_headers, headermap_to_btree};
use crate::utils::http_interceptor::{HttpInterceptor, HttpRequestContext};

/// Default cap on response bodies.
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Shared execution settings.
#[derive(Clone)]
pub struct HttpExecutionConfig {
    pub http_client: reqwest::Client,
    pub transport: Option<Arc<dyn HttpTransport>>,
    pub interceptors: Vec<Arc<dyn HttpInterceptor>>,
    pub max_body_bytes: usize,
}

impl HttpExecutionConfig {
    pub fn new(http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            transport: None,
            interceptors: Vec::new(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// Per-call knobs layered over [`HttpExecutionConfig`].
#[derive(Debug, Clone, Default)]
pub struct RequestOverrides<'a> {
    pub headers: Option<&'a BTreeMap<String, String>>,
    pub max_body_bytes: Option<usize>,
}

/// Execute `spec` for `ctx.provider`, honouring `send_ctx`.
pub async fn execute_request(
    config: &HttpExecutionConfig,
    ctx: &HttpRequestContext,
    spec: HttpRequestSpec,
    overrides: RequestOverrides<'_>,
    send_ctx: &SendContext,
) -> Result<SendResult, SmsError> {
    let provider = ctx.provider.as_str();
    let result = run(config, ctx, spec, overrides, send_ctx)
        .await
        .map_err(|e| e.with_provider(provider));

    match &result {
        Ok(res) => {
            for interceptor in &config.interceptors {
                interceptor.on_response(ctx, res)?;
            }
        }
        Err(err) => {
            for interceptor in &config.interceptors {
                interceptor.on_error(ctx, err);
            }
        }
    }
    result
}

async fn run(
    config: &HttpExecutionConfig,
    ctx: &HttpRequestContext,
    mut spec: HttpRequestSpec,
    overrides: RequestOverrides<'_>,
    send_ctx: &SendContext,
) -> Result<SendResult, SmsError> {
    let provider = ctx.provider.as_str();
    send_ctx.check(provider)?;
    for interceptor in &config.interceptors {
        interceptor.on_before_send(ctx, &mut spec)?;
    }
    let empty = BTreeMap::new();
    let headers = build_request_headers(
        spec.body_type,
        &spec.headers,
        overrides.headers.unwrap_or(&empty),
    )?;
    let max_body = overrides.max_body_bytes.unwrap_or(config.max_body_bytes);

    let call = send(config, ctx, spec, headers, max_body, send_ctx);
    tokio::select! {
        biased;
        _ = send_ctx.cancel_token().cancelled() => {
            Err(SmsError::cancelled(provider, REASON_CANCELLED))
        }
        _ = send_ctx.expired() => {
            Err(SmsError::cancelled(provider, REASON_DEADLINE))
        }
        res = call => res,
    }
}

async fn send(
    config: &HttpExecutionConfig,
    ctx: &HttpRequestContext,
    spec: HttpRequestSpec,
    headers: HeaderMap,
    max_body: usize,
    send_ctx: &SendContext,
) -> Result<SendResult, SmsError> {
    let url = spec.full_url()?;
    let timeout = send_ctx.remaining();

    if let Some(transport) = &config.transport {
        let response = transport
            .execute(HttpTransportRequest {
                ctx: ctx.clone(),
                method: spec.method,
                url: url.to_string(),
                headers,
                body: spec.body,
                timeout,
            })
            .await?;
        return from_transport(&ctx.provider, response, max_body);
    }

    let mut rb = config
        .http_client
        .request(spec.method, url)
        .headers(headers);
    if !spec.body.is_empty() {
        rb = rb.body(spec.body);
    }
    // the caller's deadline takes precedence over the client default
    if let Some(remaining) = timeout {
        rb = rb.timeout(remaining);
    }

    let mut resp = rb
        .send()
        .await
        .map_err(|e| classify_reqwest_error(&ctx.provider, e, send_ctx))?;
    let status = resp.status().as_u16();
    let headers = headermap_to_btree(resp.headers());

    let mut body = Vec::new();
    while let Some(chunk) = resp
        .chunk()
        .await
        .map_err(|e| classify_reqwest_error(&ctx.provider, e, send_ctx))?
    {
        if body.len() + chunk.len() > max_body {
            return Err(body_too_large(&ctx.provider, max_body));
        }
        body.extend_from_slice(&chunk);
    }

    Ok(SendResult {
        status,
        headers,
        body,
    })
}

fn from_transport(
    provider: &str,
    response: HttpTransportResponse,
    max_body: usize,
) -> Result<SendResult, SmsError> {
    if response.body.len() > max_body {
        return Err(body_too_large(provider, max_body));
    }
    Ok(SendResult {
        status: response.status,
        headers: headermap_to_btree(&response.headers),
        body: response.body,
    })
}

fn body_too_large(provider: &str, max_body: usize) -> SmsError {
    SmsError::io(provider, format!("response body exceeds {max_body} bytes")).retryable(false)
}

/// A reqwest timeout caused by the caller's deadline is a cancellation, not a
/// transport failure.
fn classify_reqwest_error(
    provider: &str,
    err: reqwest::Error,
    send_ctx: &SendContext,
) -> SmsError {
    if err.is_timeout() && send_ctx.remaining() == Some(std::time::Duration::ZERO) {
        return SmsError::cancelled(provider, REASON_DEADLINE);
    }
    SmsError::from(err).with_provider(provider)
}

#[cfg(test)]
mod tests;
