//! HTTP transport abstraction.
//!
//! Lets callers replace `reqwest` with their own transport: the executor hands
//! over the fully built request (final URL, headers, body) and expects the raw
//! response back.

use async_trait::async_trait;
use reqwest::Method;
use reqwest::header::HeaderMap;
use std::time::Duration;

use crate::error::SmsError;
use crate::utils::http_interceptor::HttpRequestContext;

/// Transport-level request data.
#[derive(Debug, Clone)]
pub struct HttpTransportRequest {
    pub ctx: HttpRequestContext,
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    /// Time left before the caller's deadline, if one is set.
    pub timeout: Option<Duration>,
}

/// Transport-level response data.
#[derive(Debug, Clone)]
pub struct HttpTransportResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

/// Custom HTTP transport.
///
/// Cancellation and deadlines are enforced around `execute`, so an
/// implementation only needs to be cancel-safe (dropping its future must
/// abort the call).
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: HttpTransportRequest)
    -> Result<HttpTransportResponse, SmsError>;
}
