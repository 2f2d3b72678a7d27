//! HTTP interceptor interfaces
//!
//! Interceptors observe (and may tweak) every outbound vendor request. They run
//! after the transformer has built and signed the request, so anything they
//! change that a vendor signs over will break the signature.

use crate::error::SmsError;
use crate::types::{HttpRequestSpec, SendResult};

/// Context passed to interceptors describing the request.
#[derive(Clone, Debug)]
pub struct HttpRequestContext {
    pub provider: String,
    pub account: String,
    pub method: String,
    pub url: String,
}

/// HTTP interceptor trait
pub trait HttpInterceptor: Send + Sync {
    /// Called before sending. May add headers or fail to short-circuit.
    fn on_before_send(
        &self,
        _ctx: &HttpRequestContext,
        _spec: &mut HttpRequestSpec,
    ) -> Result<(), SmsError> {
        Ok(())
    }

    /// Called once the full (bounded) body has been read.
    fn on_response(&self, _ctx: &HttpRequestContext, _result: &SendResult) -> Result<(), SmsError> {
        Ok(())
    }

    /// Called when sending, reading or response handling fails.
    fn on_error(&self, _ctx: &HttpRequestContext, _error: &SmsError) {}
}

/// A simple logging interceptor backed by `tracing` (no credentials, masked numbers).
#[derive(Clone, Default)]
pub struct LoggingInterceptor;

impl HttpInterceptor for LoggingInterceptor {
    fn on_before_send(
        &self,
        ctx: &HttpRequestContext,
        spec: &mut HttpRequestSpec,
    ) -> Result<(), SmsError> {
        tracing::debug!(
            target: "smsmux::http",
            provider = %ctx.provider,
            account = %ctx.account,
            method = %ctx.method,
            url = %ctx.url,
            body_len = spec.body.len(),
            "sending request"
        );
        Ok(())
    }

    fn on_response(&self, ctx: &HttpRequestContext, result: &SendResult) -> Result<(), SmsError> {
        tracing::debug!(
            target: "smsmux::http",
            provider = %ctx.provider,
            account = %ctx.account,
            status = %result.status,
            body_len = result.body.len(),
            "response received"
        );
        Ok(())
    }

    fn on_error(&self, ctx: &HttpRequestContext, error: &SmsError) {
        tracing::debug!(
            target: "smsmux::http",
            provider = %ctx.provider,
            account = %ctx.account,
            url = %ctx.url,
            err = %error,
            "request error"
        );
    }
}
