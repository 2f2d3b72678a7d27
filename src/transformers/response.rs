//! Declarative response checking
//!
//! Most vendors report success with one field compared to a literal
//! (`Code == "OK"`, `error_code == 0`, a plaintext `"0"`). A
//! [`ResponseHandlerConfig`] describes that check so the vendor needs no
//! handler code of its own.

use serde_json::Value;
use std::sync::Arc;

use super::ResponseHandler;
use super::json_path::string_at;
use crate::error::SmsError;
use crate::types::SendResult;

/// How the response body is parsed before the check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseBodyType {
    #[default]
    Json,
    /// The trimmed body text is the checked value; `path` is ignored.
    Text,
}

/// Comparison between the extracted value and `expect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    #[default]
    Eq,
    NotEq,
    Contains,
}

impl MatchMode {
    fn matches(self, actual: &str, expect: &str) -> bool {
        match self {
            Self::Eq => actual == expect,
            Self::NotEq => actual != expect,
            Self::Contains => actual.contains(expect),
        }
    }
}

/// Success predicate of a vendor response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHandlerConfig {
    pub body_type: ResponseBodyType,
    /// Skip the body check entirely; any 2xx is success.
    pub check_body: bool,
    pub path: &'static str,
    pub expect: &'static str,
    pub mode: MatchMode,
    /// Field holding the vendor error code; defaults to `path`.
    pub code_path: Option<&'static str>,
    /// Field holding the vendor error text; falls back to the raw body.
    pub message_path: Option<&'static str>,
    /// Known codes and their descriptions, used when no message field exists.
    pub code_messages: &'static [(&'static str, &'static str)],
    /// Vendor codes that are transient (rate limit, temporary failure).
    pub retryable_codes: &'static [&'static str],
    /// Further `(path, expect)` pairs that also mean success, for vendors
    /// whose API versions disagree on the field or the literal.
    pub alternatives: &'static [(&'static str, &'static str)],
}

impl ResponseHandlerConfig {
    /// JSON body with `path == expect`.
    pub const fn json_eq(path: &'static str, expect: &'static str) -> Self {
        Self {
            body_type: ResponseBodyType::Json,
            check_body: true,
            path,
            expect,
            mode: MatchMode::Eq,
            code_path: None,
            message_path: None,
            code_messages: &[],
            retryable_codes: &[],
            alternatives: &[],
        }
    }

    /// Plaintext body equal to `expect`.
    pub const fn text_eq(expect: &'static str) -> Self {
        Self {
            body_type: ResponseBodyType::Text,
            check_body: true,
            path: "",
            expect,
            mode: MatchMode::Eq,
            code_path: None,
            message_path: None,
            code_messages: &[],
            retryable_codes: &[],
            alternatives: &[],
        }
    }

    /// Only the HTTP status decides.
    pub const fn status_only() -> Self {
        Self {
            body_type: ResponseBodyType::Text,
            check_body: false,
            path: "",
            expect: "",
            mode: MatchMode::Eq,
            code_path: None,
            message_path: None,
            code_messages: &[],
            retryable_codes: &[],
            alternatives: &[],
        }
    }

    pub const fn with_mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub const fn with_code_path(mut self, path: &'static str) -> Self {
        self.code_path = Some(path);
        self
    }

    pub const fn with_message_path(mut self, path: &'static str) -> Self {
        self.message_path = Some(path);
        self
    }

    pub const fn with_code_messages(
        mut self,
        table: &'static [(&'static str, &'static str)],
    ) -> Self {
        self.code_messages = table;
        self
    }

    pub const fn with_retryable_codes(mut self, codes: &'static [&'static str]) -> Self {
        self.retryable_codes = codes;
        self
    }

    /// Accept any of `pairs` as success too. JSON bodies only; compared with
    /// the same [`MatchMode`].
    pub const fn or_json_eq(mut self, pairs: &'static [(&'static str, &'static str)]) -> Self {
        self.alternatives = pairs;
        self
    }

    /// Evaluate the predicate against a 2xx result.
    pub fn check(&self, provider: &str, result: &SendResult) -> Result<(), SmsError> {
        if !self.check_body {
            return Ok(());
        }
        let text = result.body_text();
        match self.body_type {
            ResponseBodyType::Text => {
                let actual = text.trim();
                if self.mode.matches(actual, self.expect) {
                    return Ok(());
                }
                let message = self
                    .describe(actual)
                    .map(str::to_string)
                    .unwrap_or_else(|| text.clone());
                Err(self.failure(provider, actual.to_string(), message))
            }
            ResponseBodyType::Json => {
                let json: Value = serde_json::from_slice(&result.body).map_err(|e| {
                    SmsError::provider_error(
                        provider,
                        "invalid_response",
                        format!("response is not JSON ({e}): {text}"),
                    )
                })?;
                let actual = string_at(&json, self.path);
                if self.mode.matches(&actual, self.expect) {
                    return Ok(());
                }
                if self
                    .alternatives
                    .iter()
                    .any(|(path, expect)| self.mode.matches(&string_at(&json, path), expect))
                {
                    return Ok(());
                }
                let code = match self.code_path {
                    Some(path) => string_at(&json, path),
                    None if actual.is_empty() => self
                        .alternatives
                        .iter()
                        .map(|(path, _)| string_at(&json, path))
                        .find(|c| !c.is_empty())
                        .unwrap_or(actual),
                    None => actual,
                };
                let message = self
                    .message_path
                    .map(|path| string_at(&json, path))
                    .filter(|m| !m.is_empty())
                    .or_else(|| self.describe(&code).map(str::to_string))
                    .unwrap_or(text);
                Err(self.failure(provider, code, message))
            }
        }
    }

    fn describe(&self, code: &str) -> Option<&'static str> {
        self.code_messages
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, m)| *m)
    }

    fn failure(&self, provider: &str, code: String, message: String) -> SmsError {
        let retryable = self.retryable_codes.iter().any(|c| *c == code);
        SmsError::provider_error(provider, code, message).retryable(retryable)
    }

    /// Handler applying the HTTP status check and then this predicate.
    pub fn into_handler(self, provider: &'static str) -> ResponseHandler {
        Arc::new(move |result: &SendResult| {
            check_status(provider, result)?;
            self.check(provider, result)
        })
    }
}

/// Any status outside 200..=299 is a `transport_error` carrying the body.
pub fn check_status(provider: &str, result: &SendResult) -> Result<(), SmsError> {
    if result.is_success() {
        Ok(())
    } else {
        Err(SmsError::http_status(
            provider,
            result.status,
            result.body_text(),
        ))
    }
}
