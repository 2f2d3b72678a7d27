//! Error constructors shared by transformers and the dispatcher.

use super::types::SmsError;

/// 429 and 5xx responses are worth retrying; everything else is final.
pub const fn is_retryable_status(status: u16) -> bool {
    status == 429 || status >= 500
}

impl SmsError {
    /// `invalid_message` tagged with `provider`.
    pub fn invalid(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidMessage {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// `auth_error` tagged with `provider`.
    pub fn auth(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AuthError {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// `unsupported_international` tagged with `provider`.
    pub fn unsupported_international(
        provider: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::UnsupportedInternational {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// `unsupported_country` tagged with `provider`.
    pub fn unsupported_country(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UnsupportedCountry {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// `unsupported_category` tagged with `provider`.
    pub fn unsupported_category(provider: impl Into<String>, category: impl ToString) -> Self {
        Self::UnsupportedCategory {
            provider: provider.into(),
            category: category.to_string(),
        }
    }

    /// `unsupported_message_type` tagged with `provider`.
    pub fn unsupported_message_type(
        provider: impl Into<String>,
        message_type: impl ToString,
    ) -> Self {
        Self::UnsupportedMessageType {
            provider: provider.into(),
            message_type: message_type.to_string(),
        }
    }

    /// Non-retryable `provider_error` carrying the vendor code.
    pub fn provider_error(
        provider: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::ProviderError {
            provider: provider.into(),
            code: code.into(),
            message: message.into(),
            retryable: false,
        }
    }

    /// `transport_error` for an HTTP status outside 200..=299.
    pub fn http_status(provider: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::TransportError {
            provider: provider.into(),
            status: Some(status),
            message: body.into(),
            retryable: is_retryable_status(status),
        }
    }

    /// `transport_error` for a failure below HTTP (DNS, TCP, TLS, body read).
    pub fn io(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TransportError {
            provider: provider.into(),
            status: None,
            message: message.into(),
            retryable: true,
        }
    }

    /// `cancelled` tagged with `provider`.
    pub fn cancelled(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Cancelled {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    /// Mark a `provider_error` or `transport_error` as retryable.
    pub fn retryable(mut self, value: bool) -> Self {
        match &mut self {
            Self::ProviderError { retryable, .. } | Self::TransportError { retryable, .. } => {
                *retryable = value;
            }
            _ => {}
        }
        self
    }

    /// Attach a provider tag to errors created without one (e.g. via `From`).
    pub fn with_provider(mut self, tag: &str) -> Self {
        match &mut self {
            Self::InvalidMessage { provider, .. }
            | Self::UnsupportedSubProvider { provider }
            | Self::UnsupportedMessageType { provider, .. }
            | Self::UnsupportedCategory { provider, .. }
            | Self::UnsupportedInternational { provider, .. }
            | Self::UnsupportedCountry { provider, .. }
            | Self::AuthError { provider, .. }
            | Self::NoAvailableAccount { provider }
            | Self::TransportError { provider, .. }
            | Self::ProviderError { provider, .. }
            | Self::Cancelled { provider, .. } => {
                if provider.is_empty() {
                    *provider = tag.to_string();
                }
            }
            Self::MissingSubProvider | Self::ConfigurationError(_) => {}
        }
        self
    }
}
