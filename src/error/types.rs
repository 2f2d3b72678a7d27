//! Core error type for smsmux.

use thiserror::Error;

/// Broad error category for retry policies and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Rejected locally before any HTTP traffic.
    Validation,
    /// Pool or builder misconfiguration.
    Configuration,
    /// Network failure, timeout or non-2xx HTTP status.
    Transport,
    /// Vendor accepted the HTTP call but reported a business failure.
    Provider,
    /// The caller aborted the send.
    Cancelled,
}

/// Unified error returned by every smsmux operation.
///
/// Each variant is tagged with the vendor (`provider`) it originated from.
/// Pool-level failures that happen before a vendor is known carry the
/// requested sub-provider tag instead, which may be empty.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SmsError {
    /// Missing or malformed message fields.
    #[error("[{provider}] invalid_message: {message}")]
    InvalidMessage { provider: String, message: String },

    /// The message does not name a sub-provider.
    #[error("missing_subprovider: message has no sub-provider tag")]
    MissingSubProvider,

    /// No transformer is registered for the sub-provider tag.
    #[error("[{provider}] unsupported_subprovider: no transformer registered")]
    UnsupportedSubProvider { provider: String },

    /// The vendor cannot send this kind of message (SMS/voice/MMS).
    #[error("[{provider}] unsupported_message_type: {message_type}")]
    UnsupportedMessageType {
        provider: String,
        message_type: String,
    },

    /// The vendor refuses this message category for the requested capability.
    #[error("[{provider}] unsupported_category: {category}")]
    UnsupportedCategory { provider: String, category: String },

    /// The vendor has no international route for this capability.
    #[error("[{provider}] unsupported_international: {message}")]
    UnsupportedInternational { provider: String, message: String },

    /// The recipient number is outside the vendor's supported countries.
    #[error("[{provider}] unsupported_country: {message}")]
    UnsupportedCountry { provider: String, message: String },

    /// Credentials required by the vendor are missing or unusable.
    #[error("[{provider}] auth_error: {message}")]
    AuthError { provider: String, message: String },

    /// No enabled account can serve the request.
    #[error("[{provider}] no_available_account: no enabled account can serve this message")]
    NoAvailableAccount { provider: String },

    /// Invalid pool or builder configuration.
    #[error("configuration_error: {0}")]
    ConfigurationError(String),

    /// I/O failure, timeout or non-2xx HTTP status.
    #[error("[{provider}] transport_error{}: {message}", status_suffix(.status))]
    TransportError {
        provider: String,
        status: Option<u16>,
        message: String,
        retryable: bool,
    },

    /// Vendor-level business failure on a 2xx response.
    #[error("[{provider}] provider_error {code}: {message}")]
    ProviderError {
        provider: String,
        code: String,
        message: String,
        retryable: bool,
    },

    /// The send was aborted by cancellation or an expired deadline.
    #[error("[{provider}] cancelled: {reason}")]
    Cancelled { provider: String, reason: String },
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

impl SmsError {
    /// Stable taxonomy tag of this error (`"provider_error"`, `"cancelled"`, ...).
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidMessage { .. } => "invalid_message",
            Self::MissingSubProvider => "missing_subprovider",
            Self::UnsupportedSubProvider { .. } => "unsupported_subprovider",
            Self::UnsupportedMessageType { .. } => "unsupported_message_type",
            Self::UnsupportedCategory { .. } => "unsupported_category",
            Self::UnsupportedInternational { .. } => "unsupported_international",
            Self::UnsupportedCountry { .. } => "unsupported_country",
            Self::AuthError { .. } => "auth_error",
            Self::NoAvailableAccount { .. } => "no_available_account",
            Self::ConfigurationError(_) => "configuration_error",
            Self::TransportError { .. } => "transport_error",
            Self::ProviderError { .. } => "provider_error",
            Self::Cancelled { .. } => "cancelled",
        }
    }

    /// Vendor tag the error is attributed to (empty for pool-level errors).
    pub fn provider(&self) -> &str {
        match self {
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
            | Self::Cancelled { provider, .. } => provider,
            Self::MissingSubProvider | Self::ConfigurationError(_) => "",
        }
    }

    /// Vendor-specific error code, only present on `provider_error`.
    pub fn vendor_code(&self) -> Option<&str> {
        match self {
            Self::ProviderError { code, .. } => Some(code),
            _ => None,
        }
    }

    /// HTTP status attached to a `transport_error`, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::TransportError { status, .. } => *status,
            _ => None,
        }
    }

    /// Human-readable message without the provider/taxonomy prefix.
    pub fn message(&self) -> String {
        match self {
            Self::InvalidMessage { message, .. }
            | Self::UnsupportedInternational { message, .. }
            | Self::UnsupportedCountry { message, .. }
            | Self::AuthError { message, .. }
            | Self::TransportError { message, .. }
            | Self::ProviderError { message, .. } => message.clone(),
            Self::UnsupportedMessageType { message_type, .. } => message_type.clone(),
            Self::UnsupportedCategory { category, .. } => category.clone(),
            Self::Cancelled { reason, .. } => reason.clone(),
            Self::ConfigurationError(message) => message.clone(),
            other => other.to_string(),
        }
    }

    /// Whether a caller-side retry may succeed.
    ///
    /// smsmux never retries on its own; this is a hint for caller policies.
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::TransportError { retryable, .. } | Self::ProviderError { retryable, .. } => {
                *retryable
            }
            _ => false,
        }
    }

    /// Coarse category of this error.
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigurationError(_) | Self::NoAvailableAccount { .. } | Self::AuthError { .. } => {
                ErrorCategory::Configuration
            }
            Self::TransportError { .. } => ErrorCategory::Transport,
            Self::ProviderError { .. } => ErrorCategory::Provider,
            Self::Cancelled { .. } => ErrorCategory::Cancelled,
            _ => ErrorCategory::Validation,
        }
    }

    /// True when the error was raised locally before dispatch.
    pub const fn is_validation(&self) -> bool {
        matches!(self.category(), ErrorCategory::Validation)
    }
}
