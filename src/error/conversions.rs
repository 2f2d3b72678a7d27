//! Type Conversions for SmsError
//!
//! This module contains From trait implementations for converting
//! common error types into SmsError.

use super::types::SmsError;

impl From<reqwest::Error> for SmsError {
    fn from(err: reqwest::Error) -> Self {
        let status = err.status().map(|s| s.as_u16());
        Self::TransportError {
            provider: String::new(),
            status,
            message: err.to_string(),
            retryable: status.map(super::helpers::is_retryable_status).unwrap_or(true),
        }
    }
}

impl From<serde_json::Error> for SmsError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidMessage {
            provider: String::new(),
            message: format!("json encoding failed: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: SmsError = json_err.into();
        assert!(matches!(err, SmsError::InvalidMessage { .. }));
    }
}
