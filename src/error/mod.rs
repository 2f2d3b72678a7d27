//! Error Handling Module
//!
//! This module provides error handling for smsmux, including:
//! - Core error type (`SmsError`, `ErrorCategory`)
//! - Constructors used by transformers and the dispatcher
//! - Type conversions from common error types
//!
//! # Example
//!
//! ```rust,ignore
//! use smsmux::error::SmsError;
//!
//! let error = SmsError::provider_error("aliyun", "isv.INVALID", "template not found");
//! assert_eq!(error.code(), "provider_error");
//! assert!(!error.is_retryable());
//! ```

// Module declarations
mod conversions;
pub mod helpers;
pub mod types;

// Re-exports for public API
pub use helpers::*;
pub use types::*;
