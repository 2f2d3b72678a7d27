//! Utility modules for smsmux
//!
//! Signing primitives, time/nonce injection, phone helpers and HTTP plumbing
//! shared by the vendor transformers and the dispatcher.

pub mod cancel;
pub mod clock;
pub mod headers;
pub mod http_interceptor;
pub mod phone;
pub mod sign;

pub use cancel::SendContext;
pub use clock::{Clock, FixedClock, FixedNonce, NonceSource, RandomNonce, SystemClock};
pub use http_interceptor::{HttpInterceptor, HttpRequestContext, LoggingInterceptor};
