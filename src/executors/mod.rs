//! Executors Layer
//!
//! HTTP orchestration that runs a transformer's request spec against the
//! vendor endpoint (or a custom transport) and hands back the raw result.

pub mod http;
pub mod transport;

pub use http::{DEFAULT_MAX_BODY_BYTES, HttpExecutionConfig, RequestOverrides, execute_request};
pub use transport::{HttpTransport, HttpTransportRequest, HttpTransportResponse};
