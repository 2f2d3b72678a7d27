//! Transformers layer
//!
//! A transformer turns a vendor-agnostic [`Message`] plus the selected
//! [`Account`] into a concrete [`HttpRequestSpec`] and a [`ResponseHandler`]
//! that normalizes the vendor's reply.

pub mod base;
pub mod dispatch;
pub(crate) mod json_path;
pub mod response;

pub use base::{BaseTransformer, BeforeHook, BuildFn};
pub use dispatch::SmsDispatchTransformer;
pub use response::{MatchMode, ResponseBodyType, ResponseHandlerConfig, check_status};

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::config::Account;
use crate::error::SmsError;
use crate::types::{HttpRequestSpec, Message, SendResult};
use crate::utils::clock::{Clock, NonceSource, RandomNonce, SystemClock};

/// Normalizes a raw HTTP result into success or a provider-tagged error.
pub type ResponseHandler = Arc<dyn Fn(&SendResult) -> Result<(), SmsError> + Send + Sync>;

/// Time and nonce sources available while building a request.
#[derive(Debug, Clone)]
pub struct TransformContext {
    clock: Arc<dyn Clock>,
    nonce: Arc<dyn NonceSource>,
}

impl TransformContext {
    pub fn new(clock: Arc<dyn Clock>, nonce: Arc<dyn NonceSource>) -> Self {
        Self { clock, nonce }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_nonce(mut self, nonce: Arc<dyn NonceSource>) -> Self {
        self.nonce = nonce;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn nonce_number(&self) -> u64 {
        self.nonce.next_number()
    }

    pub fn nonce_token(&self) -> String {
        self.nonce.next_token()
    }
}

impl Default for TransformContext {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock), Arc::new(RandomNonce))
    }
}

/// Vendor adapter contract.
pub trait SmsTransformer: Send + Sync {
    /// Sub-provider tag this transformer serves (e.g. `"aliyun"`).
    fn sub_provider(&self) -> &str;

    /// True iff `msg` targets this transformer's sub-provider.
    fn can_transform(&self, msg: &Message) -> bool {
        msg.sub_provider == self.sub_provider()
    }

    /// Build the request for `msg` on `account`.
    fn transform(
        &self,
        ctx: &TransformContext,
        msg: &Message,
        account: &Account,
    ) -> Result<(HttpRequestSpec, ResponseHandler), SmsError>;
}
