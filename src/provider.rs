//! The account pool dispatcher
//!
//! [`SmsProvider`] ties the pieces together: it validates a message, selects
//! an account, has the vendor transformer build the request, executes it and
//! lets the vendor's response handler decide success.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::config::SmsConfig;
use crate::error::SmsError;
use crate::executors::{
    DEFAULT_MAX_BODY_BYTES, HttpExecutionConfig, HttpTransport, RequestOverrides, execute_request,
};
use crate::registry::{self, TransformerRegistry};
use crate::selector::AccountPool;
use crate::transformers::{SmsDispatchTransformer, SmsTransformer, TransformContext};
use crate::types::Message;
use crate::utils::clock::{Clock, NonceSource, RandomNonce, SystemClock};
use crate::utils::http_interceptor::{HttpInterceptor, HttpRequestContext, LoggingInterceptor};
use crate::utils::phone::mask_all;

pub use crate::utils::cancel::SendContext;

/// Default HTTP client timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-send request options.
#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    /// Extra headers; they override both defaults and vendor headers.
    pub headers: BTreeMap<String, String>,
    /// Response body cap for this send.
    pub max_body_bytes: Option<usize>,
}

impl SendOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = Some(limit);
        self
    }
}

/// Outcome of a successful send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    /// Name of the account that served the message.
    pub account: String,
    /// Sub-provider tag.
    pub provider: String,
    pub status: u16,
    pub body: Vec<u8>,
}

impl SendReceipt {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Single-shot SMS/voice/MMS dispatcher over an account pool.
///
/// Reentrant: share it behind an `Arc` and call [`SmsProvider::send`] from as
/// many tasks as needed.
pub struct SmsProvider {
    pool: AccountPool,
    dispatcher: SmsDispatchTransformer,
    transform_ctx: TransformContext,
    http: HttpExecutionConfig,
}

static_assertions::assert_impl_all!(SmsProvider: Send, Sync);

impl fmt::Debug for SmsProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmsProvider")
            .field("strategy", &self.pool.strategy())
            .field("sub_providers", &self.pool.sub_providers())
            .field("registry", self.dispatcher.registry())
            .field("interceptors", &self.http.interceptors.len())
            .field("max_body_bytes", &self.http.max_body_bytes)
            .finish()
    }
}

impl SmsProvider {
    /// Pool with default settings; fails on an empty or fully disabled config.
    pub fn new(config: SmsConfig) -> Result<Self, SmsError> {
        Self::builder(config).build()
    }

    pub fn builder(config: SmsConfig) -> SmsProviderBuilder {
        SmsProviderBuilder::new(config)
    }

    pub fn pool(&self) -> &AccountPool {
        &self.pool
    }

    pub fn registry(&self) -> &TransformerRegistry {
        self.dispatcher.registry()
    }

    /// Send one message.
    ///
    /// Validation, selection, transformation, HTTP and response handling run
    /// strictly in that order. Nothing is retried.
    pub async fn send(
        &self,
        ctx: &SendContext,
        msg: &Message,
        opts: &SendOptions,
    ) -> Result<SendReceipt, SmsError> {
        let result = self.send_inner(ctx, msg, opts).await;
        if let Err(err) = &result {
            tracing::warn!(
                target: "smsmux::send",
                provider = %msg.sub_provider,
                code = err.code(),
                retryable = err.is_retryable(),
                err = %err,
                "send failed"
            );
        }
        result
    }

    async fn send_inner(
        &self,
        ctx: &SendContext,
        msg: &Message,
        opts: &SendOptions,
    ) -> Result<SendReceipt, SmsError> {
        msg.validate()?;
        let transformer = self.dispatcher.resolve(msg)?;
        let tag = msg.sub_provider.as_str();
        ctx.check(tag)?;

        let account = self.pool.select(tag, ctx.preferred_account())?;
        tracing::debug!(
            target: "smsmux::send",
            provider = %tag,
            account = %account.name,
            message_type = %msg.message_type,
            mobiles = %mask_all(&msg.mobiles),
            "dispatching message"
        );

        let (spec, handler) = transformer
            .transform(&self.transform_ctx, msg, &account)
            .map_err(|e| e.with_provider(tag))?;

        let http_ctx = HttpRequestContext {
            provider: tag.to_string(),
            account: account.name.clone(),
            method: spec.method.to_string(),
            url: spec.url.clone(),
        };
        let result = execute_request(
            &self.http,
            &http_ctx,
            spec,
            RequestOverrides {
                headers: Some(&opts.headers),
                max_body_bytes: opts.max_body_bytes,
            },
            ctx,
        )
        .await?;

        handler(&result).map_err(|e| e.with_provider(tag))?;
        tracing::debug!(
            target: "smsmux::send",
            provider = %tag,
            account = %account.name,
            status = result.status,
            "message accepted"
        );

        Ok(SendReceipt {
            account: account.name.clone(),
            provider: tag.to_string(),
            status: result.status,
            body: result.body,
        })
    }
}

/// Builder for [`SmsProvider`].
pub struct SmsProviderBuilder {
    config: SmsConfig,
    http_client: Option<reqwest::Client>,
    timeout: Duration,
    max_body_bytes: usize,
    clock: Arc<dyn Clock>,
    nonce: Arc<dyn NonceSource>,
    registry: Option<TransformerRegistry>,
    extra_transformers: Vec<(String, Arc<dyn SmsTransformer>)>,
    interceptors: Vec<Arc<dyn HttpInterceptor>>,
    http_debug: bool,
    transport: Option<Arc<dyn HttpTransport>>,
}

impl SmsProviderBuilder {
    pub fn new(config: SmsConfig) -> Self {
        Self {
            config,
            http_client: None,
            timeout: DEFAULT_TIMEOUT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            clock: Arc::new(SystemClock),
            nonce: Arc::new(RandomNonce),
            registry: None,
            extra_transformers: Vec::new(),
            interceptors: Vec::new(),
            http_debug: false,
            transport: None,
        }
    }

    /// Set custom HTTP client (takes precedence over `http_timeout`)
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Client-wide timeout; a `SendContext` deadline still wins when shorter.
    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_nonce_source(mut self, nonce: Arc<dyn NonceSource>) -> Self {
        self.nonce = nonce;
        self
    }

    /// Dispatch through `registry` instead of a snapshot of the global one.
    pub fn with_registry(mut self, registry: TransformerRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Register a transformer for this provider only.
    pub fn with_transformer(
        mut self,
        tag: impl Into<String>,
        transformer: Arc<dyn SmsTransformer>,
    ) -> Self {
        self.extra_transformers.push((tag.into(), transformer));
        self
    }

    /// Install a custom HTTP interceptor.
    pub fn with_http_interceptor(mut self, interceptor: Arc<dyn HttpInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Enable a built-in logging interceptor for HTTP debugging (no sensitive data).
    pub fn http_debug(mut self, enabled: bool) -> Self {
        self.http_debug = enabled;
        self
    }

    /// Replace reqwest with a custom transport.
    pub fn with_http_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<SmsProvider, SmsError> {
        self.config.validate_pool()?;

        let http_client = match self.http_client {
            Some(client) => client,
            None => reqwest::Client::builder()
                .timeout(self.timeout)
                .build()
                .map_err(|e| {
                    SmsError::ConfigurationError(format!("failed to build HTTP client: {e}"))
                })?,
        };

        let mut registry = self.registry.unwrap_or_else(registry::snapshot);
        for (tag, transformer) in self.extra_transformers {
            registry.register_as(tag, transformer);
        }
        for account in self.config.items.iter().filter(|a| a.is_enabled()) {
            if !registry.contains(&account.sub_type) {
                tracing::warn!(
                    target: "smsmux::send",
                    account = %account.name,
                    sub_type = %account.sub_type,
                    "no transformer registered for account sub_type"
                );
            }
        }

        let mut interceptors = self.interceptors;
        if self.http_debug {
            interceptors.push(Arc::new(LoggingInterceptor));
        }

        Ok(SmsProvider {
            pool: AccountPool::new(self.config.strategy, self.config.items),
            dispatcher: SmsDispatchTransformer::new(Arc::new(registry)),
            transform_ctx: TransformContext::new(self.clock, self.nonce),
            http: HttpExecutionConfig {
                http_client,
                transport: self.transport,
                interceptors,
                max_body_bytes: self.max_body_bytes,
            },
        })
    }
}
