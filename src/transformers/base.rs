//! Shared scaffolding every vendor transformer is composed from.
//!
//! A [`BaseTransformer`] owns the sub-provider tag, the response handling,
//! the before-hooks and one build slot per message type. Vendors only supply
//! the pieces that differ.

use std::fmt;
use std::sync::Arc;

use super::response::{ResponseHandlerConfig, check_status};
use super::{ResponseHandler, SmsTransformer, TransformContext};
use crate::config::Account;
use crate::error::SmsError;
use crate::types::{HttpRequestSpec, Message, MessageType, SendResult};

/// Validation or defaulting step run before the build slot.
pub type BeforeHook = Arc<dyn Fn(&Message, &Account) -> Result<(), SmsError> + Send + Sync>;

/// Build function for one message type.
pub type BuildFn = Arc<
    dyn Fn(&TransformContext, &Message, &Account) -> Result<HttpRequestSpec, SmsError>
        + Send
        + Sync,
>;

enum ResponseHandling {
    Config(ResponseHandlerConfig),
    Custom(Arc<dyn Fn(&SendResult) -> Result<(), SmsError> + Send + Sync>),
}

/// Composable transformer.
pub struct BaseTransformer {
    tag: &'static str,
    response: ResponseHandling,
    before_hooks: Vec<BeforeHook>,
    sms: Option<BuildFn>,
    voice: Option<BuildFn>,
    mms: Option<BuildFn>,
}

impl fmt::Debug for BaseTransformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseTransformer")
            .field("tag", &self.tag)
            .field("before_hooks", &self.before_hooks.len())
            .field("sms", &self.sms.is_some())
            .field("voice", &self.voice.is_some())
            .field("mms", &self.mms.is_some())
            .finish()
    }
}

impl BaseTransformer {
    /// Transformer for `tag` whose responses are checked by `config`.
    pub fn new(tag: &'static str, config: ResponseHandlerConfig) -> Self {
        Self {
            tag,
            response: ResponseHandling::Config(config),
            before_hooks: Vec::new(),
            sms: None,
            voice: None,
            mms: None,
        }
    }

    /// Replace the declarative check with custom code.
    ///
    /// The HTTP status check still runs first.
    pub fn with_custom_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&SendResult) -> Result<(), SmsError> + Send + Sync + 'static,
    {
        self.response = ResponseHandling::Custom(Arc::new(handler));
        self
    }

    /// Append a hook; hooks run in registration order.
    pub fn with_before_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Message, &Account) -> Result<(), SmsError> + Send + Sync + 'static,
    {
        self.before_hooks.push(Arc::new(hook));
        self
    }

    pub fn with_sms_handler<F>(mut self, build: F) -> Self
    where
        F: Fn(&TransformContext, &Message, &Account) -> Result<HttpRequestSpec, SmsError>
            + Send
            + Sync
            + 'static,
    {
        self.sms = Some(Arc::new(build));
        self
    }

    pub fn with_voice_handler<F>(mut self, build: F) -> Self
    where
        F: Fn(&TransformContext, &Message, &Account) -> Result<HttpRequestSpec, SmsError>
            + Send
            + Sync
            + 'static,
    {
        self.voice = Some(Arc::new(build));
        self
    }

    pub fn with_mms_handler<F>(mut self, build: F) -> Self
    where
        F: Fn(&TransformContext, &Message, &Account) -> Result<HttpRequestSpec, SmsError>
            + Send
            + Sync
            + 'static,
    {
        self.mms = Some(Arc::new(build));
        self
    }

    pub fn tag(&self) -> &'static str {
        self.tag
    }

    /// Whether a build slot is set for `message_type`.
    pub fn supports(&self, message_type: MessageType) -> bool {
        self.slot(message_type).is_some()
    }

    fn slot(&self, message_type: MessageType) -> Option<&BuildFn> {
        match message_type {
            MessageType::SmsText => self.sms.as_ref(),
            MessageType::Voice => self.voice.as_ref(),
            MessageType::Mms => self.mms.as_ref(),
        }
    }

    /// The response handler handed out with every request.
    pub fn response_handler(&self) -> ResponseHandler {
        let tag = self.tag;
        match &self.response {
            ResponseHandling::Config(config) => config.clone().into_handler(tag),
            ResponseHandling::Custom(custom) => {
                let custom = Arc::clone(custom);
                Arc::new(move |result: &SendResult| {
                    check_status(tag, result)?;
                    custom(result).map_err(|e| e.with_provider(tag))
                })
            }
        }
    }
}

impl SmsTransformer for BaseTransformer {
    fn sub_provider(&self) -> &str {
        self.tag
    }

    fn transform(
        &self,
        ctx: &TransformContext,
        msg: &Message,
        account: &Account,
    ) -> Result<(HttpRequestSpec, ResponseHandler), SmsError> {
        if !self.can_transform(msg) {
            return Err(SmsError::invalid(
                self.tag,
                format!("message for '{}' routed to {}", msg.sub_provider, self.tag),
            ));
        }
        let build = self
            .slot(msg.message_type)
            .ok_or_else(|| SmsError::unsupported_message_type(self.tag, msg.message_type))?;
        for hook in &self.before_hooks {
            hook(msg, account).map_err(|e| e.with_provider(self.tag))?;
        }
        let spec = build(ctx, msg, account).map_err(|e| e.with_provider(self.tag))?;
        Ok((spec, self.response_handler()))
    }
}

/// Hook: the account must carry an API key and secret.
pub fn require_key_and_secret(
    tag: &'static str,
) -> impl Fn(&Message, &Account) -> Result<(), SmsError> + Send + Sync + 'static {
    move |_msg, account| {
        if account.api_key.is_empty() || account.secret().is_empty() {
            return Err(SmsError::auth(tag, "api_key and api_secret are required"));
        }
        Ok(())
    }
}

/// Hook: the message must name a template.
pub fn require_template(
    tag: &'static str,
) -> impl Fn(&Message, &Account) -> Result<(), SmsError> + Send + Sync + 'static {
    move |msg, _account| {
        if msg.template_id.is_empty() {
            return Err(SmsError::invalid(tag, "template_id is required"));
        }
        Ok(())
    }
}

/// Hook: the message must carry a sign name.
pub fn require_sign_name(
    tag: &'static str,
) -> impl Fn(&Message, &Account) -> Result<(), SmsError> + Send + Sync + 'static {
    move |msg, _account| {
        if msg.sign_name.is_empty() {
            return Err(SmsError::invalid(tag, "sign_name is required"));
        }
        Ok(())
    }
}

/// Hook: at most `max` recipients per request.
pub fn max_mobiles(
    tag: &'static str,
    max: usize,
) -> impl Fn(&Message, &Account) -> Result<(), SmsError> + Send + Sync + 'static {
    move |msg, _account| {
        if msg.mobiles.len() > max {
            return Err(SmsError::invalid(
                tag,
                format!("at most {max} mobiles per request, got {}", msg.mobiles.len()),
            ));
        }
        Ok(())
    }
}
