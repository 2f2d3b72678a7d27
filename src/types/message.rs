//! Vendor-agnostic message model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::extras::{ExtraValue, Extras};
use crate::error::SmsError;
use crate::utils::phone;

/// What kind of delivery a message asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    #[default]
    SmsText,
    Voice,
    Mms,
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SmsText => "sms_text",
            Self::Voice => "voice",
            Self::Mms => "mms",
        })
    }
}

/// Advisory purpose of a message; some vendors gate capabilities on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Verification,
    #[default]
    Notification,
    Promotion,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Verification => "verification",
            Self::Notification => "notification",
            Self::Promotion => "promotion",
        })
    }
}

/// A single outbound SMS, voice call or MMS.
///
/// `region_code` is the E.164 country calling code of every recipient; `0`
/// and `86` both mean mainland China.
///
/// A message with neither `template_id` nor `content` is still valid when it
/// carries params: verification-code sends (Netease `sendcode`, voice codes)
/// need nothing else. Vendors that put text on the wire reject such a message
/// with `invalid_message` when it is transformed, before any request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Message {
    pub sub_provider: String,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub category: Category,
    pub mobiles: Vec<String>,
    pub region_code: u32,
    pub content: String,
    pub sign_name: String,
    pub template_id: String,
    pub template_params: BTreeMap<String, String>,
    pub params_order: Vec<String>,
    pub callback_url: String,
    pub extend: String,
    pub uid: String,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub extras: Extras,
}

impl Message {
    /// Start building a message for `sub_provider`.
    pub fn builder(sub_provider: impl Into<String>) -> MessageBuilder {
        MessageBuilder::new(sub_provider)
    }

    pub fn is_domestic(&self) -> bool {
        matches!(self.region_code, 0 | 86)
    }

    pub fn is_intl(&self) -> bool {
        !self.is_domestic()
    }

    /// Region code with the domestic `0` shorthand resolved to `86`.
    pub fn country_code(&self) -> u32 {
        if self.region_code == 0 {
            86
        } else {
            self.region_code
        }
    }

    pub fn has_template(&self) -> bool {
        !self.template_id.is_empty()
    }

    pub fn is_batch(&self) -> bool {
        self.mobiles.len() > 1
    }

    /// Recipients joined with `sep`.
    pub fn joined_mobiles(&self, sep: &str) -> String {
        self.mobiles.join(sep)
    }

    /// Template parameters in positional order.
    ///
    /// Uses `params_order` when set, otherwise the named parameters sorted by
    /// name.
    pub fn positional_params(&self) -> Vec<String> {
        if !self.params_order.is_empty() {
            return self.params_order.clone();
        }
        self.template_params.values().cloned().collect()
    }

    pub fn extra(&self, key: &str) -> Option<&ExtraValue> {
        self.extras.get(key)
    }

    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extras.get_str(key)
    }

    pub fn extra_i64(&self, key: &str) -> Option<i64> {
        self.extras.get_i64(key)
    }

    pub fn extra_bool(&self, key: &str) -> Option<bool> {
        self.extras.get_bool(key)
    }

    pub fn extra_f64(&self, key: &str) -> Option<f64> {
        self.extras.get_f64(key)
    }

    /// Vendor-independent validation run before account selection.
    ///
    /// Content-or-template is checked loosely here: params alone pass, and
    /// the vendor transformer decides whether it needs text.
    pub fn validate(&self) -> Result<(), SmsError> {
        let tag = self.sub_provider.as_str();
        if self.mobiles.is_empty() {
            return Err(SmsError::invalid(tag, "at least one mobile is required"));
        }
        if let Some(idx) = self.mobiles.iter().position(|m| m.trim().is_empty()) {
            return Err(SmsError::invalid(tag, format!("mobile #{idx} is empty")));
        }
        if self.template_id.is_empty()
            && self.content.is_empty()
            && self.template_params.is_empty()
            && self.params_order.is_empty()
        {
            return Err(SmsError::invalid(
                tag,
                "content is required when no template is given",
            ));
        }
        if self.region_code != 0 && !phone::is_valid_country_code(self.region_code) {
            return Err(SmsError::invalid(
                tag,
                format!("region code {} is not an E.164 country code", self.region_code),
            ));
        }
        Ok(())
    }
}

/// Fluent, vendor-agnostic [`Message`] builder.
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    msg: Message,
}

impl MessageBuilder {
    pub fn new(sub_provider: impl Into<String>) -> Self {
        Self {
            msg: Message {
                sub_provider: sub_provider.into(),
                ..Default::default()
            },
        }
    }

    pub fn message_type(mut self, message_type: MessageType) -> Self {
        self.msg.message_type = message_type;
        self
    }

    pub fn voice(self) -> Self {
        self.message_type(MessageType::Voice)
    }

    pub fn mms(self) -> Self {
        self.message_type(MessageType::Mms)
    }

    pub fn category(mut self, category: Category) -> Self {
        self.msg.category = category;
        self
    }

    pub fn mobile(mut self, mobile: impl Into<String>) -> Self {
        self.msg.mobiles.push(mobile.into());
        self
    }

    pub fn mobiles<I, S>(mut self, mobiles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.msg.mobiles.extend(mobiles.into_iter().map(Into::into));
        self
    }

    pub fn region_code(mut self, region_code: u32) -> Self {
        self.msg.region_code = region_code;
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.msg.content = content.into();
        self
    }

    pub fn sign_name(mut self, sign_name: impl Into<String>) -> Self {
        self.msg.sign_name = sign_name.into();
        self
    }

    pub fn template_id(mut self, template_id: impl Into<String>) -> Self {
        self.msg.template_id = template_id.into();
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.msg.template_params.insert(name.into(), value.into());
        self
    }

    pub fn params_order<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.msg.params_order = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn callback_url(mut self, url: impl Into<String>) -> Self {
        self.msg.callback_url = url.into();
        self
    }

    pub fn extend(mut self, extend: impl Into<String>) -> Self {
        self.msg.extend = extend.into();
        self
    }

    pub fn uid(mut self, uid: impl Into<String>) -> Self {
        self.msg.uid = uid.into();
        self
    }

    pub fn scheduled_at(mut self, at: DateTime<Utc>) -> Self {
        self.msg.scheduled_at = Some(at);
        self
    }

    pub fn extra(mut self, key: impl Into<String>, value: impl Into<ExtraValue>) -> Self {
        self.msg.extras.insert(key, value);
        self
    }

    pub fn build(self) -> Message {
        self.msg
    }
}
