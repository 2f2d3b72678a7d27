//! Vendor transformers
//!
//! One module per sub-provider. Each exposes `PROVIDER` (its tag) and
//! `transformer()`, which builds the vendor's [`SmsTransformer`].

pub mod aliyun;
pub mod cl253;
pub mod huawei;
pub mod juhe;
pub mod luosimao;
pub mod netease;
pub mod normal;
pub mod smsbao;
pub mod submail;
pub mod tencent;
pub mod ucp;
pub mod yunpian;
pub mod yuntongxun;

use std::sync::Arc;

use crate::error::SmsError;
use crate::transformers::SmsTransformer;
use crate::types::{Category, Message};

/// Every built-in vendor transformer.
pub fn builtin_transformers() -> Vec<Arc<dyn SmsTransformer>> {
    vec![
        aliyun::transformer(),
        cl253::transformer(),
        huawei::transformer(),
        juhe::transformer(),
        luosimao::transformer(),
        netease::transformer(),
        normal::transformer(),
        smsbao::transformer(),
        submail::transformer(),
        tencent::transformer(),
        ucp::transformer(),
        yunpian::transformer(),
        yuntongxun::transformer(),
    ]
}

/// Replace every `#name#` token in `content` with its parameter value.
pub(crate) fn render_template(content: &str, msg: &Message) -> String {
    msg.template_params
        .iter()
        .fold(content.to_string(), |acc, (name, value)| {
            acc.replace(&format!("#{name}#"), value)
        })
}

/// Body text for content-only vendors: the content with `#name#` tokens
/// filled in when no vendor template is used.
pub(crate) fn rendered_content(tag: &str, msg: &Message) -> Result<String, SmsError> {
    if msg.content.is_empty() {
        return Err(SmsError::invalid(tag, "content is required"));
    }
    if msg.template_id.is_empty() && !msg.template_params.is_empty() {
        Ok(render_template(&msg.content, msg))
    } else {
        Ok(msg.content.clone())
    }
}

/// `【sign】content`, unless the content already carries the sign.
pub(crate) fn with_sign_prefix(sign: &str, content: &str) -> String {
    let bracketed = format!("【{sign}】");
    if sign.is_empty() || content.contains(&bracketed) {
        content.to_string()
    } else {
        format!("{bracketed}{content}")
    }
}

/// `content【sign】`, unless the content already carries the sign.
pub(crate) fn with_sign_suffix(sign: &str, content: &str) -> String {
    let bracketed = format!("【{sign}】");
    if sign.is_empty() || content.contains(&bracketed) {
        content.to_string()
    } else {
        format!("{content}{bracketed}")
    }
}

/// Named template parameters as a JSON object string.
pub(crate) fn params_json(msg: &Message) -> Result<String, SmsError> {
    Ok(serde_json::to_string(&msg.template_params)?)
}

/// `urlencode(#k#)=urlencode(v)&...`, Yunpian's template value format.
pub(crate) fn hash_tpl_value(msg: &Message) -> String {
    msg.template_params
        .iter()
        .map(|(k, v)| {
            format!(
                "{}={}",
                urlencoding::encode(&format!("#{k}#")),
                urlencoding::encode(v)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// The one-time code carried by a verification call: `template_params["code"]`
/// or, failing that, the content.
pub(crate) fn verification_code(tag: &str, msg: &Message) -> Result<String, SmsError> {
    msg.template_params
        .get("code")
        .cloned()
        .or_else(|| (!msg.content.is_empty()).then(|| msg.content.clone()))
        .ok_or_else(|| SmsError::invalid(tag, "voice verification requires a code"))
}

pub(crate) fn require_verification(tag: &str, msg: &Message) -> Result<(), SmsError> {
    if msg.category == Category::Verification {
        Ok(())
    } else {
        Err(SmsError::unsupported_category(tag, msg.category))
    }
}

pub(crate) fn require_domestic(tag: &str, msg: &Message, what: &str) -> Result<(), SmsError> {
    if msg.is_domestic() {
        Ok(())
    } else {
        Err(SmsError::unsupported_international(
            tag,
            format!("{what} supports mainland China numbers only"),
        ))
    }
}

pub(crate) fn require_single(tag: &str, msg: &Message, what: &str) -> Result<(), SmsError> {
    if msg.mobiles.len() == 1 {
        Ok(())
    } else {
        Err(SmsError::invalid(
            tag,
            format!("{what} requires a single mobile, got {}", msg.mobiles.len()),
        ))
    }
}

pub(crate) fn first_mobile<'a>(tag: &str, msg: &'a Message) -> Result<&'a str, SmsError> {
    msg.mobiles
        .first()
        .map(String::as_str)
        .ok_or_else(|| SmsError::invalid(tag, "at least one mobile is required"))
}
