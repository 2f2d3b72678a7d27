//! Yunpian SMS (v2) and voice verification.

use std::sync::Arc;

use serde_json::Value;

use crate::config::Account;
use crate::error::SmsError;
use crate::transformers::base::{BaseTransformer, max_mobiles};
use crate::transformers::json_path::string_at;
use crate::transformers::{ResponseHandlerConfig, SmsTransformer, TransformContext};
use crate::types::{FormParams, HttpRequestSpec, Message, SendResult};
use crate::utils::phone::with_plus_prefix;

use super::{
    hash_tpl_value, rendered_content, require_domestic, require_single, require_verification,
    verification_code, with_sign_prefix,
};

pub const PROVIDER: &str = "yunpian";

pub const DEFAULT_ENDPOINT: &str = "https://sms.yunpian.com";
pub const DEFAULT_INTL_ENDPOINT: &str = "https://us.yunpian.com";
pub const VOICE_ENDPOINT: &str = "https://voice.yunpian.com";

const MAX_MOBILES: usize = 1000;

pub fn transformer() -> Arc<dyn SmsTransformer> {
    Arc::new(
        BaseTransformer::new(PROVIDER, ResponseHandlerConfig::status_only())
            .with_custom_handler(check_response)
            .with_before_hook(require_api_key)
            .with_before_hook(max_mobiles(PROVIDER, MAX_MOBILES))
            .with_sms_handler(build_sms)
            .with_voice_handler(build_voice),
    )
}

fn require_api_key(_msg: &Message, account: &Account) -> Result<(), SmsError> {
    if account.api_key.is_empty() {
        return Err(SmsError::auth(PROVIDER, "api_key is required"));
    }
    Ok(())
}

fn failure(item: &Value) -> SmsError {
    let message = ["msg", "detail"]
        .iter()
        .map(|path| string_at(item, path))
        .find(|m| !m.is_empty())
        .unwrap_or_else(|| item.to_string());
    SmsError::provider_error(PROVIDER, string_at(item, "code"), message)
}

/// Single sends answer `{code, msg}`; batch sends answer `{data: [{code, msg}, ..]}`
/// and succeed only if every entry does.
fn check_response(result: &SendResult) -> Result<(), SmsError> {
    let json: Value = serde_json::from_slice(&result.body).map_err(|e| {
        SmsError::provider_error(
            PROVIDER,
            "invalid_response",
            format!("response is not JSON ({e}): {}", result.body_text()),
        )
    })?;
    if let Some(items) = json.get("data").and_then(Value::as_array) {
        return match items.iter().find(|item| string_at(item, "code") != "0") {
            Some(item) => Err(failure(item)),
            None => Ok(()),
        };
    }
    if string_at(&json, "code") == "0" {
        Ok(())
    } else {
        Err(failure(&json))
    }
}

fn build_sms(
    _ctx: &TransformContext,
    msg: &Message,
    account: &Account,
) -> Result<HttpRequestSpec, SmsError> {
    let (base, mobiles) = if msg.is_intl() {
        let code = msg.country_code();
        let mobiles = msg
            .mobiles
            .iter()
            .map(|m| with_plus_prefix(code, m))
            .collect::<Vec<_>>()
            .join(",");
        (account.intl_endpoint_or(DEFAULT_INTL_ENDPOINT), mobiles)
    } else {
        (account.endpoint_or(DEFAULT_ENDPOINT), msg.joined_mobiles(","))
    };

    let params = FormParams::new()
        .push("apikey", account.api_key.as_str())
        .push("mobile", mobiles);
    let (action, params) = match (msg.has_template(), msg.is_batch()) {
        (true, batch) => {
            let params = params
                .push("tpl_id", msg.template_id.as_str())
                .push("tpl_value", hash_tpl_value(msg));
            (if batch { "tpl_batch_send" } else { "tpl_single_send" }, params)
        }
        (false, batch) => {
            let text = with_sign_prefix(&msg.sign_name, &rendered_content(PROVIDER, msg)?);
            let params = params.push("text", text);
            (if batch { "batch_send" } else { "single_send" }, params)
        }
    };
    let callback = if msg.callback_url.is_empty() {
        account.callback.as_str()
    } else {
        msg.callback_url.as_str()
    };
    let params = params
        .push_non_empty("extend", &msg.extend)
        .push_non_empty("uid", &msg.uid)
        .push_non_empty("callback_url", callback);
    Ok(HttpRequestSpec::post(format!("{base}/v2/sms/{action}.json")).form(&params))
}

fn build_voice(
    _ctx: &TransformContext,
    msg: &Message,
    account: &Account,
) -> Result<HttpRequestSpec, SmsError> {
    require_domestic(PROVIDER, msg, "voice")?;
    require_single(PROVIDER, msg, "voice")?;
    require_verification(PROVIDER, msg)?;
    let params = FormParams::new()
        .push("apikey", account.api_key.as_str())
        .push("mobile", msg.mobiles[0].as_str())
        .push("code", verification_code(PROVIDER, msg)?)
        .push_non_empty("callback_url", &msg.callback_url);
    Ok(HttpRequestSpec::post(format!("{VOICE_ENDPOINT}/v2/voice/send.json")).form(&params))
}
