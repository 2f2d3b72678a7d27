//! Juhe (juhe.cn) template SMS, international SMS and voice codes.

use std::sync::Arc;

use crate::config::Account;
use crate::error::SmsError;
use crate::transformers::base::{BaseTransformer, max_mobiles};
use crate::transformers::{ResponseHandlerConfig, SmsTransformer, TransformContext};
use crate::types::{FormParams, HttpRequestSpec, Message};

use super::{first_mobile, require_domestic, require_verification, verification_code};

pub const PROVIDER: &str = "juhe";

pub const DEFAULT_ENDPOINT: &str = "https://v.juhe.cn";
pub const VOICE_ENDPOINT: &str = "https://op.juhe.cn";

const RESPONSE: ResponseHandlerConfig =
    ResponseHandlerConfig::json_eq("error_code", "0").with_message_path("reason");

pub fn transformer() -> Arc<dyn SmsTransformer> {
    Arc::new(
        BaseTransformer::new(PROVIDER, RESPONSE)
            .with_before_hook(require_api_key)
            .with_before_hook(max_mobiles(PROVIDER, 1))
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

/// `#k#=v&#k2#=v2`; names and values are percent-encoded individually so
/// `#`, `&` and `=` inside them survive.
fn tpl_value(msg: &Message) -> String {
    msg.template_params
        .iter()
        .map(|(k, v)| format!("#{}#={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn build_sms(
    _ctx: &TransformContext,
    msg: &Message,
    account: &Account,
) -> Result<HttpRequestSpec, SmsError> {
    if !msg.has_template() {
        return Err(SmsError::invalid(PROVIDER, "template_id is required"));
    }
    let base = account.endpoint_or(DEFAULT_ENDPOINT);
    let mut params = FormParams::new()
        .push("key", account.api_key.as_str())
        .push("mobile", first_mobile(PROVIDER, msg)?);
    let url = if msg.is_intl() {
        params = params.push("areaNum", msg.country_code().to_string());
        format!("{base}/smsInternational/send.php")
    } else {
        format!("{base}/sms/send")
    };
    let params = params
        .push("tpl_id", msg.template_id.as_str())
        .push("tpl_value", tpl_value(msg));
    Ok(HttpRequestSpec::post(url).form(&params))
}

fn build_voice(
    _ctx: &TransformContext,
    msg: &Message,
    account: &Account,
) -> Result<HttpRequestSpec, SmsError> {
    require_domestic(PROVIDER, msg, "voice")?;
    require_verification(PROVIDER, msg)?;
    let mut params = FormParams::new()
        .push("key", account.api_key.as_str())
        .push("valicode", verification_code(PROVIDER, msg)?)
        .push("to", first_mobile(PROVIDER, msg)?);
    if let Some(times) = msg.extra_i64("play_times") {
        params = params.push("playtimes", times.to_string());
    }
    Ok(HttpRequestSpec::post(format!("{VOICE_ENDPOINT}/yuntongxun/voice")).form(&params))
}
