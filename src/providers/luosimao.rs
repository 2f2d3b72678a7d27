//! Luosimao SMS and voice verification (v1 API, HTTP Basic auth).

use std::sync::Arc;

use crate::config::Account;
use crate::error::SmsError;
use crate::transformers::base::BaseTransformer;
use crate::transformers::{ResponseHandlerConfig, SmsTransformer, TransformContext};
use crate::types::{FormParams, HttpRequestSpec, Message};
use crate::utils::clock::format_china;
use crate::utils::sign::base64_encode;

use super::{
    rendered_content, require_domestic, require_single, require_verification, verification_code,
    with_sign_suffix,
};

pub const PROVIDER: &str = "luosimao";

pub const DEFAULT_ENDPOINT: &str = "https://sms-api.luosimao.com";
pub const VOICE_ENDPOINT: &str = "https://voice-api.luosimao.com";

/// v1 reports `error`, v2 `errorno`.
const RESPONSE: ResponseHandlerConfig = ResponseHandlerConfig::json_eq("error", "0")
    .or_json_eq(&[("errorno", "0")])
    .with_message_path("msg");

pub fn transformer() -> Arc<dyn SmsTransformer> {
    Arc::new(
        BaseTransformer::new(PROVIDER, RESPONSE)
            .with_before_hook(require_secret)
            .with_before_hook(|msg: &Message, _account: &Account| {
                require_domestic(PROVIDER, msg, "luosimao")
            })
            .with_sms_handler(build_sms)
            .with_voice_handler(build_voice),
    )
}

fn require_secret(_msg: &Message, account: &Account) -> Result<(), SmsError> {
    if account.secret().is_empty() {
        return Err(SmsError::auth(PROVIDER, "api_secret (api key) is required"));
    }
    Ok(())
}

/// `Basic base64("api:key-<secret>")`
pub fn basic_auth(secret: &str) -> String {
    format!("Basic {}", base64_encode(format!("api:key-{secret}")))
}

fn build_sms(
    _ctx: &TransformContext,
    msg: &Message,
    account: &Account,
) -> Result<HttpRequestSpec, SmsError> {
    let text = with_sign_suffix(&msg.sign_name, &rendered_content(PROVIDER, msg)?);
    let base = account.endpoint_or(DEFAULT_ENDPOINT);
    let spec = if msg.is_batch() {
        let mut params = FormParams::new()
            .push("mobile_list", msg.joined_mobiles(","))
            .push("message", text);
        if let Some(at) = msg.scheduled_at {
            params = params.push("time", format_china(at, "%Y-%m-%d %H:%M:%S"));
        }
        HttpRequestSpec::post(format!("{base}/v1/send_batch.json")).form(&params)
    } else {
        let params = FormParams::new()
            .push("mobile", msg.joined_mobiles(","))
            .push("message", text);
        HttpRequestSpec::post(format!("{base}/v1/send.json")).form(&params)
    };
    Ok(spec.header("Authorization", basic_auth(account.secret())))
}

fn build_voice(
    _ctx: &TransformContext,
    msg: &Message,
    account: &Account,
) -> Result<HttpRequestSpec, SmsError> {
    require_single(PROVIDER, msg, "voice")?;
    require_verification(PROVIDER, msg)?;
    let params = FormParams::new()
        .push("mobile", msg.mobiles[0].as_str())
        .push("code", verification_code(PROVIDER, msg)?);
    Ok(HttpRequestSpec::post(format!("{VOICE_ENDPOINT}/v1/verify.json"))
        .header("Authorization", basic_auth(account.secret()))
        .form(&params))
}
