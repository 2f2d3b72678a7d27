//! Yuntongxun (Cloopen) template SMS and voice verification.
//!
//! `sig = upper(md5(sid + token + timestamp))` goes in the query string and
//! `Authorization = base64(sid:timestamp)`, both keyed on China time.

use std::sync::Arc;

use serde_json::json;

use crate::config::Account;
use crate::error::SmsError;
use crate::transformers::base::{
    BaseTransformer, max_mobiles, require_key_and_secret, require_template,
};
use crate::transformers::{ResponseHandlerConfig, SmsTransformer, TransformContext};
use crate::types::{HttpRequestSpec, Message};
use crate::utils::clock::format_china;
use crate::utils::phone::with_bare_prefix;
use crate::utils::sign::{base64_encode, md5_hex};

use super::{require_domestic, require_single, verification_code};

pub const PROVIDER: &str = "yuntongxun";

pub const DEFAULT_ENDPOINT: &str = "https://app.cloopen.com:8883";

const API_VERSION: &str = "2013-12-26";
const MAX_MOBILES: usize = 200;

const RESPONSE: ResponseHandlerConfig =
    ResponseHandlerConfig::json_eq("statusCode", "000000").with_message_path("statusMsg");

pub fn transformer() -> Arc<dyn SmsTransformer> {
    Arc::new(
        BaseTransformer::new(PROVIDER, RESPONSE)
            .with_before_hook(require_key_and_secret(PROVIDER))
            .with_before_hook(require_app_id)
            .with_before_hook(max_mobiles(PROVIDER, MAX_MOBILES))
            .with_sms_handler(build_sms)
            .with_voice_handler(build_voice),
    )
}

fn require_app_id(_msg: &Message, account: &Account) -> Result<(), SmsError> {
    if account.app_id.is_empty() {
        return Err(SmsError::auth(PROVIDER, "app_id is required"));
    }
    Ok(())
}

/// Upper-case md5 of `sid + token + timestamp`.
pub fn sig(sid: &str, token: &str, timestamp: &str) -> String {
    md5_hex(format!("{sid}{token}{timestamp}")).to_uppercase()
}

fn request(
    ctx: &TransformContext,
    account: &Account,
    resource: &str,
    body: &serde_json::Value,
) -> Result<HttpRequestSpec, SmsError> {
    let sid = account.api_key.as_str();
    let timestamp = format_china(ctx.now(), "%Y%m%d%H%M%S");
    let base = account.endpoint_or(DEFAULT_ENDPOINT);
    HttpRequestSpec::post(format!("{base}/{API_VERSION}/Accounts/{sid}/{resource}"))
        .query("sig", sig(sid, account.secret(), &timestamp))
        .header("Accept", "application/json")
        .header("Content-Type", "application/json;charset=utf-8")
        .header("Authorization", base64_encode(format!("{sid}:{timestamp}")))
        .json(body)
}

fn build_sms(
    ctx: &TransformContext,
    msg: &Message,
    account: &Account,
) -> Result<HttpRequestSpec, SmsError> {
    require_template(PROVIDER)(msg, account)?;
    // international numbers are dialled as 00<country code><number>
    let to = if msg.is_intl() {
        let code = msg.country_code();
        msg.mobiles
            .iter()
            .map(|m| format!("00{}", with_bare_prefix(code, m)))
            .collect::<Vec<_>>()
            .join(",")
    } else {
        msg.joined_mobiles(",")
    };
    let body = json!({
        "to": to,
        "appId": account.app_id,
        "templateId": msg.template_id,
        "datas": msg.positional_params(),
    });
    request(ctx, account, "SMS/TemplateSMS", &body)
}

fn build_voice(
    ctx: &TransformContext,
    msg: &Message,
    account: &Account,
) -> Result<HttpRequestSpec, SmsError> {
    require_domestic(PROVIDER, msg, "voice")?;
    require_single(PROVIDER, msg, "voice")?;
    let mut body = json!({
        "appId": account.app_id,
        "verifyCode": verification_code(PROVIDER, msg)?,
        "to": msg.mobiles[0],
        "playTimes": msg.extra_i64("play_times").unwrap_or(2).to_string(),
    });
    if !account.from.is_empty() {
        body["displayNum"] = json!(account.from);
    }
    let callback = if msg.callback_url.is_empty() {
        account.callback.as_str()
    } else {
        msg.callback_url.as_str()
    };
    if !callback.is_empty() {
        body["respUrl"] = json!(callback);
    }
    request(ctx, account, "Calls/VoiceVerify", &body)
}
