//! CL253 (Chuanglan) SMS.
//!
//! JSON posts with the account and password in the body. International
//! sends go to a separate host and take one recipient.

use std::sync::Arc;

use serde_json::{Value, json};

use crate::config::Account;
use crate::error::SmsError;
use crate::transformers::base::{BaseTransformer, max_mobiles, require_key_and_secret};
use crate::transformers::json_path::string_at;
use crate::transformers::{ResponseHandlerConfig, SmsTransformer, TransformContext};
use crate::types::{HttpRequestSpec, Message, SendResult};
use crate::utils::clock::format_china;
use crate::utils::phone::with_bare_prefix;

use super::{rendered_content, require_single, with_sign_prefix};

pub const PROVIDER: &str = "cl253";

pub const DEFAULT_ENDPOINT: &str = "https://smssh1.253.com";
pub const DEFAULT_INTL_ENDPOINT: &str = "https://intapi.253.com";

const MAX_MOBILES: usize = 1000;

pub fn transformer() -> Arc<dyn SmsTransformer> {
    Arc::new(
        BaseTransformer::new(PROVIDER, ResponseHandlerConfig::status_only())
            .with_custom_handler(check_response)
            .with_before_hook(require_key_and_secret(PROVIDER))
            .with_before_hook(max_mobiles(PROVIDER, MAX_MOBILES))
            .with_sms_handler(build_sms),
    )
}

/// Success is `"0"` under `status`, or under `code` on hosts that report it
/// there.
fn check_response(result: &SendResult) -> Result<(), SmsError> {
    let text = result.body_text();
    let json: Value = serde_json::from_str(&text).map_err(|e| {
        SmsError::provider_error(
            PROVIDER,
            "invalid_response",
            format!("response is not JSON ({e}): {text}"),
        )
    })?;
    let status = if json.get("status").is_some() {
        string_at(&json, "status")
    } else {
        string_at(&json, "code")
    };
    if status == "0" {
        return Ok(());
    }
    let message = ["errorMsg", "error", "msg"]
        .iter()
        .map(|path| string_at(&json, path))
        .find(|m| !m.is_empty())
        .unwrap_or(text);
    Err(SmsError::provider_error(PROVIDER, status, message))
}

fn build_sms(
    _ctx: &TransformContext,
    msg: &Message,
    account: &Account,
) -> Result<HttpRequestSpec, SmsError> {
    let text = with_sign_prefix(&msg.sign_name, &rendered_content(PROVIDER, msg)?);

    if msg.is_intl() {
        require_single(PROVIDER, msg, "international sms")?;
        let mut body = json!({
            "account": account.api_key,
            "password": account.secret(),
            "msg": text,
            "mobile": with_bare_prefix(msg.country_code(), &msg.mobiles[0]),
        });
        if !account.from.is_empty() {
            body["senderId"] = json!(account.from);
        }
        if !msg.uid.is_empty() {
            body["uid"] = json!(msg.uid);
        }
        let base = account.intl_endpoint_or(DEFAULT_INTL_ENDPOINT);
        return HttpRequestSpec::post(format!("{base}/send/json")).json(&body);
    }

    let mut body = json!({
        "account": account.api_key,
        "password": account.secret(),
        "msg": text,
        "phone": msg.joined_mobiles(","),
    });
    if let Some(at) = msg.scheduled_at {
        body["sendtime"] = json!(format_china(at, "%Y%m%d%H%M"));
    }
    if msg.extra_bool("report").unwrap_or(false) || !msg.callback_url.is_empty() {
        body["report"] = json!("true");
    }
    if !msg.extend.is_empty() {
        body["extend"] = json!(msg.extend);
    }
    if !msg.uid.is_empty() {
        body["uid"] = json!(msg.uid);
    }
    let base = account.endpoint_or(DEFAULT_ENDPOINT);
    HttpRequestSpec::post(format!("{base}/msg/v1/send/json")).json(&body)
}
