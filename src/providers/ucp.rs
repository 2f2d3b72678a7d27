//! UCPaaS (Yunzhixun) template SMS.

use std::sync::Arc;

use serde_json::json;

use crate::config::Account;
use crate::error::SmsError;
use crate::transformers::base::{
    BaseTransformer, max_mobiles, require_key_and_secret, require_template,
};
use crate::transformers::{ResponseHandlerConfig, SmsTransformer, TransformContext};
use crate::types::{HttpRequestSpec, Message};

pub const PROVIDER: &str = "ucp";

pub const DEFAULT_ENDPOINT: &str = "https://open.ucpaas.com";

const MAX_MOBILES: usize = 100;

/// v2 answers `"000000"`, v1 a numeric `0`.
const RESPONSE: ResponseHandlerConfig = ResponseHandlerConfig::json_eq("code", "000000")
    .or_json_eq(&[("code", "0")])
    .with_message_path("msg");

pub fn transformer() -> Arc<dyn SmsTransformer> {
    Arc::new(
        BaseTransformer::new(PROVIDER, RESPONSE)
            .with_before_hook(require_key_and_secret(PROVIDER))
            .with_before_hook(require_app_id)
            .with_before_hook(require_template(PROVIDER))
            .with_before_hook(max_mobiles(PROVIDER, MAX_MOBILES))
            .with_sms_handler(build_sms),
    )
}

fn require_app_id(_msg: &Message, account: &Account) -> Result<(), SmsError> {
    if account.app_id.is_empty() {
        return Err(SmsError::auth(PROVIDER, "app_id is required"));
    }
    Ok(())
}

fn build_sms(
    _ctx: &TransformContext,
    msg: &Message,
    account: &Account,
) -> Result<HttpRequestSpec, SmsError> {
    let action = if msg.is_batch() { "sendsms_batch" } else { "sendsms" };
    let body = json!({
        "sid": account.api_key,
        "token": account.secret(),
        "appid": account.app_id,
        "templateid": msg.template_id,
        "param": msg.positional_params().join(","),
        "mobile": msg.joined_mobiles(","),
        "uid": msg.uid,
    });
    let base = account.endpoint_or(DEFAULT_ENDPOINT);
    HttpRequestSpec::post(format!("{base}/ol/sms/{action}"))
        .header("Content-Type", "application/json;charset=utf-8")
        .json(&body)
}
