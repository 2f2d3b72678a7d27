//! Huawei Cloud SMS (`batchSendSms/v1`).
//!
//! Authenticated with WSSE UsernameToken headers:
//! `PasswordDigest = base64(sha256(nonce + created + app_secret))`.

use std::sync::Arc;

use crate::config::Account;
use crate::error::SmsError;
use crate::transformers::base::{
    BaseTransformer, max_mobiles, require_key_and_secret, require_template,
};
use crate::transformers::{ResponseHandlerConfig, SmsTransformer, TransformContext};
use crate::types::{FormParams, HttpRequestSpec, Message};
use crate::utils::clock::iso8601_utc;
use crate::utils::phone::with_plus_prefix;
use crate::utils::sign::sha256_base64;

pub const PROVIDER: &str = "huawei";

pub const DEFAULT_ENDPOINT: &str = "https://smsapi.cn-north-4.myhuaweicloud.com:443";
pub const DEFAULT_INTL_ENDPOINT: &str = "https://smsapi.ap-southeast-1.myhuaweicloud.com:443";

const SEND_PATH: &str = "/sms/batchSendSms/v1";
const MAX_MOBILES: usize = 1000;

const AUTHORIZATION: &str = r#"WSSE realm="SDP",profile="UsernameToken",type="Appkey""#;

const RESPONSE: ResponseHandlerConfig =
    ResponseHandlerConfig::json_eq("code", "000000").with_message_path("description");

pub fn transformer() -> Arc<dyn SmsTransformer> {
    Arc::new(
        BaseTransformer::new(PROVIDER, RESPONSE)
            .with_before_hook(require_key_and_secret(PROVIDER))
            .with_before_hook(require_template(PROVIDER))
            .with_before_hook(max_mobiles(PROVIDER, MAX_MOBILES))
            .with_sms_handler(build_sms),
    )
}

/// `X-WSSE` header value.
pub fn wsse_header(app_key: &str, app_secret: &str, nonce: &str, created: &str) -> String {
    let digest = sha256_base64(format!("{nonce}{created}{app_secret}"));
    format!(
        r#"UsernameToken Username="{app_key}",PasswordDigest="{digest}",Nonce="{nonce}",Created="{created}""#
    )
}

fn build_sms(
    ctx: &TransformContext,
    msg: &Message,
    account: &Account,
) -> Result<HttpRequestSpec, SmsError> {
    if account.from.is_empty() {
        return Err(SmsError::invalid(
            PROVIDER,
            "account 'from' (sender channel number) is required",
        ));
    }
    let code = msg.country_code();
    let to = msg
        .mobiles
        .iter()
        .map(|m| with_plus_prefix(code, m))
        .collect::<Vec<_>>()
        .join(",");
    let callback = if msg.callback_url.is_empty() {
        account.callback.as_str()
    } else {
        msg.callback_url.as_str()
    };

    let positional = msg.positional_params();
    let mut params = FormParams::new()
        .push("from", account.from.as_str())
        .push("to", to)
        .push("templateId", msg.template_id.as_str());
    if !positional.is_empty() {
        params = params.push("templateParas", serde_json::to_string(&positional)?);
    }
    params = params
        .push_non_empty("statusCallback", callback)
        .push_non_empty("extend", &msg.extend);
    // signature names apply to mainland China templates only
    if msg.is_domestic() {
        params = params.push_non_empty("signature", &msg.sign_name);
    }

    let base = if msg.is_intl() {
        account.intl_endpoint_or(DEFAULT_INTL_ENDPOINT)
    } else {
        account.endpoint_or(DEFAULT_ENDPOINT)
    };
    let created = iso8601_utc(ctx.now());
    let nonce = ctx.nonce_token();

    Ok(HttpRequestSpec::post(format!("{base}{SEND_PATH}"))
        .header("Authorization", AUTHORIZATION)
        .header(
            "X-WSSE",
            wsse_header(&account.api_key, account.secret(), &nonce, &created),
        )
        .form(&params))
}
