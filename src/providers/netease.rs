//! Netease Yunxin SMS: template notices and verification codes.
//!
//! Headers carry `AppKey`, `Nonce`, `CurTime` and
//! `CheckSum = sha1(app_secret + nonce + cur_time)`.

use std::sync::Arc;

use crate::config::Account;
use crate::error::SmsError;
use crate::transformers::base::{BaseTransformer, max_mobiles, require_key_and_secret};
use crate::transformers::{ResponseHandlerConfig, SmsTransformer, TransformContext};
use crate::types::{Category, FormParams, HttpRequestSpec, Message};
use crate::utils::sign::sha1_hex;

use super::{require_domestic, require_verification};

pub const PROVIDER: &str = "netease";

pub const DEFAULT_ENDPOINT: &str = "https://api.netease.im";

const MAX_MOBILES: usize = 100;

const RESPONSE: ResponseHandlerConfig =
    ResponseHandlerConfig::json_eq("code", "200").with_message_path("msg");

pub fn transformer() -> Arc<dyn SmsTransformer> {
    Arc::new(
        BaseTransformer::new(PROVIDER, RESPONSE)
            .with_before_hook(require_key_and_secret(PROVIDER))
            .with_before_hook(max_mobiles(PROVIDER, MAX_MOBILES))
            .with_before_hook(|msg: &Message, _account: &Account| {
                require_domestic(PROVIDER, msg, "netease")
            })
            .with_sms_handler(build_sms),
    )
}

pub fn checksum(app_secret: &str, nonce: &str, cur_time: &str) -> String {
    sha1_hex(format!("{app_secret}{nonce}{cur_time}"))
}

/// Verification codes to a single number go through `sendcode.action`;
/// everything else is a template send.
fn uses_send_code(msg: &Message) -> bool {
    msg.category == Category::Verification && msg.mobiles.len() == 1
}

fn build_sms(
    ctx: &TransformContext,
    msg: &Message,
    account: &Account,
) -> Result<HttpRequestSpec, SmsError> {
    let base = account.endpoint_or(DEFAULT_ENDPOINT);
    let (url, params) = if uses_send_code(msg) {
        (format!("{base}/sms/sendcode.action"), send_code_params(msg)?)
    } else {
        if !msg.has_template() {
            return Err(SmsError::invalid(PROVIDER, "template_id is required"));
        }
        let params = FormParams::new()
            .push("templateid", msg.template_id.as_str())
            .push("mobiles", serde_json::to_string(&msg.mobiles)?)
            .push("params", serde_json::to_string(&msg.positional_params())?);
        (format!("{base}/sms/sendtemplate.action"), params)
    };

    let nonce = ctx.nonce_token();
    let cur_time = ctx.now().timestamp().to_string();
    Ok(HttpRequestSpec::post(url)
        .header("AppKey", account.api_key.as_str())
        .header("Nonce", nonce.as_str())
        .header("CurTime", cur_time.as_str())
        .header("CheckSum", checksum(account.secret(), &nonce, &cur_time))
        .header("Content-Type", "application/x-www-form-urlencoded;charset=utf-8")
        .form(&params))
}

fn send_code_params(msg: &Message) -> Result<FormParams, SmsError> {
    require_verification(PROVIDER, msg)?;
    let mut params = FormParams::new()
        .push("mobile", msg.mobiles[0].as_str())
        .push_non_empty("templateid", &msg.template_id);
    if let Some(code) = msg.template_params.get("code") {
        params = params.push("authCode", code.as_str());
    }
    if let Some(len) = msg.extra_i64("code_len") {
        params = params.push("codeLen", len.to_string());
    }
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::test_support::fixed_ctx;
    use crate::types::SendResult;

    fn account() -> Account {
        Account::new("nim", PROVIDER)
            .with_api_key("appkey")
            .with_api_secret("secret")
    }

    #[test]
    fn template_send_with_checksum_headers() {
        let msg = Message::builder(PROVIDER)
            .mobiles(["13800138000", "13900139000"])
            .template_id("3057527")
            .params_order(["Acme", "5"])
            .build();
        let (spec, _) = transformer().transform(&fixed_ctx(), &msg, &account()).unwrap();
        assert_eq!(spec.url, "https://api.netease.im/sms/sendtemplate.action");
        assert_eq!(
            spec.form_value("mobiles").as_deref(),
            Some(r#"["13800138000","13900139000"]"#)
        );
        assert_eq!(spec.form_value("params").as_deref(), Some(r#"["Acme","5"]"#));
        assert_eq!(spec.header_value("AppKey"), Some("appkey"));
        assert_eq!(spec.header_value("Nonce"), Some("nonce-1"));
        assert_eq!(spec.header_value("CurTime"), Some("1700000000"));
        assert_eq!(
            spec.header_value("CheckSum"),
            Some("2600652c14bc52e3bbfc1199aaf3afd087ecc4af")
        );
    }

    #[test]
    fn verification_uses_send_code() {
        let msg = Message::builder(PROVIDER)
            .category(Category::Verification)
            .mobile("13800138000")
            .param("code", "1234")
            .extra("code_len", 4)
            .build();
        let (spec, _) = transformer().transform(&fixed_ctx(), &msg, &account()).unwrap();
        assert_eq!(spec.url, "https://api.netease.im/sms/sendcode.action");
        assert_eq!(spec.form_value("authCode").as_deref(), Some("1234"));
        assert_eq!(spec.form_value("codeLen").as_deref(), Some("4"));
    }

    #[test]
    fn template_required_for_notices() {
        let msg = Message::builder(PROVIDER)
            .mobile("13800138000")
            .content("hi")
            .build();
        let err = transformer()
            .transform(&fixed_ctx(), &msg, &account())
            .err()
            .expect("transform should fail");
        assert_eq!(err.code(), "invalid_message");
    }

    #[test]
    fn numeric_code_200() {
        let handler = RESPONSE.into_handler(PROVIDER);
        assert!(handler(&SendResult::new(200, r#"{"code":200,"msg":"sendid","obj":1}"#)).is_ok());
        let err = handler(&SendResult::new(200, r#"{"code":416,"msg":"frequency limited"}"#))
            .unwrap_err();
        assert_eq!(err.vendor_code(), Some("416"));
        assert_eq!(err.message(), "frequency limited");
    }
}
