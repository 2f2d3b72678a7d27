//! Tencent Cloud SMS (v5 API) and template voice.
//!
//! `sdkappid` and `random` travel in the query string; the JSON body carries
//! `sig = sha256("appkey=..&random=..&time=..&mobile=..")`.

use std::sync::Arc;

use serde_json::{Value, json};

use crate::config::Account;
use crate::error::SmsError;
use crate::transformers::base::{BaseTransformer, max_mobiles};
use crate::transformers::{ResponseHandlerConfig, SmsTransformer, TransformContext};
use crate::types::{HttpRequestSpec, Message};
use crate::utils::sign::sha256_hex;

use super::{first_mobile, rendered_content, require_single};

pub const PROVIDER: &str = "tencent";

pub const DEFAULT_ENDPOINT: &str = "https://yun.tim.qq.com";
pub const VOICE_ENDPOINT: &str = "https://cloud.tim.qq.com";

const MAX_MOBILES: usize = 200;

/// Frequency-limit codes.
const RETRYABLE_CODES: &[&str] = &["1023", "1024", "1025"];

const RESPONSE: ResponseHandlerConfig = ResponseHandlerConfig::json_eq("result", "0")
    .with_message_path("errmsg")
    .with_retryable_codes(RETRYABLE_CODES);

pub fn transformer() -> Arc<dyn SmsTransformer> {
    Arc::new(
        BaseTransformer::new(PROVIDER, RESPONSE)
            .with_before_hook(require_credentials)
            .with_before_hook(max_mobiles(PROVIDER, MAX_MOBILES))
            .with_sms_handler(build_sms)
            .with_voice_handler(build_voice),
    )
}

/// `app_id` is the SDK AppID; `api_key` is accepted in its place.
fn sdk_app_id(account: &Account) -> &str {
    if account.app_id.is_empty() {
        &account.api_key
    } else {
        &account.app_id
    }
}

fn require_credentials(_msg: &Message, account: &Account) -> Result<(), SmsError> {
    if sdk_app_id(account).is_empty() || account.secret().is_empty() {
        return Err(SmsError::auth(PROVIDER, "sdk app id and app key are required"));
    }
    Ok(())
}

fn sign(app_key: &str, random: u64, time: i64, mobiles: &str) -> String {
    sha256_hex(format!(
        "appkey={app_key}&random={random}&time={time}&mobile={mobiles}"
    ))
}

fn tel(msg: &Message, mobile: &str) -> Value {
    json!({
        "nationcode": msg.country_code().to_string(),
        "mobile": mobile,
    })
}

fn build_sms(
    ctx: &TransformContext,
    msg: &Message,
    account: &Account,
) -> Result<HttpRequestSpec, SmsError> {
    let random = ctx.nonce_number();
    let time = ctx.now().timestamp();
    let mobiles = msg.joined_mobiles(",");

    let (path, tel) = if msg.is_batch() {
        let all: Vec<Value> = msg.mobiles.iter().map(|m| tel(msg, m)).collect();
        ("/v5/tlssmssvr/sendmultisms2", Value::Array(all))
    } else {
        ("/v5/tlssmssvr/sendsms", tel(msg, first_mobile(PROVIDER, msg)?))
    };

    let mut body = json!({
        "tel": tel,
        "sig": sign(account.secret(), random, time, &mobiles),
        "time": time,
        "extend": msg.extend,
        "ext": msg.uid,
    });
    if msg.has_template() {
        let tpl_id: u64 = msg.template_id.parse().map_err(|_| {
            SmsError::invalid(PROVIDER, format!("template_id '{}' is not numeric", msg.template_id))
        })?;
        body["tpl_id"] = json!(tpl_id);
        body["params"] = json!(msg.positional_params());
        body["sign"] = json!(msg.sign_name);
    } else {
        body["type"] = json!(msg.extra_i64("msg_type").unwrap_or(0));
        body["msg"] = json!(rendered_content(PROVIDER, msg)?);
    }

    HttpRequestSpec::post(format!("{}{path}", account.endpoint_or(DEFAULT_ENDPOINT)))
        .query("sdkappid", sdk_app_id(account))
        .query("random", random.to_string())
        .json(&body)
}

fn build_voice(
    ctx: &TransformContext,
    msg: &Message,
    account: &Account,
) -> Result<HttpRequestSpec, SmsError> {
    require_single(PROVIDER, msg, "voice")?;
    if !msg.has_template() {
        return Err(SmsError::invalid(PROVIDER, "voice requires a template_id"));
    }
    let tpl_id: u64 = msg.template_id.parse().map_err(|_| {
        SmsError::invalid(PROVIDER, format!("template_id '{}' is not numeric", msg.template_id))
    })?;
    let random = ctx.nonce_number();
    let time = ctx.now().timestamp();
    let body = json!({
        "tel": tel(msg, &msg.mobiles[0]),
        "tpl_id": tpl_id,
        "params": msg.positional_params(),
        "playtimes": msg.extra_i64("play_times").unwrap_or(2),
        "sig": sign(account.secret(), random, time, &msg.mobiles[0]),
        "time": time,
        "ext": msg.uid,
    });
    HttpRequestSpec::post(format!("{VOICE_ENDPOINT}/v5/tlsvoicesvr/sendtvoice"))
        .query("sdkappid", sdk_app_id(account))
        .query("random", random.to_string())
        .json(&body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::test_support::fixed_ctx;
    use crate::types::SendResult;

    fn account() -> Account {
        Account::new("tx", PROVIDER)
            .with_app_id("1400000000")
            .with_api_secret("appkey")
    }

    #[test]
    fn template_sms_carries_sig_and_query() {
        let msg = Message::builder(PROVIDER)
            .mobile("13800138000")
            .sign_name("Acme")
            .template_id("12345")
            .params_order(["1234", "5"])
            .build();
        let (spec, _) = transformer().transform(&fixed_ctx(), &msg, &account()).unwrap();
        assert_eq!(spec.url, "https://yun.tim.qq.com/v5/tlssmssvr/sendsms");
        assert_eq!(spec.query_value("sdkappid"), Some("1400000000"));
        assert_eq!(spec.query_value("random"), Some("123456"));

        let body = spec.json_body().unwrap();
        assert_eq!(body["tel"]["nationcode"], "86");
        assert_eq!(body["tel"]["mobile"], "13800138000");
        assert_eq!(body["tpl_id"], 12345);
        assert_eq!(body["params"], json!(["1234", "5"]));
        assert_eq!(body["time"], 1_700_000_000);
        assert_eq!(
            body["sig"],
            "1a56bd8b4d51e0782bf363689c841546fbbb7ee6c58cf9b505f44d7a3e36ffdc"
        );
    }

    #[test]
    fn batch_uses_multi_endpoint() {
        let msg = Message::builder(PROVIDER)
            .mobiles(["13800138000", "13900139000"])
            .template_id("1")
            .build();
        let (spec, _) = transformer().transform(&fixed_ctx(), &msg, &account()).unwrap();
        assert!(spec.url.ends_with("/sendmultisms2"));
        let body = spec.json_body().unwrap();
        assert_eq!(body["tel"].as_array().map(Vec::len), Some(2));
        assert_eq!(
            body["sig"],
            sign("appkey", 123_456, 1_700_000_000, "13800138000,13900139000")
        );
    }

    #[test]
    fn free_text_and_bad_template() {
        let msg = Message::builder(PROVIDER)
            .mobile("13800138000")
            .content("hello")
            .build();
        let (spec, _) = transformer().transform(&fixed_ctx(), &msg, &account()).unwrap();
        let body = spec.json_body().unwrap();
        assert_eq!(body["msg"], "hello");
        assert_eq!(body["type"], 0);

        let bad = Message::builder(PROVIDER)
            .mobile("13800138000")
            .template_id("SMS_x")
            .build();
        let err = transformer()
            .transform(&fixed_ctx(), &bad, &account())
            .err()
            .expect("transform should fail");
        assert_eq!(err.code(), "invalid_message");
    }

    #[test]
    fn voice_template_call() {
        let msg = Message::builder(PROVIDER)
            .voice()
            .mobile("13800138000")
            .template_id("77")
            .param("code", "1234")
            .build();
        let (spec, _) = transformer().transform(&fixed_ctx(), &msg, &account()).unwrap();
        assert_eq!(spec.url, "https://cloud.tim.qq.com/v5/tlsvoicesvr/sendtvoice");
        assert_eq!(spec.json_body().unwrap()["playtimes"], 2);
    }

    #[test]
    fn frequency_limits_are_retryable() {
        let handler = transformer()
            .transform(
                &fixed_ctx(),
                &Message::builder(PROVIDER).mobile("1").content("x").build(),
                &account(),
            )
            .unwrap()
            .1;
        assert!(handler(&SendResult::new(200, r#"{"result":0,"errmsg":"OK"}"#)).is_ok());
        let err =
            handler(&SendResult::new(200, r#"{"result":1024,"errmsg":"too often"}"#)).unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(err.vendor_code(), Some("1024"));
        let err = handler(&SendResult::new(200, r#"{"result":1014,"errmsg":"bad sign"}"#))
            .unwrap_err();
        assert!(!err.is_retryable());
    }
}
