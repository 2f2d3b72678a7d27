//! Aliyun (Alibaba Cloud) SMS and voice.
//!
//! Every call is an RPC-style form POST signed with HMAC-SHA1 over the
//! sorted, percent-encoded parameters (`SignatureVersion=1.0`).

use std::sync::Arc;

use crate::config::Account;
use crate::error::SmsError;
use crate::transformers::base::{BaseTransformer, max_mobiles, require_key_and_secret};
use crate::transformers::{ResponseHandlerConfig, SmsTransformer, TransformContext};
use crate::types::{FormParams, HttpRequestSpec, Message};
use crate::utils::clock::iso8601_utc;
use crate::utils::phone::with_bare_prefix;
use crate::utils::sign::{hmac_sha1_base64, percent_encode};

use super::{params_json, require_domestic, require_single};

pub const PROVIDER: &str = "aliyun";

pub const DEFAULT_ENDPOINT: &str = "https://dysmsapi.aliyuncs.com";
pub const DEFAULT_INTL_ENDPOINT: &str = "https://dysmsapi.ap-southeast-1.aliyuncs.com";
pub const VOICE_ENDPOINT: &str = "https://dyvmsapi.aliyuncs.com";

const DEFAULT_REGION: &str = "cn-hangzhou";
const INTL_REGION: &str = "ap-southeast-1";
const MAX_MOBILES: usize = 1000;

const RETRYABLE_CODES: &[&str] = &["isv.BUSINESS_LIMIT_CONTROL", "isp.SYSTEM_ERROR"];

const RESPONSE: ResponseHandlerConfig = ResponseHandlerConfig::json_eq("Code", "OK")
    .with_message_path("Message")
    .with_retryable_codes(RETRYABLE_CODES);

pub fn transformer() -> Arc<dyn SmsTransformer> {
    Arc::new(
        BaseTransformer::new(PROVIDER, RESPONSE)
            .with_before_hook(require_key_and_secret(PROVIDER))
            .with_before_hook(max_mobiles(PROVIDER, MAX_MOBILES))
            .with_sms_handler(build_sms)
            .with_voice_handler(build_voice),
    )
}

fn build_sms(
    ctx: &TransformContext,
    msg: &Message,
    account: &Account,
) -> Result<HttpRequestSpec, SmsError> {
    if msg.is_intl() {
        return build_intl(ctx, msg, account);
    }
    if msg.template_id.is_empty() {
        return Err(SmsError::invalid(PROVIDER, "template_id is required"));
    }
    if msg.sign_name.is_empty() {
        return Err(SmsError::invalid(PROVIDER, "sign_name is required"));
    }

    let mut params = common_params(ctx, account, "SendSms", "2017-05-25", region(account))
        .push("PhoneNumbers", msg.joined_mobiles(","))
        .push("SignName", msg.sign_name.as_str())
        .push("TemplateCode", msg.template_id.as_str())
        .push_non_empty("SmsUpExtendCode", &msg.extend)
        .push_non_empty("OutId", &msg.uid);
    if !msg.template_params.is_empty() {
        params = params.push("TemplateParam", params_json(msg)?);
    }
    signed_post(account.endpoint_or(DEFAULT_ENDPOINT), params, account)
}

fn build_intl(
    ctx: &TransformContext,
    msg: &Message,
    account: &Account,
) -> Result<HttpRequestSpec, SmsError> {
    require_single(PROVIDER, msg, "international sms")?;
    if msg.content.is_empty() {
        return Err(SmsError::invalid(
            PROVIDER,
            "international sms requires content",
        ));
    }
    let params = common_params(ctx, account, "SendMessageToGlobe", "2018-05-01", INTL_REGION)
        .push("To", with_bare_prefix(msg.country_code(), &msg.mobiles[0]))
        .push("Message", msg.content.as_str())
        .push_non_empty("From", &account.from);
    signed_post(
        account.intl_endpoint_or(DEFAULT_INTL_ENDPOINT),
        params,
        account,
    )
}

fn build_voice(
    ctx: &TransformContext,
    msg: &Message,
    account: &Account,
) -> Result<HttpRequestSpec, SmsError> {
    require_domestic(PROVIDER, msg, "voice")?;
    require_single(PROVIDER, msg, "voice")?;
    if msg.template_id.is_empty() {
        return Err(SmsError::invalid(PROVIDER, "voice requires a TTS template_id"));
    }
    let mut params = common_params(ctx, account, "SingleCallByTts", "2017-05-25", region(account))
        .push("CalledNumber", msg.mobiles[0].as_str())
        .push("TtsCode", msg.template_id.as_str())
        .push_non_empty("CalledShowNumber", &account.from)
        .push_non_empty("OutId", &msg.uid);
    if !msg.template_params.is_empty() {
        params = params.push("TtsParam", params_json(msg)?);
    }
    if let Some(times) = msg.extra_i64("play_times") {
        params = params.push("PlayTimes", times.to_string());
    }
    signed_post(VOICE_ENDPOINT, params, account)
}

fn region(account: &Account) -> &str {
    if account.region.is_empty() {
        DEFAULT_REGION
    } else {
        &account.region
    }
}

fn common_params(
    ctx: &TransformContext,
    account: &Account,
    action: &str,
    version: &str,
    region: &str,
) -> FormParams {
    FormParams::new()
        .push("AccessKeyId", account.api_key.as_str())
        .push("Action", action)
        .push("Format", "JSON")
        .push("RegionId", region)
        .push("SignatureMethod", "HMAC-SHA1")
        .push("SignatureNonce", ctx.nonce_token())
        .push("SignatureVersion", "1.0")
        .push("Timestamp", iso8601_utc(ctx.now()))
        .push("Version", version)
}

/// `Signature` for `params` under `secret`.
pub fn signature(params: &FormParams, secret: &str) -> Result<String, SmsError> {
    let canonical = params
        .clone()
        .sorted()
        .iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join("&");
    let string_to_sign = format!("POST&{}&{}", percent_encode("/"), percent_encode(&canonical));
    hmac_sha1_base64(format!("{secret}&"), string_to_sign)
}

fn signed_post(
    endpoint: &str,
    params: FormParams,
    account: &Account,
) -> Result<HttpRequestSpec, SmsError> {
    let params = params.sorted();
    let sig = signature(&params, account.secret())?;
    let params = params.push("Signature", sig);
    Ok(HttpRequestSpec::post(format!("{endpoint}/")).form(&params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::test_support::fixed_ctx;
    use crate::types::{Category, SendResult};

    fn account() -> Account {
        Account::new("ali", PROVIDER)
            .with_api_key("testId")
            .with_api_secret("testSecret")
    }

    fn verification() -> Message {
        Message::builder(PROVIDER)
            .category(Category::Verification)
            .mobile("13800138000")
            .sign_name("Acme")
            .template_id("SMS_1")
            .param("code", "1234")
            .build()
    }

    #[test]
    fn domestic_send_sms_is_signed() {
        let (spec, _) = transformer()
            .transform(&fixed_ctx(), &verification(), &account())
            .unwrap();
        assert_eq!(spec.method, reqwest::Method::POST);
        assert_eq!(spec.url, "https://dysmsapi.aliyuncs.com/");
        assert_eq!(spec.form_value("Action").as_deref(), Some("SendSms"));
        assert_eq!(spec.form_value("PhoneNumbers").as_deref(), Some("13800138000"));
        assert_eq!(spec.form_value("SignName").as_deref(), Some("Acme"));
        assert_eq!(spec.form_value("TemplateCode").as_deref(), Some("SMS_1"));
        assert_eq!(
            spec.form_value("TemplateParam").as_deref(),
            Some(r#"{"code":"1234"}"#)
        );
        assert_eq!(spec.form_value("SignatureNonce").as_deref(), Some("nonce-1"));
        assert_eq!(
            spec.form_value("Timestamp").as_deref(),
            Some("2023-11-14T22:13:20Z")
        );
        assert_eq!(
            spec.form_value("Signature").as_deref(),
            Some("1o/SbO5PYhT70nRPa1mVdao8q+8=")
        );
    }

    #[test]
    fn signature_is_stable_for_identical_input() {
        let ctx = fixed_ctx();
        let a = transformer().transform(&ctx, &verification(), &account()).unwrap().0;
        let b = transformer().transform(&ctx, &verification(), &account()).unwrap().0;
        assert_eq!(a.body, b.body);
    }

    #[test]
    fn endpoint_override_is_used() {
        let acc = account().with_endpoint("http://127.0.0.1:9999/");
        let (spec, _) = transformer().transform(&fixed_ctx(), &verification(), &acc).unwrap();
        assert_eq!(spec.url, "http://127.0.0.1:9999/");
    }

    #[test]
    fn domestic_requires_sign_name() {
        let mut msg = verification();
        msg.sign_name.clear();
        let err = transformer()
            .transform(&fixed_ctx(), &msg, &account())
            .err()
            .expect("transform should fail");
        assert_eq!(err.code(), "invalid_message");
        assert_eq!(err.provider(), PROVIDER);
    }

    #[test]
    fn international_uses_globe_api() {
        let msg = Message::builder(PROVIDER)
            .mobile("5551234567")
            .region_code(1)
            .content("hello")
            .build();
        let (spec, _) = transformer().transform(&fixed_ctx(), &msg, &account()).unwrap();
        assert_eq!(spec.url, "https://dysmsapi.ap-southeast-1.aliyuncs.com/");
        assert_eq!(spec.form_value("Action").as_deref(), Some("SendMessageToGlobe"));
        assert_eq!(spec.form_value("To").as_deref(), Some("15551234567"));
        assert_eq!(spec.form_value("Message").as_deref(), Some("hello"));
    }

    #[test]
    fn voice_is_tts_call() {
        let msg = Message::builder(PROVIDER)
            .voice()
            .mobile("13800138000")
            .template_id("TTS_1")
            .param("code", "1234")
            .extra("play_times", 2)
            .build();
        let (spec, _) = transformer().transform(&fixed_ctx(), &msg, &account()).unwrap();
        assert_eq!(spec.url, "https://dyvmsapi.aliyuncs.com/");
        assert_eq!(spec.form_value("Action").as_deref(), Some("SingleCallByTts"));
        assert_eq!(spec.form_value("CalledNumber").as_deref(), Some("13800138000"));
        assert_eq!(spec.form_value("PlayTimes").as_deref(), Some("2"));

        let intl = Message::builder(PROVIDER)
            .voice()
            .mobile("5551234567")
            .region_code(1)
            .template_id("TTS_1")
            .build();
        let err = transformer()
            .transform(&fixed_ctx(), &intl, &account())
            .err()
            .expect("transform should fail");
        assert_eq!(err.code(), "unsupported_international");
    }

    #[test]
    fn missing_credentials_is_auth_error() {
        let err = transformer()
            .transform(&fixed_ctx(), &verification(), &Account::new("a", PROVIDER))
            .err()
            .expect("transform should fail");
        assert_eq!(err.code(), "auth_error");
    }

    #[test]
    fn response_handling() {
        let (_, handler) = transformer()
            .transform(&fixed_ctx(), &verification(), &account())
            .unwrap();
        assert!(handler(&SendResult::new(200, r#"{"Code":"OK","BizId":"1"}"#)).is_ok());

        let err = handler(&SendResult::new(
            200,
            r#"{"Code":"isv.BUSINESS_LIMIT_CONTROL","Message":"throttled"}"#,
        ))
        .unwrap_err();
        assert_eq!(err.code(), "provider_error");
        assert_eq!(err.vendor_code(), Some("isv.BUSINESS_LIMIT_CONTROL"));
        assert_eq!(err.message(), "throttled");
        assert!(err.is_retryable());

        let err = handler(&SendResult::new(
            200,
            r#"{"Code":"isv.MOBILE_NUMBER_ILLEGAL","Message":"bad number"}"#,
        ))
        .unwrap_err();
        assert!(!err.is_retryable());
    }
}
