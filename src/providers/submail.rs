//! Submail SMS, voice and MMS.
//!
//! SMS picks one of eight paths from {international, template, batch}.
//! Requests are form posts signed over the sorted parameters.

use std::sync::Arc;

use serde_json::{Value, json};

use crate::config::Account;
use crate::error::SmsError;
use crate::transformers::base::{BaseTransformer, require_key_and_secret};
use crate::transformers::{ResponseHandlerConfig, SmsTransformer, TransformContext};
use crate::types::{FormParams, HttpRequestSpec, Message};
use crate::utils::phone::with_plus_prefix;
use crate::utils::sign::{md5_hex, sha1_hex};

use super::{params_json, require_domestic, require_single, with_sign_prefix};

pub const PROVIDER: &str = "submail";

pub const DEFAULT_ENDPOINT: &str = "https://api-v4.mysubmail.com";

/// Parameters left out of the signed string.
const UNSIGNED: [&str; 3] = ["signature", "sign_type", "sign_version"];

const RESPONSE: ResponseHandlerConfig = ResponseHandlerConfig::json_eq("status", "success")
    .with_code_path("code")
    .with_message_path("msg");

pub fn transformer() -> Arc<dyn SmsTransformer> {
    Arc::new(
        BaseTransformer::new(PROVIDER, RESPONSE)
            .with_before_hook(require_key_and_secret(PROVIDER))
            .with_sms_handler(build_sms)
            .with_voice_handler(build_voice)
            .with_mms_handler(build_mms),
    )
}

/// SMS path for the {international, template, batch} combination.
pub const fn route(intl: bool, template: bool, batch: bool) -> &'static str {
    match (intl, template, batch) {
        (false, false, false) => "/sms/send",
        (false, true, false) => "/sms/xsend",
        (false, false, true) => "/sms/multisend",
        (false, true, true) => "/sms/multixsend",
        (true, false, false) => "/internationalsms/send",
        (true, true, false) => "/internationalsms/xsend",
        (true, false, true) => "/internationalsms/batchsend",
        (true, true, true) => "/internationalsms/multixsend",
    }
}

/// How the `signature` parameter is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignType {
    Md5,
    Sha1,
    /// The app key itself is sent.
    Normal,
}

impl SignType {
    /// From the `sign_type` extra; anything unrecognised means md5.
    pub fn from_message(msg: &Message) -> Self {
        match msg.extra_str("sign_type").map(str::to_ascii_lowercase).as_deref() {
            Some("sha1") => Self::Sha1,
            Some("normal") => Self::Normal,
            _ => Self::Md5,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Normal => "normal",
        }
    }
}

/// Signature over every parameter except `signature`, `sign_type` and
/// `sign_version`, sorted by key, with the app key appended.
pub fn signature(params: &FormParams, app_key: &str, sign_type: SignType) -> String {
    if sign_type == SignType::Normal {
        return app_key.to_string();
    }
    let joined = params
        .clone()
        .sorted()
        .iter()
        .filter(|(k, _)| !UNSIGNED.contains(k))
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    let plain = format!("{joined}{app_key}");
    match sign_type {
        SignType::Sha1 => sha1_hex(plain),
        _ => md5_hex(plain),
    }
}

fn mobiles(msg: &Message) -> Vec<String> {
    if msg.is_intl() {
        let code = msg.country_code();
        msg.mobiles.iter().map(|m| with_plus_prefix(code, m)).collect()
    } else {
        msg.mobiles.clone()
    }
}

fn content(msg: &Message) -> Result<String, SmsError> {
    if msg.content.is_empty() {
        return Err(SmsError::invalid(
            PROVIDER,
            "content is required without a template (project)",
        ));
    }
    Ok(with_sign_prefix(&msg.sign_name, &msg.content))
}

fn build_sms(
    ctx: &TransformContext,
    msg: &Message,
    account: &Account,
) -> Result<HttpRequestSpec, SmsError> {
    let intl = msg.is_intl();
    let template = msg.has_template();
    let batch = msg.is_batch();
    let to = mobiles(msg);

    let params = FormParams::new();
    let params = match (template, batch) {
        (false, false) => params.push("to", to.join(",")).push("content", content(msg)?),
        (true, false) => params
            .push("to", to.join(","))
            .push("project", msg.template_id.as_str())
            .push("vars", params_json(msg)?),
        (false, true) if intl => params.push("to", to.join(",")).push("content", content(msg)?),
        (false, true) => {
            let multi: Vec<Value> = to.iter().map(|m| json!({ "to": m })).collect();
            params
                .push("content", content(msg)?)
                .push("multi", serde_json::to_string(&multi)?)
        }
        (true, true) => {
            let multi: Vec<Value> = to
                .iter()
                .map(|m| json!({ "to": m, "vars": msg.template_params }))
                .collect();
            params
                .push("project", msg.template_id.as_str())
                .push("multi", serde_json::to_string(&multi)?)
        }
    };

    let base = if intl {
        account.intl_endpoint_or(account.endpoint_or(DEFAULT_ENDPOINT))
    } else {
        account.endpoint_or(DEFAULT_ENDPOINT)
    };
    signed_post(ctx, msg, account, base, route(intl, template, batch), params)
}

fn build_voice(
    ctx: &TransformContext,
    msg: &Message,
    account: &Account,
) -> Result<HttpRequestSpec, SmsError> {
    require_domestic(PROVIDER, msg, "voice")?;
    require_single(PROVIDER, msg, "voice")?;
    let (path, params) = if msg.has_template() {
        let params = FormParams::new()
            .push("to", msg.mobiles[0].as_str())
            .push("project", msg.template_id.as_str())
            .push("vars", params_json(msg)?);
        ("/voice/xsend", params)
    } else {
        let params = FormParams::new()
            .push("to", msg.mobiles[0].as_str())
            .push("content", content(msg)?);
        ("/voice/send", params)
    };
    signed_post(ctx, msg, account, account.endpoint_or(DEFAULT_ENDPOINT), path, params)
}

fn build_mms(
    ctx: &TransformContext,
    msg: &Message,
    account: &Account,
) -> Result<HttpRequestSpec, SmsError> {
    require_domestic(PROVIDER, msg, "mms")?;
    require_single(PROVIDER, msg, "mms")?;
    if !msg.has_template() {
        return Err(SmsError::invalid(PROVIDER, "mms requires a template (project)"));
    }
    let params = FormParams::new()
        .push("to", msg.mobiles[0].as_str())
        .push("project", msg.template_id.as_str())
        .push("vars", params_json(msg)?);
    signed_post(
        ctx,
        msg,
        account,
        account.endpoint_or(DEFAULT_ENDPOINT),
        "/mms/xsend",
        params,
    )
}

fn signed_post(
    ctx: &TransformContext,
    msg: &Message,
    account: &Account,
    base: &str,
    path: &str,
    params: FormParams,
) -> Result<HttpRequestSpec, SmsError> {
    let sign_type = SignType::from_message(msg);
    let params = params
        .push("appid", account.api_key.as_str())
        .push("timestamp", ctx.now().timestamp().to_string())
        .push("sign_type", sign_type.as_str())
        .push("sign_version", "2");
    let sig = signature(&params, account.secret(), sign_type);
    let params = params.push("signature", sig);
    Ok(HttpRequestSpec::post(format!("{base}{path}")).form(&params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::test_support::fixed_ctx;
    use crate::types::SendResult;

    fn account() -> Account {
        Account::new("sub", PROVIDER)
            .with_api_key("10001")
            .with_api_secret("appkey")
    }

    fn message(intl: bool, template: bool, batch: bool) -> Message {
        let mut b = Message::builder(PROVIDER).mobile("13800138000");
        if batch {
            b = b.mobile("13900139000");
        }
        if intl {
            b = b.region_code(44);
        }
        if template {
            b = b.template_id("XY123").param("code", "1234");
        } else {
            b = b.content("hello").sign_name("Acme");
        }
        b.build()
    }

    #[test]
    fn all_eight_routes() {
        let cases = [
            ((false, false, false), "/sms/send"),
            ((false, true, false), "/sms/xsend"),
            ((false, false, true), "/sms/multisend"),
            ((false, true, true), "/sms/multixsend"),
            ((true, false, false), "/internationalsms/send"),
            ((true, true, false), "/internationalsms/xsend"),
            ((true, false, true), "/internationalsms/batchsend"),
            ((true, true, true), "/internationalsms/multixsend"),
        ];
        for ((intl, template, batch), path) in cases {
            let msg = message(intl, template, batch);
            let (spec, _) = transformer().transform(&fixed_ctx(), &msg, &account()).unwrap();
            assert_eq!(
                spec.url,
                format!("https://api-v4.mysubmail.com{path}"),
                "intl={intl} template={template} batch={batch}"
            );
        }
    }

    #[test]
    fn single_send_body_and_signature() {
        let (spec, _) = transformer()
            .transform(&fixed_ctx(), &message(false, false, false), &account())
            .unwrap();
        assert_eq!(spec.form_value("to").as_deref(), Some("13800138000"));
        assert_eq!(spec.form_value("content").as_deref(), Some("【Acme】hello"));
        assert_eq!(spec.form_value("appid").as_deref(), Some("10001"));
        assert_eq!(spec.form_value("timestamp").as_deref(), Some("1700000000"));
        assert_eq!(spec.form_value("sign_type").as_deref(), Some("md5"));
        assert_eq!(
            spec.form_value("signature").as_deref(),
            Some("007c92dce25a7a1db77a5369ec6ea379")
        );
    }

    #[test]
    fn sign_types() {
        let params = FormParams::new()
            .push("to", "13800138000")
            .push("appid", "10001")
            .push("sign_type", "sha1")
            .push("content", "x");
        assert_eq!(
            signature(&params, "k", SignType::Sha1),
            sha1_hex("appid=10001&content=x&to=13800138000k")
        );
        assert_eq!(
            signature(&params, "k", SignType::Md5),
            md5_hex("appid=10001&content=x&to=13800138000k")
        );
        assert_eq!(signature(&params, "k", SignType::Normal), "k");

        let msg = Message::builder(PROVIDER).extra("sign_type", "SHA1").build();
        assert_eq!(SignType::from_message(&msg), SignType::Sha1);
    }

    #[test]
    fn template_batch_carries_multi_vars() {
        let (spec, _) = transformer()
            .transform(&fixed_ctx(), &message(false, true, true), &account())
            .unwrap();
        let multi: Value = serde_json::from_str(&spec.form_value("multi").unwrap()).unwrap();
        assert_eq!(multi[1]["to"], "13900139000");
        assert_eq!(multi[0]["vars"]["code"], "1234");
        assert_eq!(spec.form_value("project").as_deref(), Some("XY123"));
    }

    #[test]
    fn international_numbers_get_plus_prefix() {
        let (spec, _) = transformer()
            .transform(&fixed_ctx(), &message(true, false, true), &account())
            .unwrap();
        assert_eq!(
            spec.form_value("to").as_deref(),
            Some("+4413800138000,+4413900139000")
        );
    }

    #[test]
    fn voice_and_mms_are_single_recipient() {
        let voice = Message::builder(PROVIDER)
            .voice()
            .mobile("13800138000")
            .content("your code is 1234")
            .build();
        let (spec, _) = transformer().transform(&fixed_ctx(), &voice, &account()).unwrap();
        assert!(spec.url.ends_with("/voice/send"));

        let voice_tpl = Message::builder(PROVIDER)
            .voice()
            .mobile("13800138000")
            .template_id("V1")
            .build();
        let (spec, _) = transformer().transform(&fixed_ctx(), &voice_tpl, &account()).unwrap();
        assert!(spec.url.ends_with("/voice/xsend"));

        let mms = Message::builder(PROVIDER)
            .mms()
            .mobiles(["13800138000", "13900139000"])
            .template_id("M1")
            .build();
        let err = transformer()
            .transform(&fixed_ctx(), &mms, &account())
            .err()
            .expect("transform should fail");
        assert!(err.message().contains("single mobile"));

        let mms = Message::builder(PROVIDER)
            .mms()
            .mobile("13800138000")
            .template_id("M1")
            .build();
        let (spec, _) = transformer().transform(&fixed_ctx(), &mms, &account()).unwrap();
        assert!(spec.url.ends_with("/mms/xsend"));
    }

    #[test]
    fn failure_carries_code_and_msg() {
        let handler = RESPONSE.into_handler(PROVIDER);
        assert!(handler(&SendResult::new(200, r#"{"status":"success","send_id":"x"}"#)).is_ok());
        let err = handler(&SendResult::new(
            200,
            r#"{"status":"error","code":101,"msg":"Incorrect APP ID"}"#,
        ))
        .unwrap_err();
        assert_eq!(err.vendor_code(), Some("101"));
        assert_eq!(err.message(), "Incorrect APP ID");
    }
}
