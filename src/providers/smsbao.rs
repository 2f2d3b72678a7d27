//! Smsbao SMS, international SMS and voice codes.
//!
//! Plain GET requests; the body is a bare status number where `0` means
//! accepted.

use std::sync::Arc;

use crate::config::Account;
use crate::error::SmsError;
use crate::transformers::base::{BaseTransformer, max_mobiles, require_key_and_secret};
use crate::transformers::{ResponseHandlerConfig, SmsTransformer, TransformContext};
use crate::types::{FormParams, HttpRequestSpec, Message};
use crate::utils::phone::{is_china_mobile, normalize_phone_number, with_plus_prefix};
use crate::utils::sign::md5_hex;

use super::{
    rendered_content, require_single, require_verification, verification_code, with_sign_prefix,
};

pub const PROVIDER: &str = "smsbao";

pub const DEFAULT_ENDPOINT: &str = "https://api.smsbao.com";

const MAX_MOBILES: usize = 99;

/// Status numbers the API answers with.
pub const CODE_MESSAGES: &[(&str, &str)] = &[
    ("-1", "incomplete parameters"),
    ("-2", "server does not support this request"),
    ("30", "wrong password"),
    ("40", "account does not exist"),
    ("41", "insufficient balance"),
    ("42", "account expired"),
    ("43", "IP address restricted"),
    ("50", "content contains sensitive words"),
    ("51", "incorrect mobile number"),
];

const RESPONSE: ResponseHandlerConfig =
    ResponseHandlerConfig::text_eq("0").with_code_messages(CODE_MESSAGES);

pub fn transformer() -> Arc<dyn SmsTransformer> {
    Arc::new(
        BaseTransformer::new(PROVIDER, RESPONSE)
            .with_before_hook(require_key_and_secret(PROVIDER))
            .with_before_hook(max_mobiles(PROVIDER, MAX_MOBILES))
            .with_sms_handler(build_sms)
            .with_voice_handler(build_voice),
    )
}

fn credentials(account: &Account) -> FormParams {
    FormParams::new()
        .push("u", account.api_key.as_str())
        .push("p", md5_hex(account.secret()))
}

fn build_sms(
    _ctx: &TransformContext,
    msg: &Message,
    account: &Account,
) -> Result<HttpRequestSpec, SmsError> {
    let content = with_sign_prefix(&msg.sign_name, &rendered_content(PROVIDER, msg)?);
    let base = account.endpoint_or(DEFAULT_ENDPOINT);
    let (path, mobiles) = if msg.is_intl() {
        let code = msg.country_code();
        let mobiles = msg
            .mobiles
            .iter()
            .map(|m| with_plus_prefix(code, m))
            .collect::<Vec<_>>()
            .join(",");
        ("/wsms", mobiles)
    } else {
        ("/sms", msg.joined_mobiles(","))
    };
    let params = credentials(account).push("m", mobiles).push("c", content);
    Ok(HttpRequestSpec::get(format!("{base}{path}")).query_form(&params))
}

fn build_voice(
    _ctx: &TransformContext,
    msg: &Message,
    account: &Account,
) -> Result<HttpRequestSpec, SmsError> {
    require_single(PROVIDER, msg, "voice")?;
    let mobile = normalize_phone_number(&msg.mobiles[0]);
    if msg.is_intl() || !is_china_mobile(&mobile) {
        return Err(SmsError::unsupported_country(
            PROVIDER,
            "voice only reaches 11-digit mainland China mobiles",
        ));
    }
    require_verification(PROVIDER, msg)?;
    let params = credentials(account)
        .push("m", mobile)
        .push("c", verification_code(PROVIDER, msg)?);
    let base = account.endpoint_or(DEFAULT_ENDPOINT);
    Ok(HttpRequestSpec::get(format!("{base}/voice")).query_form(&params))
}
