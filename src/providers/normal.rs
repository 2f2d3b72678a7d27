//! Generic HTTP channel for in-house gateways.
//!
//! The account's `endpoint` receives the message as JSON (or as query
//! parameters for `GET`). Success is a 2xx status unless the message names a
//! `success_path` / `success_value` pair in its extras.

use std::sync::Arc;

use reqwest::Method;
use serde_json::{Value, json};

use crate::config::Account;
use crate::error::SmsError;
use crate::transformers::base::BaseTransformer;
use crate::transformers::json_path::string_at;
use crate::transformers::{
    ResponseHandler, ResponseHandlerConfig, SmsTransformer, TransformContext, check_status,
};
use crate::types::{FormParams, HttpRequestSpec, Message, SendResult};

pub const PROVIDER: &str = "normal";

/// Transformer that picks its response check per message.
#[derive(Debug)]
pub struct NormalTransformer {
    base: BaseTransformer,
}

impl Default for NormalTransformer {
    fn default() -> Self {
        Self::new()
    }
}

impl NormalTransformer {
    pub fn new() -> Self {
        Self {
            base: BaseTransformer::new(PROVIDER, ResponseHandlerConfig::status_only())
                .with_before_hook(require_endpoint)
                .with_sms_handler(build)
                .with_voice_handler(build)
                .with_mms_handler(build),
        }
    }
}

impl SmsTransformer for NormalTransformer {
    fn sub_provider(&self) -> &str {
        PROVIDER
    }

    fn transform(
        &self,
        ctx: &TransformContext,
        msg: &Message,
        account: &Account,
    ) -> Result<(HttpRequestSpec, ResponseHandler), SmsError> {
        let (spec, status_handler) = self.base.transform(ctx, msg, account)?;
        let handler = match (msg.extra_str("success_path"), msg.extra("success_value")) {
            (Some(path), Some(expected)) => success_value_handler(path, expected.to_string()),
            _ => status_handler,
        };
        Ok((spec, handler))
    }
}

pub fn transformer() -> Arc<dyn SmsTransformer> {
    Arc::new(NormalTransformer::new())
}

fn require_endpoint(_msg: &Message, account: &Account) -> Result<(), SmsError> {
    if account.endpoint.trim().is_empty() {
        return Err(SmsError::invalid(
            PROVIDER,
            "account endpoint is required for the normal channel",
        ));
    }
    Ok(())
}

fn success_value_handler(path: &str, expected: String) -> ResponseHandler {
    let path = path.to_string();
    Arc::new(move |result: &SendResult| {
        check_status(PROVIDER, result)?;
        let text = result.body_text();
        let json: Value = serde_json::from_str(&text).map_err(|e| {
            SmsError::provider_error(
                PROVIDER,
                "invalid_response",
                format!("response is not JSON ({e}): {text}"),
            )
        })?;
        let actual = string_at(&json, &path);
        if actual == expected {
            Ok(())
        } else {
            Err(SmsError::provider_error(PROVIDER, actual, text))
        }
    })
}

fn method(msg: &Message) -> Result<Method, SmsError> {
    match msg.extra_str("method") {
        None => Ok(Method::POST),
        Some(raw) => Method::from_bytes(raw.trim().to_ascii_uppercase().as_bytes())
            .map_err(|_| SmsError::invalid(PROVIDER, format!("invalid http method '{raw}'"))),
    }
}

fn build(
    _ctx: &TransformContext,
    msg: &Message,
    account: &Account,
) -> Result<HttpRequestSpec, SmsError> {
    let method = method(msg)?;
    let url = account.endpoint.trim();
    let mut spec = HttpRequestSpec::new(method.clone(), url);
    if !account.api_key.is_empty() {
        spec = spec.header("X-Api-Key", account.api_key.as_str());
    }

    if method == Method::GET {
        let params = FormParams::new()
            .push("mobiles", msg.joined_mobiles(","))
            .push("type", msg.message_type.to_string())
            .push("category", msg.category.to_string())
            .push("region_code", msg.region_code.to_string())
            .push_non_empty("content", &msg.content)
            .push_non_empty("sign_name", &msg.sign_name)
            .push_non_empty("template_id", &msg.template_id)
            .push_non_empty("uid", &msg.uid);
        let params = msg
            .template_params
            .iter()
            .fold(params, |p, (k, v)| p.push(k.as_str(), v.as_str()));
        return Ok(spec.query_form(&params));
    }

    let extras: serde_json::Map<String, Value> = msg
        .extras
        .iter()
        .filter(|(k, _)| !matches!(k.as_str(), "method" | "success_path" | "success_value"))
        .map(|(k, v)| serde_json::to_value(v).map(|v| (k.clone(), v)))
        .collect::<Result<_, serde_json::Error>>()?;
    let mut body = json!({
        "type": msg.message_type,
        "category": msg.category,
        "mobiles": msg.mobiles,
        "region_code": msg.region_code,
        "content": msg.content,
        "sign_name": msg.sign_name,
        "template_id": msg.template_id,
        "template_params": msg.template_params,
        "params_order": msg.params_order,
        "callback_url": msg.callback_url,
        "extend": msg.extend,
        "uid": msg.uid,
        "extras": extras,
    });
    if let Some(at) = msg.scheduled_at {
        body["scheduled_at"] = json!(at.to_rfc3339());
    }
    spec.json(&body)
}
