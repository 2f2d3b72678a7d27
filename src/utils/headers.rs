//! HTTP header helpers

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use std::collections::BTreeMap;

use crate::error::SmsError;
use crate::types::BodyType;

pub const DEFAULT_USER_AGENT: &str = concat!("smsmux/", env!("CARGO_PKG_VERSION"));

/// Insert one header, rejecting names or values reqwest cannot carry.
pub fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) -> Result<(), SmsError> {
    let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
        SmsError::ConfigurationError(format!("Invalid header name '{name}': {e}"))
    })?;
    let header_value = HeaderValue::from_str(value).map_err(|e| {
        SmsError::ConfigurationError(format!("Invalid header value for '{name}': {e}"))
    })?;
    headers.insert(header_name, header_value);
    Ok(())
}

/// Final header set for a request.
///
/// Defaults first (user agent, content type implied by `body_type`), then the
/// transformer's headers, then per-send extras. Later layers win.
pub fn build_request_headers(
    body_type: BodyType,
    spec_headers: &BTreeMap<String, String>,
    extra: &BTreeMap<String, String>,
) -> Result<HeaderMap, SmsError> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
    if let Some(content_type) = body_type.default_content_type() {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    }
    for (k, v) in spec_headers.iter().chain(extra.iter()) {
        insert_header(&mut headers, k, v)?;
    }
    Ok(headers)
}

/// Convert a reqwest HeaderMap to lowercase-keyed string pairs.
///
/// Non UTF-8 values are dropped.
pub fn headermap_to_btree(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .filter_map(|(k, v)| {
            v.to_str()
                .ok()
                .map(|v_str| (k.as_str().to_string(), v_str.to_string()))
        })
        .collect()
}
