//! HTTP request specification produced by transformers and the raw result
//! handed back to response handlers.

use reqwest::Method;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::SmsError;

/// How [`HttpRequestSpec::body`] is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyType {
    /// `application/json`
    #[default]
    Json,
    /// `application/x-www-form-urlencoded`
    Form,
    /// Sent verbatim, no content type implied.
    Raw,
}

impl BodyType {
    /// Content type the dispatcher sets when the spec does not carry one.
    pub const fn default_content_type(self) -> Option<&'static str> {
        match self {
            Self::Json => Some("application/json"),
            Self::Form => Some("application/x-www-form-urlencoded"),
            Self::Raw => None,
        }
    }
}

/// Ordered form parameters; order is kept so request bodies are reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormParams(Vec<(String, String)>);

impl FormParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.push((key.into(), value.into()));
        self
    }

    /// Push only when `value` is non-empty.
    pub fn push_non_empty(self, key: impl Into<String>, value: impl AsRef<str>) -> Self {
        let value = value.as_ref();
        if value.is_empty() {
            self
        } else {
            self.push(key, value)
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Pairs ordered by key (stable for equal keys).
    pub fn sorted(mut self) -> Self {
        self.0.sort_by(|a, b| a.0.cmp(&b.0));
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `k=v&k2=v2` with RFC 3986 percent-encoding.
    pub fn encode(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Declarative description of one outbound HTTP call.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequestSpec {
    pub method: Method,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub query_params: BTreeMap<String, Vec<String>>,
    pub body: Vec<u8>,
    pub body_type: BodyType,
}

impl HttpRequestSpec {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: BTreeMap::new(),
            query_params: BTreeMap::new(),
            body: Vec::new(),
            body_type: BodyType::Raw,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    /// Append every pair of `params` as query parameters.
    pub fn query_form(mut self, params: &FormParams) -> Self {
        for (k, v) in params.iter() {
            self = self.query(k, v);
        }
        self
    }

    pub fn form(mut self, params: &FormParams) -> Self {
        self.body = params.encode().into_bytes();
        self.body_type = BodyType::Form;
        self
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, SmsError> {
        self.body = serde_json::to_vec(body)?;
        self.body_type = BodyType::Json;
        Ok(self)
    }

    pub fn raw(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self.body_type = BodyType::Raw;
        self
    }

    /// Case-insensitive header lookup.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// First value of query parameter `name`.
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query_params
            .get(name)
            .and_then(|v| v.first())
            .map(String::as_str)
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Body parsed as JSON, if it is JSON.
    pub fn json_body(&self) -> Option<serde_json::Value> {
        serde_json::from_slice(&self.body).ok()
    }

    /// Decoded form body pairs (empty for non-form bodies).
    pub fn form_pairs(&self) -> Vec<(String, String)> {
        if self.body_type != BodyType::Form {
            return Vec::new();
        }
        self.body_text()
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
                (decode_component(k), decode_component(v))
            })
            .collect()
    }

    /// First decoded form value for `key`.
    pub fn form_value(&self, key: &str) -> Option<String> {
        self.form_pairs()
            .into_iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// The request URL with every query parameter appended.
    pub fn full_url(&self) -> Result<reqwest::Url, SmsError> {
        let mut url = reqwest::Url::parse(&self.url)
            .map_err(|e| SmsError::ConfigurationError(format!("invalid url '{}': {e}", self.url)))?;
        if !self.query_params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, values) in &self.query_params {
                for value in values {
                    pairs.append_pair(name, value);
                }
            }
        }
        Ok(url)
    }
}

fn decode_component(raw: &str) -> String {
    let plus_as_space = raw.replace('+', " ");
    urlencoding::decode(&plus_as_space)
        .map(|s| s.into_owned())
        .unwrap_or(plus_as_space)
}

/// Raw HTTP outcome handed to a response handler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendResult {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl SendResult {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
