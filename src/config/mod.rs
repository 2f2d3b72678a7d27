//! Account pool configuration
//!
//! `SmsConfig` is the declarative shape callers load from JSON:
//!
//! ```json
//! {
//!   "strategy": "weighted",
//!   "items": [
//!     { "name": "primary", "sub_type": "aliyun", "weight": 3,
//!       "api_key": "ak", "api_secret": "sk" }
//!   ]
//! }
//! ```
//!
//! Unknown fields are ignored. Secrets are held in [`SecretString`] and never
//! show up in `Debug` output.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use std::fmt;
use validator::Validate;

use crate::error::SmsError;

/// Account selection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    #[default]
    #[serde(alias = "roundrobin", alias = "round-robin")]
    RoundRobin,
    Weighted,
    Random,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::RoundRobin => "round_robin",
            Self::Weighted => "weighted",
            Self::Random => "random",
        })
    }
}

fn default_weight() -> u32 {
    1
}

fn empty_secret() -> SecretString {
    SecretString::from(String::new())
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(SecretString::from(raw.unwrap_or_default()))
}

/// One credential set within a pool.
#[derive(Debug, Deserialize, Validate)]
pub struct Account {
    #[validate(length(min = 1, message = "account name must not be empty"))]
    pub name: String,
    #[validate(length(min = 1, message = "account sub_type must not be empty"))]
    pub sub_type: String,
    #[serde(default = "default_weight")]
    pub weight: u32,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "empty_secret", deserialize_with = "deserialize_secret")]
    pub api_secret: SecretString,
    #[serde(default)]
    pub app_id: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub callback: String,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub intl_endpoint: String,
    #[serde(default)]
    pub from: String,
}

impl Account {
    pub fn new(name: impl Into<String>, sub_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sub_type: sub_type.into(),
            weight: default_weight(),
            disabled: false,
            api_key: String::new(),
            api_secret: empty_secret(),
            app_id: String::new(),
            region: String::new(),
            callback: String::new(),
            endpoint: String::new(),
            intl_endpoint: String::new(),
            from: String::new(),
        }
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = key.into();
        self
    }

    pub fn with_api_secret(mut self, secret: impl Into<String>) -> Self {
        self.api_secret = SecretString::from(secret.into());
        self
    }

    pub fn with_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = app_id.into();
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_callback(mut self, callback: impl Into<String>) -> Self {
        self.callback = callback.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_intl_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.intl_endpoint = endpoint.into();
        self
    }

    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = from.into();
        self
    }

    pub fn is_enabled(&self) -> bool {
        !self.disabled
    }

    /// The secret in the clear, for signing.
    pub fn secret(&self) -> &str {
        self.api_secret.expose_secret()
    }

    /// `endpoint` when configured, otherwise `default`. Trailing slashes are trimmed.
    pub fn endpoint_or<'a>(&'a self, default: &'a str) -> &'a str {
        pick(&self.endpoint, default)
    }

    /// `intl_endpoint` when configured, otherwise `default`.
    pub fn intl_endpoint_or<'a>(&'a self, default: &'a str) -> &'a str {
        pick(&self.intl_endpoint, default)
    }
}

fn pick<'a>(configured: &'a str, default: &'a str) -> &'a str {
    let trimmed = configured.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        default
    } else {
        trimmed
    }
}

/// Pool configuration: `{ disabled, strategy, items }`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct SmsConfig {
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub strategy: Strategy,
    #[serde(default)]
    #[validate(nested)]
    pub items: Vec<Account>,
}

impl SmsConfig {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            disabled: false,
            strategy,
            items: Vec::new(),
        }
    }

    pub fn with_account(mut self, account: Account) -> Self {
        self.items.push(account);
        self
    }

    pub fn from_json_str(raw: &str) -> Result<Self, SmsError> {
        serde_json::from_str(raw)
            .map_err(|e| SmsError::ConfigurationError(format!("invalid sms config: {e}")))
    }

    pub fn from_json_value(value: serde_json::Value) -> Result<Self, SmsError> {
        serde_json::from_value(value)
            .map_err(|e| SmsError::ConfigurationError(format!("invalid sms config: {e}")))
    }

    /// Structural plus semantic checks run by the provider constructor.
    pub fn validate_pool(&self) -> Result<(), SmsError> {
        if self.disabled {
            return Err(SmsError::ConfigurationError(
                "sms pool is disabled".to_string(),
            ));
        }
        if self.items.is_empty() {
            return Err(SmsError::ConfigurationError(
                "at least one account is required".to_string(),
            ));
        }
        self.validate()
            .map_err(|e| SmsError::ConfigurationError(e.to_string()))?;

        let mut seen = HashSet::new();
        for account in &self.items {
            if !seen.insert(account.name.as_str()) {
                return Err(SmsError::ConfigurationError(format!(
                    "duplicate account name '{}'",
                    account.name
                )));
            }
        }
        if !self.items.iter().any(Account::is_enabled) {
            return Err(SmsError::ConfigurationError(
                "every account in the pool is disabled".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_json_and_ignores_unknown_fields() {
        let cfg = SmsConfig::from_json_str(
            r#"{
                "strategy": "weighted",
                "unknown": 1,
                "items": [
                    {"name": "a", "sub_type": "aliyun", "weight": 3,
                     "api_key": "ak", "api_secret": "sk", "extra": true},
                    {"name": "b", "sub_type": "huawei", "disabled": true}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.strategy, Strategy::Weighted);
        assert_eq!(cfg.items.len(), 2);
        assert_eq!(cfg.items[0].secret(), "sk");
        assert_eq!(cfg.items[0].weight, 3);
        assert_eq!(cfg.items[1].weight, 1);
        assert_eq!(cfg.items[1].secret(), "");
        assert!(!cfg.items[1].is_enabled());
        assert!(cfg.validate_pool().is_ok());
    }

    #[test]
    fn debug_redacts_secret() {
        let account = Account::new("a", "aliyun").with_api_secret("very-secret");
        assert!(!format!("{account:?}").contains("very-secret"));
    }

    #[test]
    fn strategy_aliases() {
        let cfg = SmsConfig::from_json_str(r#"{"strategy":"round-robin","items":[]}"#).unwrap();
        assert_eq!(cfg.strategy, Strategy::RoundRobin);
        assert!(SmsConfig::from_json_str(r#"{"strategy":"fastest"}"#).is_err());
    }

    #[test]
    fn rejects_empty_disabled_and_duplicate_pools() {
        let err = SmsConfig::new(Strategy::Random).validate_pool().unwrap_err();
        assert_eq!(err.code(), "configuration_error");
        assert!(err.to_string().contains("at least one account is required"));

        let all_disabled = SmsConfig::new(Strategy::Random)
            .with_account(Account::new("a", "aliyun").with_disabled(true));
        assert!(all_disabled.validate_pool().is_err());

        let dup = SmsConfig::new(Strategy::Random)
            .with_account(Account::new("a", "aliyun"))
            .with_account(Account::new("a", "huawei"));
        let err = dup.validate_pool().unwrap_err();
        assert!(err.to_string().contains("duplicate"));

        let mut off = SmsConfig::new(Strategy::Random).with_account(Account::new("a", "aliyun"));
        off.disabled = true;
        assert!(off.validate_pool().is_err());

        let unnamed = SmsConfig::new(Strategy::Random).with_account(Account::new("", "aliyun"));
        assert!(unnamed.validate_pool().is_err());
    }

    #[test]
    fn endpoint_override() {
        let account = Account::new("a", "aliyun").with_endpoint("https://mock.local/");
        assert_eq!(account.endpoint_or("https://dysmsapi.aliyuncs.com"), "https://mock.local");
        assert_eq!(
            account.intl_endpoint_or("https://intl.example"),
            "https://intl.example"
        );
    }
}
