//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use smsmux::utils::{FixedClock, FixedNonce};
use smsmux::{Account, Message, SmsConfig, SmsProvider, SmsProviderBuilder, Strategy};

pub const MOBILE: &str = "13800138000";

/// md5("pass"), the password smsbao expects on the wire.
pub const PASS_MD5: &str = "1a1dc91c907325c69271ddf0c944bc72";

/// Smsbao account whose traffic goes to `endpoint` (a mock server).
pub fn smsbao_account(name: &str, user: &str, endpoint: &str) -> Account {
    Account::new(name, "smsbao")
        .with_api_key(user)
        .with_api_secret("pass")
        .with_endpoint(endpoint)
}

pub fn smsbao_message() -> Message {
    Message::builder("smsbao")
        .mobile(MOBILE)
        .sign_name("Acme")
        .content("your code is 1234")
        .build()
}

/// Builder with a fixed clock and nonce so signed requests are reproducible.
pub fn builder(
    strategy: Strategy,
    accounts: impl IntoIterator<Item = Account>,
) -> SmsProviderBuilder {
    let config = accounts
        .into_iter()
        .fold(SmsConfig::new(strategy), SmsConfig::with_account);
    SmsProvider::builder(config)
        .with_clock(Arc::new(FixedClock::at_unix(1_700_000_000)))
        .with_nonce_source(Arc::new(FixedNonce::new(123456, "nonce-1")))
}

pub fn provider(strategy: Strategy, accounts: impl IntoIterator<Item = Account>) -> SmsProvider {
    builder(strategy, accounts).build().expect("valid pool")
}
