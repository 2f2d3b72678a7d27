//! Time and nonce sources injected into transformers.
//!
//! Vendors sign timestamps and random nonces into their requests. Both come
//! from here so that tests can pin them and assert exact signatures.

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use rand::Rng;
use std::fmt;

/// Wall-clock source.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Frozen at `secs` seconds after the Unix epoch.
    pub fn at_unix(secs: i64) -> Self {
        Self(DateTime::from_timestamp(secs, 0).unwrap_or_default())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Source of per-request nonces.
pub trait NonceSource: Send + Sync + fmt::Debug {
    /// Numeric nonce, for vendors that want digits.
    fn next_number(&self) -> u64;

    /// Opaque nonce token.
    fn next_token(&self) -> String {
        format!("{:016x}", self.next_number())
    }
}

/// Thread-local RNG numbers and UUIDv4 tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomNonce;

impl NonceSource for RandomNonce {
    fn next_number(&self) -> u64 {
        u64::from(rand::thread_rng().gen_range(100_000u32..u32::MAX))
    }

    fn next_token(&self) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }
}

/// Always returns the same nonce.
#[derive(Debug, Clone)]
pub struct FixedNonce {
    number: u64,
    token: String,
}

impl FixedNonce {
    pub fn new(number: u64, token: impl Into<String>) -> Self {
        Self {
            number,
            token: token.into(),
        }
    }
}

impl NonceSource for FixedNonce {
    fn next_number(&self) -> u64 {
        self.number
    }

    fn next_token(&self) -> String {
        self.token.clone()
    }
}

/// `now` as a naive China Standard Time (UTC+8) wall clock.
pub fn china_time(now: DateTime<Utc>) -> NaiveDateTime {
    now.naive_utc() + TimeDelta::hours(8)
}

/// Format `now` in China Standard Time with a `strftime` pattern.
pub fn format_china(now: DateTime<Utc>, pattern: &str) -> String {
    china_time(now).format(pattern).to_string()
}

/// `2006-01-02T15:04:05Z`
pub fn iso8601_utc(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
