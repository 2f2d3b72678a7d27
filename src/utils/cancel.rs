//! Per-send cancellation and deadline handling.

use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::error::SmsError;

pub(crate) const REASON_CANCELLED: &str = "cancelled by caller";
pub(crate) const REASON_DEADLINE: &str = "deadline exceeded";

/// Caller-side controls for one `send`.
///
/// Carries a cancellation token, an optional absolute deadline and an
/// optional preferred account name. Cloning shares the token, so a clone can
/// be handed to another task and cancelled from there.
#[derive(Debug, Clone, Default)]
pub struct SendContext {
    token: CancellationToken,
    deadline: Option<Instant>,
    preferred_account: Option<String>,
}

impl SendContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe an externally owned token (e.g. a child of a shutdown token).
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Deadline `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Route to the named account when it is enabled and serves the message.
    pub fn prefer_account(mut self, name: impl Into<String>) -> Self {
        self.preferred_account = Some(name.into());
        self
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.token
    }

    /// Request cancellation of every send observing this context.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline; `Some(ZERO)` once it has passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn preferred_account(&self) -> Option<&str> {
        self.preferred_account.as_deref()
    }

    /// Fail fast when the context is already cancelled or expired.
    pub(crate) fn check(&self, provider: &str) -> Result<(), SmsError> {
        if self.is_cancelled() {
            return Err(SmsError::cancelled(provider, REASON_CANCELLED));
        }
        if self.remaining() == Some(Duration::ZERO) {
            return Err(SmsError::cancelled(provider, REASON_DEADLINE));
        }
        Ok(())
    }

    /// Resolves when the deadline passes; never resolves without one.
    pub(crate) async fn expired(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await
            }
            None => std::future::pending::<()>().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_token() {
        let ctx = SendContext::new();
        let other = ctx.clone();
        other.cancel();
        assert!(ctx.is_cancelled());
        let err = ctx.check("aliyun").unwrap_err();
        assert_eq!(err.code(), "cancelled");
        assert_eq!(err.message(), REASON_CANCELLED);
    }

    #[test]
    fn past_deadline_fails_check() {
        let ctx = SendContext::new().with_deadline(Instant::now());
        let err = ctx.check("juhe").unwrap_err();
        assert_eq!(err.message(), REASON_DEADLINE);
        assert_eq!(ctx.remaining(), Some(Duration::ZERO));
    }

    #[test]
    fn untouched_context_passes() {
        let ctx = SendContext::new().prefer_account("b");
        assert!(ctx.check("juhe").is_ok());
        assert_eq!(ctx.remaining(), None);
        assert_eq!(ctx.preferred_account(), Some("b"));
    }

    #[tokio::test]
    async fn expired_resolves_after_deadline() {
        let ctx = SendContext::new().with_timeout(Duration::from_millis(10));
        tokio::time::timeout(Duration::from_secs(2), ctx.expired())
            .await
            .expect("deadline should fire");
    }
}
