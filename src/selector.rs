//! Account selection
//!
//! Accounts are grouped by `sub_type`; each group is a [`Selector`] with its
//! own round-robin cursor. Disabled accounts are dropped when the selector is
//! built and can never be returned.

use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::config::{Account, Strategy};
use crate::error::SmsError;

/// Strategy engine over the enabled accounts of one sub-provider.
#[derive(Debug)]
pub struct Selector {
    provider: String,
    strategy: Strategy,
    accounts: Vec<Arc<Account>>,
    total_weight: u64,
    cursor: AtomicUsize,
}

impl Selector {
    pub fn new(
        provider: impl Into<String>,
        strategy: Strategy,
        accounts: impl IntoIterator<Item = Arc<Account>>,
    ) -> Self {
        let accounts: Vec<_> = accounts.into_iter().filter(|a| a.is_enabled()).collect();
        let total_weight = accounts.iter().map(|a| u64::from(a.weight)).sum();
        Self {
            provider: provider.into(),
            strategy,
            accounts,
            total_weight,
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Enabled accounts in definition order.
    pub fn accounts(&self) -> &[Arc<Account>] {
        &self.accounts
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Pick an account, honouring `preferred` when it names an enabled one.
    pub fn select(&self, preferred: Option<&str>) -> Result<Arc<Account>, SmsError> {
        self.select_with(preferred, &mut rand::thread_rng())
    }

    /// [`Selector::select`] with a caller-supplied RNG.
    pub fn select_with<R: Rng + ?Sized>(
        &self,
        preferred: Option<&str>,
        rng: &mut R,
    ) -> Result<Arc<Account>, SmsError> {
        if let Some(name) = preferred {
            if let Some(account) = self.accounts.iter().find(|a| a.name == name) {
                tracing::trace!(
                    target: "smsmux::selector",
                    provider = %self.provider,
                    account = %account.name,
                    "preferred account"
                );
                return Ok(Arc::clone(account));
            }
        }

        let picked = match self.strategy {
            Strategy::RoundRobin => self.round_robin(),
            Strategy::Weighted => self.weighted(rng),
            Strategy::Random => self.random(rng),
        };
        match picked {
            Some(account) => {
                tracing::trace!(
                    target: "smsmux::selector",
                    provider = %self.provider,
                    strategy = %self.strategy,
                    account = %account.name,
                    "account selected"
                );
                Ok(Arc::clone(account))
            }
            None => Err(SmsError::NoAvailableAccount {
                provider: self.provider.clone(),
            }),
        }
    }

    fn round_robin(&self) -> Option<&Arc<Account>> {
        if self.accounts.is_empty() {
            return None;
        }
        let idx = self.cursor.fetch_add(1, Ordering::Relaxed) % self.accounts.len();
        self.accounts.get(idx)
    }

    fn weighted<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Arc<Account>> {
        if self.total_weight == 0 {
            return None;
        }
        let mut slot = rng.gen_range(0..self.total_weight);
        for account in &self.accounts {
            let weight = u64::from(account.weight);
            if slot < weight {
                return Some(account);
            }
            slot -= weight;
        }
        None
    }

    fn random<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Arc<Account>> {
        if self.accounts.is_empty() {
            return None;
        }
        self.accounts.get(rng.gen_range(0..self.accounts.len()))
    }
}

/// Every account of a pool, grouped by sub-provider.
#[derive(Debug)]
pub struct AccountPool {
    strategy: Strategy,
    groups: HashMap<String, Selector>,
}

impl AccountPool {
    pub fn new(strategy: Strategy, accounts: impl IntoIterator<Item = Account>) -> Self {
        let mut by_type: HashMap<String, Vec<Arc<Account>>> = HashMap::new();
        for account in accounts {
            by_type
                .entry(account.sub_type.clone())
                .or_default()
                .push(Arc::new(account));
        }
        let groups = by_type
            .into_iter()
            .map(|(sub_type, accounts)| {
                let selector = Selector::new(sub_type.clone(), strategy, accounts);
                (sub_type, selector)
            })
            .collect();
        Self { strategy, groups }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Selector serving `sub_provider`, if any account declares it.
    pub fn group(&self, sub_provider: &str) -> Option<&Selector> {
        self.groups.get(sub_provider)
    }

    /// Sub-provider tags with at least one enabled account.
    pub fn sub_providers(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self
            .groups
            .iter()
            .filter(|(_, s)| !s.is_empty())
            .map(|(k, _)| k.as_str())
            .collect();
        tags.sort_unstable();
        tags
    }

    pub fn select(
        &self,
        sub_provider: &str,
        preferred: Option<&str>,
    ) -> Result<Arc<Account>, SmsError> {
        match self.groups.get(sub_provider) {
            Some(selector) => selector.select(preferred),
            None => Err(SmsError::NoAvailableAccount {
                provider: sub_provider.to_string(),
            }),
        }
    }
}
