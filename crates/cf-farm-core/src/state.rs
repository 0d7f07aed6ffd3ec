//! Cached per-token state and the per-token form gate.

use cf_api_types::{
    ContractParams, FungibleTokenMetadata, RefreshPhase, StorageBalance, TokenKind, U128String,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

/// Pool total in base units: the last chain-confirmed value plus the
/// optimistic delta of actions not yet seen by a refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StakedAmount {
    confirmed: u128,
    pending: i128,
}

impl StakedAmount {
    pub fn confirmed(value: u128) -> Self {
        Self {
            confirmed: value,
            pending: 0,
        }
    }

    pub fn confirmed_value(&self) -> u128 {
        self.confirmed
    }

    pub fn pending(&self) -> i128 {
        self.pending
    }

    pub fn current(&self) -> u128 {
        if self.pending >= 0 {
            self.confirmed.saturating_add(self.pending.unsigned_abs())
        } else {
            self.confirmed.saturating_sub(self.pending.unsigned_abs())
        }
    }

    pub fn add_pending(&mut self, delta: i128) {
        self.pending = self.pending.saturating_add(delta);
    }

    /// Adopts the chain total and clears the optimistic delta. Returns the
    /// expected total when the chain disagrees with it while a delta was
    /// outstanding (other stakers, or an action that did not land).
    pub fn reconcile(&mut self, chain_total: u128) -> Option<u128> {
        let expected = self.current();
        let had_pending = self.pending != 0;
        self.confirmed = chain_total;
        self.pending = 0;
        (had_pending && expected != chain_total).then_some(expected)
    }
}

/// Metadata and the cached staked amount are only ever present together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedToken {
    pub metadata: FungibleTokenMetadata,
    pub staked: StakedAmount,
}

/// Values fetched by one refresh of one token, applied as a group.
#[derive(Debug, Clone)]
pub(crate) struct FetchedToken {
    pub wallet_balance: U128String,
    pub metadata: FungibleTokenMetadata,
    pub storage: Option<StorageBalance>,
    pub account_staked: U128String,
    pub pool_params: ContractParams,
    pub pool_total: u128,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenState {
    pub kind: TokenKind,
    pub phase: RefreshPhase,
    pub wallet_balance: U128String,
    pub account_staked: U128String,
    pub registered: bool,
    pub pool_params: ContractParams,
    pub loaded: Option<LoadedToken>,
}

impl TokenState {
    pub fn new(kind: TokenKind) -> Self {
        Self {
            phase: RefreshPhase::Uninitialized,
            ..Self::baseline(kind)
        }
    }

    fn baseline(kind: TokenKind) -> Self {
        Self {
            kind,
            phase: RefreshPhase::Disconnected,
            wallet_balance: "0".to_owned(),
            account_staked: "0".to_owned(),
            registered: false,
            pool_params: ContractParams {
                total_staked: "0".to_owned(),
                ..ContractParams::default()
            },
            loaded: None,
        }
    }

    /// Drops everything tied to the previous account.
    pub fn reset(&mut self) {
        *self = Self::baseline(self.kind);
    }

    pub fn metadata(&self) -> Option<&FungibleTokenMetadata> {
        self.loaded.as_ref().map(|loaded| &loaded.metadata)
    }

    pub fn staked(&self) -> Option<StakedAmount> {
        self.loaded.as_ref().map(|loaded| loaded.staked)
    }

    pub(crate) fn apply(&mut self, fetched: FetchedToken) {
        let staked = match self.loaded.as_ref() {
            Some(loaded) => {
                let mut staked = loaded.staked;
                if let Some(expected) = staked.reconcile(fetched.pool_total) {
                    info!(
                        token = %self.kind,
                        expected,
                        observed = fetched.pool_total,
                        "pool total differs from optimistic estimate"
                    );
                }
                staked
            }
            None => StakedAmount::confirmed(fetched.pool_total),
        };

        self.wallet_balance = fetched.wallet_balance;
        self.account_staked = fetched.account_staked;
        self.registered = fetched.storage.is_some();
        self.pool_params = fetched.pool_params;
        self.loaded = Some(LoadedToken {
            metadata: fetched.metadata,
            staked,
        });
        self.phase = RefreshPhase::Ready;
    }
}

/// Stand-in for a form's disabled flag: held while an action runs and
/// released on drop, whatever the outcome.
#[derive(Debug, Clone, Default)]
pub struct FormGate {
    busy: Arc<AtomicBool>,
}

impl FormGate {
    pub fn is_enabled(&self) -> bool {
        !self.busy.load(Ordering::SeqCst)
    }

    pub fn try_acquire(&self) -> Option<FormGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| FormGuard {
                busy: self.busy.clone(),
            })
    }
}

#[derive(Debug)]
pub struct FormGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for FormGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::SeqCst);
    }
}
