//! Staking-farm client core: cached token state, the refresh cycle and the
//! stake/unstake actions, all built on the contract proxies.

mod auto_refresh;
mod config;
mod error;
mod farm;
mod notify;
mod state;

pub use auto_refresh::AutoRefresh;
pub use config::{
    CHEDDAR_POOL_CONTRACT, CHEDDAR_TOKEN_CONTRACT, DEFAULT_NETWORK, DEFAULT_REFRESH_PERIOD,
    FarmConfig, NEXT_POOL_CONTRACT, NEXT_TOKEN_CONTRACT, NetworkConfig, STNEAR_POOL_CONTRACT,
    STNEAR_TOKEN_CONTRACT, TokenConfig, default_tokens,
};
pub use error::FarmError;
pub use farm::{
    ActionKind, ActionReceipt, FarmToken, MIN_DEPOSIT_AMOUNT, RefreshSummary, STAKE_MEMO,
    StakingFarm,
};
pub use notify::{MemoryNotifier, Notifier, TracingNotifier};
pub use state::{FormGate, FormGuard, LoadedToken, StakedAmount, TokenState};
