//! Wallet capability contract shared by every backend, and the provider
//! handle that contract proxies read the active backend through.

mod disconnected;
mod provider;

#[cfg(any(test, feature = "test-support"))]
pub mod mock;

use async_trait::async_trait;
use cf_api_types::{AccountId, U128String};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

pub use disconnected::DisconnectedWallet;
pub use provider::WalletProvider;

/// Gas units attached to a function call.
pub type Gas = u64;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WalletError {
    #[error("wallet not connected")]
    NotConnected,
    #[error("{contract_id}.{method} failed: {message}")]
    Rpc {
        contract_id: String,
        method: String,
        message: String,
    },
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("transport error: {0}")]
    Transport(String),
}

pub type WalletResult<T> = Result<T, WalletError>;

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCallRequest {
    pub contract_id: AccountId,
    pub method: String,
    pub args: Value,
    pub gas: Gas,
    pub attached_deposit: U128String,
}

#[async_trait]
pub trait WalletBackend: Send + Sync {
    /// Short backend tag used in logs and status responses.
    fn kind(&self) -> &'static str;

    fn is_connected(&self) -> bool;

    fn account_id(&self) -> WalletResult<AccountId>;

    /// Read-only query. Never prompts the user.
    async fn view(&self, contract_id: &str, method: &str, args: Value) -> WalletResult<Value>;

    /// State-changing call; may wait on the user to confirm.
    async fn call(&self, req: FunctionCallRequest) -> WalletResult<Value>;

    /// Idempotent.
    fn disconnect(&self);
}

/// Connection changes pushed by a wallet backend (e.g. the extension).
#[derive(Clone)]
pub enum WalletEvent {
    Connected {
        backend: Arc<dyn WalletBackend>,
        account_id: AccountId,
    },
    Disconnected,
}

impl fmt::Debug for WalletEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalletEvent::Connected { backend, account_id } => f
                .debug_struct("Connected")
                .field("backend", &backend.kind())
                .field("account_id", account_id)
                .finish(),
            WalletEvent::Disconnected => f.write_str("Disconnected"),
        }
    }
}
