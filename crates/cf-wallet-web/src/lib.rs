//! Hosted web-wallet backend.
//!
//! Views go straight to a NEAR JSON-RPC node. Anything that needs a
//! signature is handed to a [`WebWalletSession`], the external object that
//! owns the sign-in state and the wallet-portal round trip.

mod rpc;

use async_trait::async_trait;
use cf_api_types::AccountId;
use cf_wallet_client::{FunctionCallRequest, WalletBackend, WalletError, WalletResult};
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

pub use rpc::NearRpcClient;

pub const WEB_WALLET: &str = "web-wallet";

#[async_trait]
pub trait WebWalletSession: Send + Sync {
    fn is_signed_in(&self) -> bool;
    fn account_id(&self) -> Option<AccountId>;
    /// Signs and submits one function call, waiting for the user to confirm
    /// in the wallet portal.
    async fn sign_and_send(&self, req: FunctionCallRequest) -> WalletResult<Value>;
    fn sign_out(&self);
}

/// Session for a known account that holds no keys. Good for monitoring;
/// every state-changing call is rejected.
pub struct WatchOnlySession {
    account_id: AccountId,
    signed_in: AtomicBool,
}

impl WatchOnlySession {
    pub fn new(account_id: impl Into<AccountId>) -> Self {
        Self {
            account_id: account_id.into(),
            signed_in: AtomicBool::new(true),
        }
    }
}

#[async_trait]
impl WebWalletSession for WatchOnlySession {
    fn is_signed_in(&self) -> bool {
        self.signed_in.load(Ordering::SeqCst)
    }

    fn account_id(&self) -> Option<AccountId> {
        self.is_signed_in().then(|| self.account_id.clone())
    }

    async fn sign_and_send(&self, req: FunctionCallRequest) -> WalletResult<Value> {
        Err(WalletError::Rejected(format!(
            "watch-only session for {} cannot sign {}.{}",
            self.account_id, req.contract_id, req.method
        )))
    }

    fn sign_out(&self) {
        self.signed_in.store(false, Ordering::SeqCst);
    }
}

pub struct HostedWebWallet {
    rpc: NearRpcClient,
    session: Arc<dyn WebWalletSession>,
}

impl HostedWebWallet {
    pub fn new(rpc: NearRpcClient, session: Arc<dyn WebWalletSession>) -> Self {
        Self { rpc, session }
    }
}

#[async_trait]
impl WalletBackend for HostedWebWallet {
    fn kind(&self) -> &'static str {
        WEB_WALLET
    }

    fn is_connected(&self) -> bool {
        self.session.is_signed_in()
    }

    fn account_id(&self) -> WalletResult<AccountId> {
        self.session
            .account_id()
            .filter(|id| !id.is_empty())
            .ok_or(WalletError::NotConnected)
    }

    async fn view(&self, contract_id: &str, method: &str, args: Value) -> WalletResult<Value> {
        self.rpc.view_function(contract_id, method, &args).await
    }

    async fn call(&self, req: FunctionCallRequest) -> WalletResult<Value> {
        if !self.is_connected() {
            return Err(WalletError::NotConnected);
        }
        debug!(
            contract = %req.contract_id,
            method = %req.method,
            gas = req.gas,
            deposit = %req.attached_deposit,
            "web wallet sign request"
        );
        self.session.sign_and_send(req).await
    }

    fn disconnect(&self) {
        self.session.sign_out();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn wallet(account: &str) -> HostedWebWallet {
        HostedWebWallet::new(
            NearRpcClient::new("http://127.0.0.1:9"),
            Arc::new(WatchOnlySession::new(account)),
        )
    }

    fn unstake_request() -> FunctionCallRequest {
        FunctionCallRequest {
            contract_id: "pool.testnet".to_owned(),
            method: "unstake".to_owned(),
            args: json!({ "amount": "1" }),
            gas: 125_000_000_000_000,
            attached_deposit: "1".to_owned(),
        }
    }

    #[tokio::test]
    async fn watch_only_session_refuses_to_sign() {
        let wallet = wallet("alice.testnet");
        assert!(wallet.is_connected());
        assert_eq!(wallet.account_id().unwrap(), "alice.testnet");
        assert!(matches!(
            wallet.call(unstake_request()).await,
            Err(WalletError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn disconnect_signs_out_and_drops_identity() {
        let wallet = wallet("alice.testnet");
        wallet.disconnect();
        wallet.disconnect();

        assert!(!wallet.is_connected());
        assert_eq!(wallet.account_id(), Err(WalletError::NotConnected));
        assert_eq!(wallet.call(unstake_request()).await, Err(WalletError::NotConnected));
    }

    #[tokio::test]
    async fn empty_account_id_is_not_an_identity() {
        let wallet = wallet("");
        assert_eq!(wallet.account_id(), Err(WalletError::NotConnected));
    }
}
