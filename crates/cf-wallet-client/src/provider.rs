use cf_api_types::AccountId;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

use crate::{DisconnectedWallet, WalletBackend, WalletResult};

/// Shared handle to the active wallet backend.
///
/// Clones share the same slot, so replacing the backend through any clone is
/// seen by every contract proxy holding one. The lock only guards the pointer
/// swap and is never held across a wallet request.
#[derive(Clone)]
pub struct WalletProvider {
    active: Arc<RwLock<Arc<dyn WalletBackend>>>,
}

impl Default for WalletProvider {
    fn default() -> Self {
        Self::new(Arc::new(DisconnectedWallet))
    }
}

impl fmt::Debug for WalletProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletProvider")
            .field("backend", &self.wallet().kind())
            .finish()
    }
}

impl WalletProvider {
    pub fn new(backend: Arc<dyn WalletBackend>) -> Self {
        Self {
            active: Arc::new(RwLock::new(backend)),
        }
    }

    /// Snapshot of the active backend. A request made on the snapshot runs
    /// to completion on it even if the provider is switched meanwhile.
    pub fn wallet(&self) -> Arc<dyn WalletBackend> {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Installs `backend` and returns the one it replaced.
    pub fn replace(&self, backend: Arc<dyn WalletBackend>) -> Arc<dyn WalletBackend> {
        let mut guard = self.active.write().unwrap_or_else(PoisonError::into_inner);
        info!(from = guard.kind(), to = backend.kind(), "switching wallet backend");
        std::mem::replace(&mut *guard, backend)
    }

    /// Swaps in `DisconnectedWallet` and tells the previous backend to disconnect.
    pub fn disconnect(&self) {
        let previous = self.replace(Arc::new(DisconnectedWallet));
        previous.disconnect();
    }

    pub fn is_connected(&self) -> bool {
        self.wallet().is_connected()
    }

    pub fn account_id(&self) -> WalletResult<AccountId> {
        self.wallet().account_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockWallet;
    use crate::{FunctionCallRequest, WalletError};
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    /// Answers its first view only once the test releases it.
    struct GatedWallet {
        label: &'static str,
        gate: Mutex<Option<oneshot::Receiver<()>>>,
    }

    #[async_trait]
    impl WalletBackend for GatedWallet {
        fn kind(&self) -> &'static str {
            self.label
        }

        fn is_connected(&self) -> bool {
            true
        }

        fn account_id(&self) -> WalletResult<AccountId> {
            Ok(format!("{}.testnet", self.label))
        }

        async fn view(
            &self,
            _contract_id: &str,
            _method: &str,
            _args: Value,
        ) -> WalletResult<Value> {
            let gate = self.gate.lock().unwrap().take();
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            Ok(json!(self.label))
        }

        async fn call(&self, _req: FunctionCallRequest) -> WalletResult<Value> {
            Ok(json!(self.label))
        }

        fn disconnect(&self) {}
    }

    #[tokio::test]
    async fn starts_disconnected() {
        let provider = WalletProvider::default();
        assert!(!provider.is_connected());
        assert_eq!(provider.account_id(), Err(WalletError::NotConnected));
        assert_eq!(
            provider.wallet().view("pool.testnet", "status", json!({})).await,
            Err(WalletError::NotConnected)
        );
    }

    #[tokio::test]
    async fn clones_observe_a_replaced_backend() {
        let provider = WalletProvider::default();
        let held_by_proxy = provider.clone();

        provider.replace(Arc::new(MockWallet::connected("alice.testnet")));

        assert!(held_by_proxy.is_connected());
        assert_eq!(held_by_proxy.account_id().unwrap(), "alice.testnet");
    }

    #[tokio::test]
    async fn disconnect_notifies_previous_backend_and_is_idempotent() {
        let provider = WalletProvider::default();
        let wallet = Arc::new(MockWallet::connected("alice.testnet"));
        provider.replace(wallet.clone());

        provider.disconnect();
        provider.disconnect();

        assert!(!provider.is_connected());
        assert_eq!(wallet.disconnects(), 1);
    }

    #[tokio::test]
    async fn swap_does_not_redirect_a_request_in_flight() -> anyhow::Result<()> {
        let (release, gate) = oneshot::channel();
        let old = Arc::new(GatedWallet {
            label: "old",
            gate: Mutex::new(Some(gate)),
        });
        let provider = WalletProvider::new(old);

        let issued = provider.wallet();
        let pending =
            tokio::spawn(async move { issued.view("pool.testnet", "status", json!({})).await });
        tokio::task::yield_now().await;

        provider.replace(Arc::new(GatedWallet {
            label: "new",
            gate: Mutex::new(None),
        }));
        let _ = release.send(());

        assert_eq!(pending.await??, json!("old"));
        assert_eq!(
            provider.wallet().view("pool.testnet", "status", json!({})).await?,
            json!("new")
        );
        Ok(())
    }
}
