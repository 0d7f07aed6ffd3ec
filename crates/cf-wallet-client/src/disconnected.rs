use async_trait::async_trait;
use cf_api_types::AccountId;
use serde_json::Value;

use crate::{FunctionCallRequest, WalletBackend, WalletError, WalletResult};

/// Backend in place before any wallet connects and after a disconnect.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisconnectedWallet;

#[async_trait]
impl WalletBackend for DisconnectedWallet {
    fn kind(&self) -> &'static str {
        "disconnected"
    }

    fn is_connected(&self) -> bool {
        false
    }

    fn account_id(&self) -> WalletResult<AccountId> {
        Err(WalletError::NotConnected)
    }

    async fn view(&self, _contract_id: &str, _method: &str, _args: Value) -> WalletResult<Value> {
        Err(WalletError::NotConnected)
    }

    async fn call(&self, _req: FunctionCallRequest) -> WalletResult<Value> {
        Err(WalletError::NotConnected)
    }

    fn disconnect(&self) {}
}
