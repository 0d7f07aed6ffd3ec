//! Contract proxies. [`SmartContract`] binds a contract id to the shared
//! [`WalletProvider`]; the typed proxies declare each remote method with its
//! gas budget, deposit and response shape.

mod nep141;
mod staking_pool;

use cf_api_types::{AccountId, U128String};
use cf_wallet_client::{FunctionCallRequest, Gas, WalletError, WalletProvider, WalletResult};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

pub use nep141::{FT_TRANSFER_CALL_GAS, Nep141Token};
pub use staking_pool::{
    CLOSE_GAS, STORAGE_DEPOSIT_AMOUNT, STORAGE_DEPOSIT_GAS, StakingPoolP1, UNSTAKE_GAS,
};

#[derive(Debug, Clone)]
pub struct SmartContract {
    contract_id: AccountId,
    provider: WalletProvider,
}

impl SmartContract {
    pub fn new(contract_id: impl Into<AccountId>, provider: WalletProvider) -> Self {
        Self {
            contract_id: contract_id.into(),
            provider,
        }
    }

    pub fn contract_id(&self) -> &str {
        &self.contract_id
    }

    pub fn provider(&self) -> &WalletProvider {
        &self.provider
    }

    pub async fn view(&self, method: &str, args: Value) -> WalletResult<Value> {
        let wallet = self.provider.wallet();
        if !wallet.is_connected() {
            debug!(contract = %self.contract_id, method, "view refused: not connected");
            return Err(WalletError::NotConnected);
        }
        wallet.view(&self.contract_id, method, args).await
    }

    pub async fn view_as<T: DeserializeOwned>(&self, method: &str, args: Value) -> WalletResult<T> {
        let value = self.view(method, args).await?;
        decode(&self.contract_id, method, value)
    }

    pub async fn call(
        &self,
        method: &str,
        args: Value,
        gas: Gas,
        attached_deposit: &str,
    ) -> WalletResult<Value> {
        let wallet = self.provider.wallet();
        if !wallet.is_connected() {
            debug!(contract = %self.contract_id, method, "call refused: not connected");
            return Err(WalletError::NotConnected);
        }
        wallet
            .call(FunctionCallRequest {
                contract_id: self.contract_id.clone(),
                method: method.to_owned(),
                args,
                gas,
                attached_deposit: attached_deposit.to_owned(),
            })
            .await
    }

    /// Drops whatever backend the shared provider holds.
    pub fn disconnect(&self) {
        self.provider.disconnect();
    }

    fn account_or_connected(&self, account_id: Option<&str>) -> WalletResult<AccountId> {
        match account_id {
            Some(id) => Ok(id.to_owned()),
            None => self.provider.account_id(),
        }
    }
}

pub(crate) fn decode<T: DeserializeOwned>(
    contract_id: &str,
    method: &str,
    value: Value,
) -> WalletResult<T> {
    serde_json::from_value(value)
        .map_err(|err| WalletError::Decode(format!("{contract_id}.{method}: {err}")))
}

/// Amounts must come back as decimal strings; bare JSON numbers lose precision
/// past 2^53 and are refused.
pub(crate) fn decode_u128_string(
    contract_id: &str,
    method: &str,
    value: Value,
) -> WalletResult<U128String> {
    match value {
        Value::String(text) if cf_units::parse_u128(&text).is_ok() => Ok(text),
        other => Err(WalletError::Decode(format!(
            "{contract_id}.{method}: expected a u128 string, got {other}"
        ))),
    }
}
