use cf_api_types::{AccountId, ContractParams, StorageBalance, U128String};
use cf_units::{ONE_YOCTO, parse_u128, tgas};
use cf_wallet_client::{Gas, WalletError, WalletProvider, WalletResult};
use serde_json::{Value, json};

use crate::{SmartContract, decode_u128_string};

pub const STORAGE_DEPOSIT_GAS: Gas = tgas(25);
/// 0.05 NEAR registration deposit.
pub const STORAGE_DEPOSIT_AMOUNT: &str = "50000000000000000000000";
pub const UNSTAKE_GAS: Gas = tgas(125);
pub const CLOSE_GAS: Gas = tgas(75);

/// Proxy for a cookie-farm staking pool (P1 interface).
#[derive(Debug, Clone)]
pub struct StakingPoolP1 {
    contract: SmartContract,
}

impl StakingPoolP1 {
    pub fn new(contract_id: impl Into<AccountId>, provider: WalletProvider) -> Self {
        Self {
            contract: SmartContract::new(contract_id, provider),
        }
    }

    pub fn contract(&self) -> &SmartContract {
        &self.contract
    }

    pub fn contract_id(&self) -> &str {
        self.contract.contract_id()
    }

    pub async fn get_contract_params(&self) -> WalletResult<ContractParams> {
        let params: ContractParams = self.contract.view_as("get_contract_params", json!({})).await?;
        parse_u128(&params.total_staked).map_err(|err| {
            WalletError::Decode(format!(
                "{}.get_contract_params total_staked: {err}",
                self.contract_id()
            ))
        })?;
        Ok(params)
    }

    /// Staked amount of `account_id`, or of the connected account.
    pub async fn status(&self, account_id: Option<&str>) -> WalletResult<U128String> {
        let account_id = self.contract.account_or_connected(account_id)?;
        let value = self
            .contract
            .view("status", json!({ "account_id": account_id }))
            .await?;
        decode_u128_string(self.contract_id(), "status", value)
    }

    /// `None` when the account is not registered with the pool.
    pub async fn storage_balance_of(
        &self,
        account_id: Option<&str>,
    ) -> WalletResult<Option<StorageBalance>> {
        let account_id = self.contract.account_or_connected(account_id)?;
        let value = self
            .contract
            .view("storage_balance_of", json!({ "account_id": account_id }))
            .await?;
        decode_storage_balance(self.contract_id(), value)
    }

    pub async fn storage_deposit(&self) -> WalletResult<Value> {
        self.contract
            .call("storage_deposit", json!({}), STORAGE_DEPOSIT_GAS, STORAGE_DEPOSIT_AMOUNT)
            .await
    }

    /// Returns staked tokens to the caller. Panics on chain when the caller
    /// has less than `amount` staked.
    pub async fn unstake(&self, amount: &str) -> WalletResult<Value> {
        self.contract
            .call("unstake", json!({ "amount": amount }), UNSTAKE_GAS, ONE_YOCTO)
            .await
    }

    /// Unstakes everything and closes the account.
    pub async fn close(&self) -> WalletResult<Value> {
        self.contract.call("close", json!({}), CLOSE_GAS, ONE_YOCTO).await
    }
}

/// `null` means unregistered. Only a pair of u128 strings counts as a
/// registration; any other shape is a decode error.
fn decode_storage_balance(contract_id: &str, value: Value) -> WalletResult<Option<StorageBalance>> {
    if value.is_null() {
        return Ok(None);
    }
    let malformed = |detail: String| {
        WalletError::Decode(format!("{contract_id}.storage_balance_of: {detail}"))
    };
    let balance: StorageBalance =
        serde_json::from_value(value).map_err(|err| malformed(err.to_string()))?;
    for part in [balance.total(), balance.available()] {
        parse_u128(part).map_err(|err| malformed(err.to_string()))?;
    }
    Ok(Some(balance))
}
