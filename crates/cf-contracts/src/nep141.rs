use cf_api_types::{AccountId, FungibleTokenMetadata, U128String};
use cf_units::{ONE_YOCTO, tgas};
use cf_wallet_client::{Gas, WalletProvider, WalletResult};
use serde_json::{Value, json};

use crate::{SmartContract, decode_u128_string};

pub const FT_TRANSFER_CALL_GAS: Gas = tgas(200);

/// NEP-141 fungible token proxy.
#[derive(Debug, Clone)]
pub struct Nep141Token {
    contract: SmartContract,
}

impl Nep141Token {
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

    pub async fn ft_balance_of(&self, account_id: &str) -> WalletResult<U128String> {
        let value = self
            .contract
            .view("ft_balance_of", json!({ "account_id": account_id }))
            .await?;
        decode_u128_string(self.contract_id(), "ft_balance_of", value)
    }

    pub async fn ft_total_supply(&self) -> WalletResult<U128String> {
        let value = self.contract.view("ft_total_supply", json!({})).await?;
        decode_u128_string(self.contract_id(), "ft_total_supply", value)
    }

    pub async fn ft_metadata(&self) -> WalletResult<FungibleTokenMetadata> {
        self.contract.view_as("ft_metadata", json!({})).await
    }

    /// Transfers `amount` to `receiver_id` and lets the receiver act on it
    /// (for a pool: stake it).
    pub async fn ft_transfer_call(
        &self,
        receiver_id: &str,
        amount: &str,
        memo: Option<&str>,
    ) -> WalletResult<Value> {
        self.contract
            .call(
                "ft_transfer_call",
                json!({
                    "receiver_id": receiver_id,
                    "amount": amount,
                    "memo": memo,
                    "msg": "",
                }),
                FT_TRANSFER_CALL_GAS,
                ONE_YOCTO,
            )
            .await
    }
}
