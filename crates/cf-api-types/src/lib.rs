use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// NEAR account id, e.g. `alice.testnet`.
pub type AccountId = String;

/// u128 amount serialized as a decimal string to survive JSON number limits.
pub type U128String = String;

/// Tokens with a cookie-farm pool.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    StNear,
    Cheddar,
    Next,
}

impl TokenKind {
    pub const ALL: [TokenKind; 3] = [TokenKind::StNear, TokenKind::Cheddar, TokenKind::Next];

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::StNear => "st_near",
            TokenKind::Cheddar => "cheddar",
            TokenKind::Next => "next",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "st_near" | "stnear" => Ok(TokenKind::StNear),
            "cheddar" => Ok(TokenKind::Cheddar),
            "next" => Ok(TokenKind::Next),
            other => Err(format!("unknown token '{other}'")),
        }
    }
}

/// Pool parameters as returned by `get_contract_params`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContractParams {
    pub owner_id: AccountId,
    pub token_contract: AccountId,
    pub is_active: bool,
    pub total_staked: U128String,
    pub closing_date: String,
}

/// NEP-148 metadata returned by `ft_metadata`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FungibleTokenMetadata {
    pub spec: String,
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub reference_hash: Option<String>,
    pub decimals: u8,
}

/// `[total, available]` pair from the pool's `storage_balance_of`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageBalance(pub U128String, pub U128String);

impl StorageBalance {
    pub fn total(&self) -> &str {
        &self.0
    }

    pub fn available(&self) -> &str {
        &self.1
    }
}

// ── farm-service wire types ──

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RefreshPhase {
    Uninitialized,
    Loading,
    Ready,
    Disconnected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenStateResponse {
    pub token: TokenKind,
    pub pool_contract: AccountId,
    pub token_contract: AccountId,
    pub phase: RefreshPhase,
    pub registered: bool,
    pub wallet_balance: U128String,
    pub account_staked: U128String,
    pub pool_params: ContractParams,
    pub metadata: Option<FungibleTokenMetadata>,
    pub staked_local: Option<U128String>,
    pub form_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmountRequest {
    pub amount: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResponse {
    pub token: TokenKind,
    pub action: String,
    pub amount: String,
    pub base_amount: U128String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchWalletRequest {
    pub account_id: AccountId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletStatusResponse {
    pub connected: bool,
    pub backend: String,
    pub account_id: Option<AccountId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub refreshed: Vec<TokenKind>,
    pub failed: Vec<TokenKind>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfigResponse {
    pub network_id: String,
    pub node_url: String,
    pub wallet_url: String,
    pub helper_url: Option<String>,
    pub explorer_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_balance_is_a_json_pair() {
        let parsed: StorageBalance = serde_json::from_str(r#"["100","40"]"#).unwrap();
        assert_eq!(parsed.total(), "100");
        assert_eq!(parsed.available(), "40");
    }

    #[test]
    fn token_kind_parses_ui_spellings() {
        assert_eq!("stNear".parse::<TokenKind>(), Ok(TokenKind::StNear));
        assert_eq!("cheddar".parse::<TokenKind>(), Ok(TokenKind::Cheddar));
        assert!("doge".parse::<TokenKind>().is_err());
    }

    #[test]
    fn metadata_tolerates_missing_optional_fields() {
        let raw = r#"{"spec":"ft-1.0.0","name":"Cheddar","symbol":"CHEDDAR","decimals":24}"#;
        let meta: FungibleTokenMetadata = serde_json::from_str(raw).unwrap();
        assert_eq!(meta.decimals, 24);
        assert!(meta.icon.is_none());
    }
}
