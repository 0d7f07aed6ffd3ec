use cf_api_types::{AccountId, NetworkConfigResponse, TokenKind};
use std::time::Duration;

use crate::FarmError;

pub const STNEAR_POOL_CONTRACT: &str = "cookie-factory-pool-stnear.hardcoder.testnet";
pub const STNEAR_TOKEN_CONTRACT: &str = "meta-v2.pool.testnet";

pub const CHEDDAR_POOL_CONTRACT: &str = "cookie-factory-pool-cheddar.hardcoder.testnet";
pub const CHEDDAR_TOKEN_CONTRACT: &str = "token.cheddar.testnet";

pub const NEXT_POOL_CONTRACT: &str = "cookie-factory-pool-meta.hardcoder.testnet";
pub const NEXT_TOKEN_CONTRACT: &str = "token.meta.pool.testnet";

pub const DEFAULT_NETWORK: &str = "testnet";
pub const DEFAULT_REFRESH_PERIOD: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    pub network_id: String,
    pub node_url: String,
    pub wallet_url: String,
    pub helper_url: Option<String>,
    pub explorer_url: Option<String>,
    pub key_path: Option<String>,
}

impl NetworkConfig {
    /// Endpoints for a network id. Unknown ids are a fatal configuration error.
    pub fn resolve(env: &str) -> Result<Self, FarmError> {
        let near = |network: &str| Self {
            network_id: network.to_owned(),
            node_url: format!("https://rpc.{network}.near.org"),
            wallet_url: format!("https://wallet.{network}.near.org"),
            helper_url: Some(format!("https://helper.{network}.near.org")),
            explorer_url: Some(format!("https://explorer.{network}.near.org")),
            key_path: None,
        };

        match env {
            "production" | "mainnet" => Ok(Self {
                wallet_url: "https://wallet.near.org".to_owned(),
                ..near("mainnet")
            }),
            "development" | "testnet" => Ok(near("testnet")),
            "betanet" => Ok(near("betanet")),
            "local" => Ok(Self {
                network_id: "local".to_owned(),
                node_url: "http://localhost:3030".to_owned(),
                wallet_url: "http://localhost:4000/wallet".to_owned(),
                helper_url: None,
                explorer_url: None,
                key_path: std::env::var("HOME")
                    .ok()
                    .map(|home| format!("{home}/.near/validator_key.json")),
            }),
            other => Err(FarmError::Configuration(format!(
                "unknown environment '{other}'; expected mainnet, testnet, betanet or local"
            ))),
        }
    }

    pub fn to_response(&self) -> NetworkConfigResponse {
        NetworkConfigResponse {
            network_id: self.network_id.clone(),
            node_url: self.node_url.clone(),
            wallet_url: self.wallet_url.clone(),
            helper_url: self.helper_url.clone(),
            explorer_url: self.explorer_url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenConfig {
    pub kind: TokenKind,
    pub pool_contract: AccountId,
    pub token_contract: AccountId,
}

impl TokenConfig {
    pub fn new(kind: TokenKind, pool_contract: &str, token_contract: &str) -> Self {
        Self {
            kind,
            pool_contract: pool_contract.to_owned(),
            token_contract: token_contract.to_owned(),
        }
    }
}

pub fn default_tokens() -> Vec<TokenConfig> {
    vec![
        TokenConfig::new(TokenKind::StNear, STNEAR_POOL_CONTRACT, STNEAR_TOKEN_CONTRACT),
        TokenConfig::new(TokenKind::Cheddar, CHEDDAR_POOL_CONTRACT, CHEDDAR_TOKEN_CONTRACT),
        TokenConfig::new(TokenKind::Next, NEXT_POOL_CONTRACT, NEXT_TOKEN_CONTRACT),
    ]
}

#[derive(Debug, Clone)]
pub struct FarmConfig {
    pub network: NetworkConfig,
    pub tokens: Vec<TokenConfig>,
    pub refresh_period: Duration,
}

impl FarmConfig {
    pub fn for_network(env: &str) -> Result<Self, FarmError> {
        Ok(Self {
            network: NetworkConfig::resolve(env)?,
            tokens: default_tokens(),
            refresh_period: DEFAULT_REFRESH_PERIOD,
        })
    }

    /// Reads `FARM_NETWORK` (default testnet) and `FARM_RPC_URL`.
    pub fn from_env() -> Result<Self, FarmError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, FarmError> {
        let network = lookup("FARM_NETWORK")
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_NETWORK.to_owned());

        let mut config = Self::for_network(&network)?;
        if let Some(rpc_url) = lookup("FARM_RPC_URL").filter(|value| !value.trim().is_empty()) {
            config.network.node_url = rpc_url.trim().trim_end_matches('/').to_owned();
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn known_networks_resolve() {
        let mainnet = NetworkConfig::resolve("mainnet").unwrap();
        assert_eq!(mainnet.node_url, "https://rpc.mainnet.near.org");
        assert_eq!(mainnet.wallet_url, "https://wallet.near.org");
        assert_eq!(NetworkConfig::resolve("production").unwrap(), mainnet);

        let testnet = NetworkConfig::resolve("development").unwrap();
        assert_eq!(testnet.network_id, "testnet");
        assert_eq!(testnet.explorer_url.as_deref(), Some("https://explorer.testnet.near.org"));

        assert_eq!(
            NetworkConfig::resolve("betanet").unwrap().node_url,
            "https://rpc.betanet.near.org"
        );

        let local = NetworkConfig::resolve("local").unwrap();
        assert_eq!(local.node_url, "http://localhost:3030");
        assert!(local.helper_url.is_none());
    }

    #[test]
    fn unknown_network_fails_fast() {
        let err = NetworkConfig::resolve("foo").unwrap_err();
        assert_eq!(err.kind(), "configuration");
        assert!(FarmConfig::for_network("foo").is_err());
    }

    #[test]
    fn env_lookup_applies_defaults_and_overrides() {
        let config = FarmConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.network.network_id, "testnet");
        assert_eq!(config.tokens.len(), 3);
        assert_eq!(config.refresh_period, Duration::from_secs(600));

        let vars: HashMap<&str, &str> = HashMap::from([
            ("FARM_NETWORK", "mainnet"),
            ("FARM_RPC_URL", "https://rpc.example.org/"),
        ]);
        let config = FarmConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();
        assert_eq!(config.network.network_id, "mainnet");
        assert_eq!(config.network.node_url, "https://rpc.example.org");

        let bad = FarmConfig::from_lookup(|key| (key == "FARM_NETWORK").then(|| "foo".to_owned()));
        assert!(matches!(bad, Err(FarmError::Configuration(_))));
    }
}
