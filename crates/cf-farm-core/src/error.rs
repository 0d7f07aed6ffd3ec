use cf_units::UnitsError;
use cf_wallet_client::WalletError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FarmError {
    #[error("wallet not connected")]
    NotConnected,
    #[error("not ready: {0}")]
    NotReady(String),
    #[error("{0}")]
    Validation(String),
    #[error("chain call failed: {0}")]
    ChainCall(#[source] WalletError),
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl FarmError {
    pub fn kind(&self) -> &'static str {
        match self {
            FarmError::NotConnected => "not_connected",
            FarmError::NotReady(_) => "not_ready",
            FarmError::Validation(_) => "validation",
            FarmError::ChainCall(_) => "chain_call",
            FarmError::Configuration(_) => "configuration",
        }
    }
}

impl From<WalletError> for FarmError {
    fn from(err: WalletError) -> Self {
        match err {
            WalletError::NotConnected => FarmError::NotConnected,
            other => FarmError::ChainCall(other),
        }
    }
}

impl From<UnitsError> for FarmError {
    fn from(err: UnitsError) -> Self {
        FarmError::Validation(err.to_string())
    }
}
