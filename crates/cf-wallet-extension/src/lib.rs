//! Browser-extension wallet backend.
//!
//! The extension is reached through an [`ExtensionBridge`]: requests are
//! tagged with a uuid and answered asynchronously, the way a page talks to an
//! extension over window messages. Connection changes arrive as two named
//! events, turned into [`WalletEvent`]s by [`translate_event`].

mod bridge;

use async_trait::async_trait;
use cf_api_types::AccountId;
use cf_wallet_client::{FunctionCallRequest, WalletBackend, WalletError, WalletEvent, WalletResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub use bridge::{BridgeMessage, BridgeReply, ChannelBridge, ExtensionEndpoint, IncomingRequest};

pub const EXTENSION_WALLET: &str = "extension";
pub const CONNECTED_EVENT: &str = "wallet-connected";
pub const DISCONNECTED_EVENT: &str = "wallet-disconnected";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionCallAction {
    pub method_name: String,
    pub args: Value,
    /// u64 gas as a decimal string.
    pub gas: String,
    pub attached_deposit: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "code", rename_all = "kebab-case")]
pub enum BridgeRequest {
    SetNetwork {
        network: String,
    },
    View {
        contract: String,
        method: String,
        args: Value,
    },
    Apply {
        signer: AccountId,
        contract: String,
        actions: Vec<FunctionCallAction>,
    },
    Disconnect,
}

#[async_trait]
pub trait ExtensionBridge: Send + Sync {
    /// Sends a request and waits for the extension's answer.
    async fn request(&self, request: BridgeRequest) -> WalletResult<Value>;

    /// Fire-and-forget message; failures are logged, never returned.
    fn notify(&self, request: BridgeRequest);
}

/// Tells the extension which network the page operates on.
pub fn set_network(bridge: &dyn ExtensionBridge, network: &str) {
    bridge.notify(BridgeRequest::SetNetwork {
        network: network.to_owned(),
    });
}

pub struct ExtensionWallet {
    account_id: AccountId,
    network: String,
    bridge: Arc<dyn ExtensionBridge>,
    connected: AtomicBool,
}

impl ExtensionWallet {
    pub fn new(
        account_id: impl Into<AccountId>,
        network: impl Into<String>,
        bridge: Arc<dyn ExtensionBridge>,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            network: network.into(),
            bridge,
            connected: AtomicBool::new(true),
        }
    }

    pub fn network(&self) -> &str {
        &self.network
    }
}

#[async_trait]
impl WalletBackend for ExtensionWallet {
    fn kind(&self) -> &'static str {
        EXTENSION_WALLET
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn account_id(&self) -> WalletResult<AccountId> {
        if self.is_connected() && !self.account_id.is_empty() {
            Ok(self.account_id.clone())
        } else {
            Err(WalletError::NotConnected)
        }
    }

    async fn view(&self, contract_id: &str, method: &str, args: Value) -> WalletResult<Value> {
        let request = BridgeRequest::View {
            contract: contract_id.to_owned(),
            method: method.to_owned(),
            args,
        };
        self.bridge.request(request).await.map_err(|err| match err {
            WalletError::Rejected(message) => WalletError::Rpc {
                contract_id: contract_id.to_owned(),
                method: method.to_owned(),
                message,
            },
            other => other,
        })
    }

    async fn call(&self, req: FunctionCallRequest) -> WalletResult<Value> {
        let signer = self.account_id()?;
        debug!(contract = %req.contract_id, method = %req.method, "extension apply request");
        self.bridge
            .request(BridgeRequest::Apply {
                signer,
                contract: req.contract_id,
                actions: vec![FunctionCallAction {
                    method_name: req.method,
                    args: req.args,
                    gas: req.gas.to_string(),
                    attached_deposit: req.attached_deposit,
                }],
            })
            .await
    }

    fn disconnect(&self) {
        if self.connected.swap(false, Ordering::SeqCst) {
            self.bridge.notify(BridgeRequest::Disconnect);
        }
    }
}

/// Named event raised by the extension.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtensionEvent {
    pub name: String,
    #[serde(default)]
    pub account_id: Option<AccountId>,
}

impl ExtensionEvent {
    pub fn connected(account_id: &str) -> Self {
        Self {
            name: CONNECTED_EVENT.to_owned(),
            account_id: Some(account_id.to_owned()),
        }
    }

    pub fn disconnected() -> Self {
        Self {
            name: DISCONNECTED_EVENT.to_owned(),
            account_id: None,
        }
    }
}

pub fn translate_event(
    bridge: &Arc<dyn ExtensionBridge>,
    network: &str,
    event: ExtensionEvent,
) -> Option<WalletEvent> {
    match event.name.as_str() {
        CONNECTED_EVENT => {
            let Some(account_id) = event.account_id.filter(|id| !id.is_empty()) else {
                warn!("{CONNECTED_EVENT} without an account id, ignored");
                return None;
            };
            let backend = Arc::new(ExtensionWallet::new(
                account_id.clone(),
                network,
                bridge.clone(),
            ));
            Some(WalletEvent::Connected { backend, account_id })
        }
        DISCONNECTED_EVENT => Some(WalletEvent::Disconnected),
        other => {
            warn!("unknown extension event '{other}', ignored");
            None
        }
    }
}

/// Pumps extension events into wallet events until either side closes.
pub async fn forward_events(
    mut events: mpsc::Receiver<ExtensionEvent>,
    bridge: Arc<dyn ExtensionBridge>,
    network: String,
    wallet_events: mpsc::Sender<WalletEvent>,
) {
    while let Some(event) = events.recv().await {
        let Some(translated) = translate_event(&bridge, &network, event) else {
            continue;
        };
        if wallet_events.send(translated).await.is_err() {
            break;
        }
    }
    info!("extension event stream closed");
}
