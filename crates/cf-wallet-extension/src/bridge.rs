use async_trait::async_trait;
use cf_wallet_client::{WalletError, WalletResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::warn;
use uuid::Uuid;

use crate::{BridgeRequest, ExtensionBridge};

/// Envelope for a page-to-extension message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BridgeMessage {
    pub id: Uuid,
    pub dest: String,
    #[serde(flatten)]
    pub request: BridgeRequest,
}

impl BridgeMessage {
    pub fn new(request: BridgeRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            dest: "ext".to_owned(),
            request,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BridgeReply {
    pub id: Uuid,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub err: Option<String>,
}

/// A message as seen by the extension side.
pub struct IncomingRequest {
    pub message: BridgeMessage,
    reply: Option<oneshot::Sender<BridgeReply>>,
}

impl IncomingRequest {
    pub fn expects_reply(&self) -> bool {
        self.reply.is_some()
    }

    pub fn respond(self, result: Result<Value, String>) {
        let Some(reply) = self.reply else {
            return;
        };
        let (data, err) = match result {
            Ok(data) => (Some(data), None),
            Err(err) => (None, Some(err)),
        };
        let _ = reply.send(BridgeReply {
            id: self.message.id,
            data,
            err,
        });
    }
}

/// In-process bridge over tokio channels.
pub struct ChannelBridge {
    outbound: mpsc::Sender<IncomingRequest>,
}

pub struct ExtensionEndpoint {
    inbound: mpsc::Receiver<IncomingRequest>,
}

impl ExtensionEndpoint {
    pub async fn recv(&mut self) -> Option<IncomingRequest> {
        self.inbound.recv().await
    }
}

impl ChannelBridge {
    pub fn new(capacity: usize) -> (Self, ExtensionEndpoint) {
        let (outbound, inbound) = mpsc::channel(capacity);
        (Self { outbound }, ExtensionEndpoint { inbound })
    }
}

#[async_trait]
impl ExtensionBridge for ChannelBridge {
    async fn request(&self, request: BridgeRequest) -> WalletResult<Value> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let message = BridgeMessage::new(request);
        let id = message.id;

        self.outbound
            .send(IncomingRequest {
                message,
                reply: Some(reply_tx),
            })
            .await
            .map_err(|_| WalletError::Transport("extension bridge closed".to_owned()))?;

        let reply = reply_rx
            .await
            .map_err(|_| WalletError::Transport(format!("extension dropped request {id}")))?;

        if reply.id != id {
            return Err(WalletError::Decode(format!(
                "reply {} does not match request {id}",
                reply.id
            )));
        }

        match reply.err {
            Some(err) => Err(WalletError::Rejected(err)),
            None => Ok(reply.data.unwrap_or(Value::Null)),
        }
    }

    fn notify(&self, request: BridgeRequest) {
        let message = BridgeMessage::new(request);
        if let Err(err) = self.outbound.try_send(IncomingRequest {
            message,
            reply: None,
        }) {
            warn!("extension notification dropped: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn message_is_flat_json_with_a_code_tag() {
        let message = BridgeMessage::new(BridgeRequest::View {
            contract: "pool.testnet".to_owned(),
            method: "status".to_owned(),
            args: json!({ "account_id": "a.testnet" }),
        });
        let encoded = serde_json::to_value(&message).unwrap();

        assert_eq!(encoded["dest"], "ext");
        assert_eq!(encoded["code"], "view");
        assert_eq!(encoded["method"], "status");

        let decoded: BridgeMessage = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, message);
    }

    #[tokio::test]
    async fn rejected_apply_is_reported_as_rejection() {
        let (bridge, mut endpoint) = ChannelBridge::new(1);
        tokio::spawn(async move {
            if let Some(incoming) = endpoint.recv().await {
                assert!(incoming.expects_reply());
                incoming.respond(Err("User rejected the transaction".to_owned()));
            }
        });

        let err = bridge.request(BridgeRequest::Disconnect).await.unwrap_err();
        assert_eq!(err, WalletError::Rejected("User rejected the transaction".to_owned()));
    }

    #[tokio::test]
    async fn dropped_request_is_a_transport_error() {
        let (bridge, mut endpoint) = ChannelBridge::new(1);
        tokio::spawn(async move {
            let _ = endpoint.recv().await;
        });

        let err = bridge.request(BridgeRequest::Disconnect).await.unwrap_err();
        assert!(matches!(err, WalletError::Transport(_)));
    }

    #[tokio::test]
    async fn closed_bridge_is_a_transport_error() {
        let (bridge, endpoint) = ChannelBridge::new(1);
        drop(endpoint);

        let err = bridge.request(BridgeRequest::Disconnect).await.unwrap_err();
        assert_eq!(err, WalletError::Transport("extension bridge closed".to_owned()));
    }
}
