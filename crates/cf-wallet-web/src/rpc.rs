use base64::{Engine as _, engine::general_purpose::STANDARD};
use cf_wallet_client::{WalletError, WalletResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Minimal NEAR JSON-RPC client: read-only `call_function` queries.
///
/// Request timeouts are whatever the supplied `reqwest::Client` enforces.
#[derive(Clone)]
pub struct NearRpcClient {
    endpoint: String,
    http: reqwest::Client,
}

impl NearRpcClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(endpoint, reqwest::Client::new())
    }

    pub fn with_client(endpoint: impl Into<String>, http: reqwest::Client) -> Self {
        let endpoint: String = endpoint.into();
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn view_function(
        &self,
        contract_id: &str,
        method: &str,
        args: &Value,
    ) -> WalletResult<Value> {
        let body = view_request(contract_id, method, args)?;

        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|err| WalletError::Transport(format!("{contract_id}.{method}: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(WalletError::Transport(format!(
                "{contract_id}.{method}: HTTP {status}: {text}"
            )));
        }

        let parsed: RpcResponse = response
            .json()
            .await
            .map_err(|err| WalletError::Decode(format!("{contract_id}.{method}: {err}")))?;

        decode_view_response(contract_id, method, parsed)
    }
}

// ── JSON-RPC wire types ──

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: &'static str,
    method: &'static str,
    params: CallFunctionParams<'a>,
}

#[derive(Debug, Serialize)]
struct CallFunctionParams<'a> {
    request_type: &'static str,
    finality: &'static str,
    account_id: &'a str,
    method_name: &'a str,
    args_base64: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RpcResponse {
    #[serde(default)]
    result: Option<CallFunctionResult>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct CallFunctionResult {
    #[serde(default)]
    result: Vec<u8>,
    #[serde(default)]
    logs: Vec<String>,
    /// Older nodes report contract panics here instead of in `error`.
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    cause: Option<RpcErrorCause>,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorCause {
    name: String,
}

fn view_request<'a>(
    contract_id: &'a str,
    method: &'a str,
    args: &Value,
) -> WalletResult<RpcRequest<'a>> {
    let encoded = if args.is_null() {
        b"{}".to_vec()
    } else {
        serde_json::to_vec(args).map_err(|err| WalletError::Decode(err.to_string()))?
    };

    Ok(RpcRequest {
        jsonrpc: "2.0",
        id: "dontcare",
        method: "query",
        params: CallFunctionParams {
            request_type: "call_function",
            finality: "final",
            account_id: contract_id,
            method_name: method,
            args_base64: STANDARD.encode(encoded),
        },
    })
}

pub(crate) fn decode_view_response(
    contract_id: &str,
    method: &str,
    response: RpcResponse,
) -> WalletResult<Value> {
    let rpc_error = |message: String| WalletError::Rpc {
        contract_id: contract_id.to_owned(),
        method: method.to_owned(),
        message,
    };

    if let Some(error) = response.error {
        let kind = error
            .cause
            .map(|cause| cause.name)
            .or(error.name)
            .unwrap_or_else(|| "RPC_ERROR".to_owned());
        let detail = match error.data {
            Some(Value::String(text)) => text,
            Some(other) => other.to_string(),
            None => error.message.unwrap_or_default(),
        };
        return Err(rpc_error(format!("{kind}: {detail}")));
    }

    let Some(result) = response.result else {
        return Err(WalletError::Decode(format!(
            "{contract_id}.{method}: response has neither result nor error"
        )));
    };

    if let Some(message) = result.error {
        return Err(rpc_error(message));
    }

    for line in &result.logs {
        debug!(contract = contract_id, method, "log: {line}");
    }

    if result.result.is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_slice(&result.result)
        .map_err(|err| WalletError::Decode(format!("{contract_id}.{method}: {err}")))
}
