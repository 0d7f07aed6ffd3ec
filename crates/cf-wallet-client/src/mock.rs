//! Scriptable in-memory backend for tests of code built on `WalletBackend`.

use async_trait::async_trait;
use cf_api_types::AccountId;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::{FunctionCallRequest, WalletBackend, WalletError, WalletResult};

#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    View {
        contract_id: String,
        method: String,
        args: Value,
    },
    Call(FunctionCallRequest),
}

impl RecordedCall {
    pub fn method(&self) -> &str {
        match self {
            RecordedCall::View { method, .. } => method,
            RecordedCall::Call(req) => &req.method,
        }
    }
}

/// Views answer from a `(contract, method)` table and fail when nothing is
/// scripted. Calls succeed with `null` unless scripted otherwise.
#[derive(Default)]
pub struct MockWallet {
    account_id: Option<AccountId>,
    responses: Mutex<HashMap<(String, String), WalletResult<Value>>>,
    calls: Mutex<Vec<RecordedCall>>,
    disconnects: AtomicUsize,
}

impl MockWallet {
    pub fn connected(account_id: &str) -> Self {
        Self {
            account_id: Some(account_id.to_owned()),
            ..Self::default()
        }
    }

    pub fn respond(&self, contract_id: &str, method: &str, value: Value) {
        self.script(contract_id, method, Ok(value));
    }

    pub fn fail(&self, contract_id: &str, method: &str, err: WalletError) {
        self.script(contract_id, method, Err(err));
    }

    fn script(&self, contract_id: &str, method: &str, result: WalletResult<Value>) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((contract_id.to_owned(), method.to_owned()), result);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear_calls(&self) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Recorded state-changing calls only.
    pub fn function_calls(&self) -> Vec<FunctionCallRequest> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                RecordedCall::Call(req) => Some(req),
                RecordedCall::View { .. } => None,
            })
            .collect()
    }

    pub fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }

    fn scripted(&self, contract_id: &str, method: &str) -> Option<WalletResult<Value>> {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(contract_id.to_owned(), method.to_owned()))
            .cloned()
    }

    fn record(&self, call: RecordedCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }
}

#[async_trait]
impl WalletBackend for MockWallet {
    fn kind(&self) -> &'static str {
        "mock"
    }

    fn is_connected(&self) -> bool {
        self.account_id.is_some()
    }

    fn account_id(&self) -> WalletResult<AccountId> {
        self.account_id.clone().ok_or(WalletError::NotConnected)
    }

    async fn view(&self, contract_id: &str, method: &str, args: Value) -> WalletResult<Value> {
        self.record(RecordedCall::View {
            contract_id: contract_id.to_owned(),
            method: method.to_owned(),
            args,
        });
        self.scripted(contract_id, method).unwrap_or_else(|| {
            Err(WalletError::Rpc {
                contract_id: contract_id.to_owned(),
                method: method.to_owned(),
                message: "no scripted response".to_owned(),
            })
        })
    }

    async fn call(&self, req: FunctionCallRequest) -> WalletResult<Value> {
        let scripted = self.scripted(&req.contract_id, &req.method);
        self.record(RecordedCall::Call(req));
        scripted.unwrap_or(Ok(Value::Null))
    }

    fn disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
    }
}
