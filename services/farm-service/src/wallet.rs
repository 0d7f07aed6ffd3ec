use axum::{Json, extract::State};
use cf_api_types::{WalletStatusResponse, WatchWalletRequest};
use cf_farm_core::RefreshSummary;
use cf_wallet_web::{HostedWebWallet, WatchOnlySession};
use std::sync::Arc;
use tracing::info;

use crate::{ApiResult, AppState, bad_request};

pub(crate) async fn status(State(state): State<AppState>) -> Json<WalletStatusResponse> {
    Json(wallet_status(&state))
}

/// Connects a key-less hosted wallet for `account_id`. Views work; stake and
/// unstake are refused by the session.
pub(crate) async fn watch(
    State(state): State<AppState>,
    Json(request): Json<WatchWalletRequest>,
) -> ApiResult<WalletStatusResponse> {
    let account_id = request.account_id.trim();
    if account_id.is_empty() {
        return Err(bad_request("account_id is required"));
    }

    watch_account(&state, account_id).await;
    Ok(Json(wallet_status(&state)))
}

pub(crate) async fn disconnect(State(state): State<AppState>) -> Json<WalletStatusResponse> {
    state.farm.disconnect().await;
    info!("wallet disconnected via api");
    Json(wallet_status(&state))
}

pub(crate) async fn watch_account(state: &AppState, account_id: &str) -> RefreshSummary {
    let session = Arc::new(WatchOnlySession::new(account_id));
    let backend = Arc::new(HostedWebWallet::new(state.rpc.clone(), session));
    let summary = state.farm.connect(backend).await;
    info!(
        account = account_id,
        refreshed = summary.refreshed.len(),
        failed = summary.failed.len(),
        "watching account"
    );
    summary
}

fn wallet_status(state: &AppState) -> WalletStatusResponse {
    let wallet = state.farm.provider().wallet();
    WalletStatusResponse {
        connected: wallet.is_connected(),
        backend: wallet.kind().to_owned(),
        account_id: wallet.account_id().ok(),
    }
}
