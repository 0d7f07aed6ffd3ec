mod tokens;
mod wallet;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use cf_api_types::{NetworkConfigResponse, Notification};
use cf_farm_core::{FarmConfig, FarmError, MemoryNotifier, StakingFarm};
use cf_wallet_client::WalletProvider;
use cf_wallet_web::NearRpcClient;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

const SERVICE: &str = "farm-service";
const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
const NOTIFICATION_HISTORY: usize = 50;

#[derive(Debug, Serialize)]
struct HealthResponse {
    service: &'static str,
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct VersionResponse {
    service: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorResponse {
    error: String,
    kind: &'static str,
}

pub(crate) type ApiError = (StatusCode, Json<ErrorResponse>);
pub(crate) type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Clone)]
pub(crate) struct AppState {
    farm: Arc<StakingFarm>,
    notifier: Arc<MemoryNotifier>,
    config: Arc<FarmConfig>,
    rpc: NearRpcClient,
}

impl AppState {
    fn new(config: FarmConfig) -> Self {
        let notifier = Arc::new(MemoryNotifier::new(NOTIFICATION_HISTORY));
        let farm = StakingFarm::from_config(&config, WalletProvider::default(), notifier.clone());
        let rpc = NearRpcClient::new(config.network.node_url.clone());
        Self {
            farm: Arc::new(farm),
            notifier,
            config: Arc::new(config),
            rpc,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = FarmConfig::from_env()?;
    info!(
        network = %config.network.network_id,
        node = %config.network.node_url,
        tokens = config.tokens.len(),
        "configuration loaded"
    );
    let state = AppState::new(config);

    if let Some(account_id) = env_value("FARM_ACCOUNT_ID") {
        wallet::watch_account(&state, &account_id).await;
    }

    let addr: SocketAddr = env_value("FARM_LISTEN_ADDR")
        .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_owned())
        .parse()?;
    info!("{} listening on {}", SERVICE, addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.farm.stop_auto_refresh();
    info!("{} stopped", SERVICE);
    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
        .route("/config", get(network_config))
        .route("/notifications", get(notifications))
        .route("/refresh", post(tokens::refresh))
        .route("/tokens", get(tokens::list_tokens))
        .route("/tokens/{token}", get(tokens::get_token))
        .route("/tokens/{token}/stake", post(tokens::stake))
        .route("/tokens/{token}/unstake", post(tokens::unstake))
        .route("/tokens/{token}/activate", post(tokens::activate))
        .route("/tokens/{token}/close", post(tokens::close))
        .route("/wallet", get(wallet::status))
        .route("/wallet/watch", post(wallet::watch))
        .route("/wallet/disconnect", post(wallet::disconnect))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for ctrl-c: {}", err);
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        service: SERVICE,
        status: "ok",
    })
}

async fn version() -> Json<VersionResponse> {
    Json(VersionResponse {
        service: SERVICE,
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn network_config(State(state): State<AppState>) -> Json<NetworkConfigResponse> {
    Json(state.config.network.to_response())
}

async fn notifications(State(state): State<AppState>) -> Json<Vec<Notification>> {
    Json(state.notifier.recent())
}

pub(crate) fn bad_request(message: &str) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_owned(),
            kind: "validation",
        }),
    )
}

pub(crate) fn farm_error(err: FarmError) -> ApiError {
    let status = match &err {
        FarmError::Validation(_) => StatusCode::BAD_REQUEST,
        FarmError::NotConnected | FarmError::NotReady(_) => StatusCode::CONFLICT,
        FarmError::ChainCall(_) => StatusCode::BAD_GATEWAY,
        FarmError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            kind: err.kind(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, Response};
    use cf_api_types::{ActionResponse, RefreshPhase, TokenStateResponse, WalletStatusResponse};
    use cf_farm_core::{CHEDDAR_POOL_CONTRACT, CHEDDAR_TOKEN_CONTRACT};
    use cf_wallet_client::mock::MockWallet;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn test_state() -> anyhow::Result<AppState> {
        let mut config = FarmConfig::for_network("testnet")?;
        // nothing listens on the discard port, so RPC views fail fast
        config.network.node_url = "http://127.0.0.1:9".to_owned();
        Ok(AppState::new(config))
    }

    fn scripted_cheddar(account_id: &str) -> Arc<MockWallet> {
        let wallet = Arc::new(MockWallet::connected(account_id));
        wallet.respond(CHEDDAR_TOKEN_CONTRACT, "ft_balance_of", json!("20000000"));
        wallet.respond(
            CHEDDAR_TOKEN_CONTRACT,
            "ft_metadata",
            json!({ "spec": "ft-1.0.0", "name": "Cheddar", "symbol": "cheddar", "decimals": 6 }),
        );
        wallet.respond(CHEDDAR_POOL_CONTRACT, "storage_balance_of", json!(["1", "0"]));
        wallet.respond(CHEDDAR_POOL_CONTRACT, "status", json!("3000000"));
        wallet.respond(
            CHEDDAR_POOL_CONTRACT,
            "get_contract_params",
            json!({
                "owner_id": "owner.testnet",
                "token_contract": CHEDDAR_TOKEN_CONTRACT,
                "is_active": true,
                "total_staked": "100000000",
                "closing_date": "2026-12-31",
            }),
        );
        wallet
    }

    async fn send(
        state: &AppState,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> anyhow::Result<Response<Body>> {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))?,
            None => request.body(Body::empty())?,
        };
        Ok(router(state.clone()).oneshot(request).await?)
    }

    async fn json_body<T: serde::de::DeserializeOwned>(
        response: Response<Body>,
    ) -> anyhow::Result<T> {
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    #[tokio::test]
    async fn health_reports_ok() -> anyhow::Result<()> {
        let state = test_state()?;
        let response = send(&state, "GET", "/health", None).await?;
        assert_eq!(response.status(), StatusCode::OK);

        let body: Value = json_body(response).await?;
        assert_eq!(body, json!({ "service": "farm-service", "status": "ok" }));
        Ok(())
    }

    #[tokio::test]
    async fn config_exposes_the_network() -> anyhow::Result<()> {
        let state = test_state()?;
        let response = send(&state, "GET", "/config", None).await?;
        let body: NetworkConfigResponse = json_body(response).await?;
        assert_eq!(body.network_id, "testnet");
        assert_eq!(body.node_url, "http://127.0.0.1:9");
        Ok(())
    }

    #[tokio::test]
    async fn unknown_token_is_a_bad_request() -> anyhow::Result<()> {
        let state = test_state()?;
        let response = send(&state, "GET", "/tokens/doge", None).await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body: Value = json_body(response).await?;
        assert_eq!(body["kind"], "validation");
        Ok(())
    }

    #[tokio::test]
    async fn refresh_without_wallet_resets_every_token() -> anyhow::Result<()> {
        let state = test_state()?;
        let response = send(&state, "POST", "/refresh", None).await?;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(&state, "GET", "/tokens", None).await?;
        let tokens: Vec<TokenStateResponse> = json_body(response).await?;
        assert_eq!(tokens.len(), 3);
        assert!(tokens.iter().all(|t| t.phase == RefreshPhase::Disconnected));
        assert!(tokens.iter().all(|t| t.metadata.is_none()));
        Ok(())
    }

    #[tokio::test]
    async fn stake_before_loading_conflicts() -> anyhow::Result<()> {
        let state = test_state()?;
        let response = send(
            &state,
            "POST",
            "/tokens/cheddar/stake",
            Some(json!({ "amount": "5" })),
        )
        .await?;
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body: Value = json_body(response).await?;
        assert_eq!(body["kind"], "not_ready");
        Ok(())
    }

    #[tokio::test]
    async fn stake_and_unstake_through_the_api() -> anyhow::Result<()> {
        let state = test_state()?;
        let wallet = scripted_cheddar("alice.testnet");
        state.farm.connect(wallet.clone()).await;

        let response = send(
            &state,
            "POST",
            "/tokens/cheddar/stake",
            Some(json!({ "amount": "5" })),
        )
        .await?;
        assert_eq!(response.status(), StatusCode::OK);
        let body: ActionResponse = json_body(response).await?;
        assert_eq!(body.action, "stake");
        assert_eq!(body.amount, "5");
        assert_eq!(body.base_amount, "5000000");

        let response = send(
            &state,
            "POST",
            "/tokens/cheddar/unstake",
            Some(json!({ "amount": "0" })),
        )
        .await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let methods: Vec<String> = wallet
            .function_calls()
            .into_iter()
            .map(|call| call.method)
            .collect();
        assert_eq!(methods, ["ft_transfer_call"]);

        let notes: Vec<Notification> =
            json_body(send(&state, "GET", "/notifications", None).await?).await?;
        assert!(notes.iter().any(|n| n.message == "Staked 5 CHEDDAR"));
        assert!(notes.iter().any(|n| n.title == "Unstake"));

        state.farm.disconnect().await;
        Ok(())
    }

    #[tokio::test]
    async fn rejected_signature_maps_to_bad_gateway() -> anyhow::Result<()> {
        let state = test_state()?;
        let wallet = scripted_cheddar("alice.testnet");
        wallet.fail(
            CHEDDAR_POOL_CONTRACT,
            "unstake",
            cf_wallet_client::WalletError::Rejected("user cancelled".to_owned()),
        );
        state.farm.connect(wallet).await;

        let response = send(
            &state,
            "POST",
            "/tokens/cheddar/unstake",
            Some(json!({ "amount": "1" })),
        )
        .await?;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body: Value = json_body(response).await?;
        assert_eq!(body["kind"], "chain_call");

        state.farm.disconnect().await;
        Ok(())
    }

    #[tokio::test]
    async fn watch_and_disconnect_swap_the_backend() -> anyhow::Result<()> {
        let state = test_state()?;

        let blank = json!({ "account_id": "  " });
        let response = send(&state, "POST", "/wallet/watch", Some(blank)).await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(
            &state,
            "POST",
            "/wallet/watch",
            Some(json!({ "account_id": "alice.testnet" })),
        )
        .await?;
        assert_eq!(response.status(), StatusCode::OK);
        let status: WalletStatusResponse = json_body(response).await?;
        assert!(status.connected);
        assert_eq!(status.backend, cf_wallet_web::WEB_WALLET);
        assert_eq!(status.account_id.as_deref(), Some("alice.testnet"));

        let status: WalletStatusResponse =
            json_body(send(&state, "POST", "/wallet/disconnect", None).await?).await?;
        assert!(!status.connected);
        assert_eq!(status.account_id, None);
        assert!(!state.farm.is_auto_refreshing());
        Ok(())
    }
}
