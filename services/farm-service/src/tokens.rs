use axum::{
    Json,
    extract::{Path, State},
};
use cf_api_types::{ActionResponse, AmountRequest, RefreshResponse, TokenKind, TokenStateResponse};
use cf_farm_core::ActionReceipt;

use crate::{ApiError, ApiResult, AppState, bad_request, farm_error};

pub(crate) async fn list_tokens(State(state): State<AppState>) -> Json<Vec<TokenStateResponse>> {
    Json(state.farm.describe_all().await)
}

pub(crate) async fn get_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> ApiResult<TokenStateResponse> {
    let kind = parse_token(&token)?;
    state.farm.describe(kind).await.map(Json).map_err(farm_error)
}

pub(crate) async fn refresh(State(state): State<AppState>) -> Json<RefreshResponse> {
    let summary = state.farm.refresh().await;
    Json(RefreshResponse {
        refreshed: summary.refreshed,
        failed: summary.failed.into_iter().map(|(kind, _)| kind).collect(),
    })
}

pub(crate) async fn stake(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(request): Json<AmountRequest>,
) -> ApiResult<ActionResponse> {
    let kind = parse_token(&token)?;
    let receipt = state
        .farm
        .stake(kind, &request.amount)
        .await
        .map_err(farm_error)?;
    Ok(Json(action_response(receipt)))
}

pub(crate) async fn unstake(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(request): Json<AmountRequest>,
) -> ApiResult<ActionResponse> {
    let kind = parse_token(&token)?;
    let receipt = state
        .farm
        .unstake(kind, &request.amount)
        .await
        .map_err(farm_error)?;
    Ok(Json(action_response(receipt)))
}

pub(crate) async fn activate(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> ApiResult<ActionResponse> {
    let kind = parse_token(&token)?;
    let receipt = state.farm.activate(kind).await.map_err(farm_error)?;
    Ok(Json(action_response(receipt)))
}

pub(crate) async fn close(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> ApiResult<ActionResponse> {
    let kind = parse_token(&token)?;
    let receipt = state.farm.close(kind).await.map_err(farm_error)?;
    Ok(Json(action_response(receipt)))
}

fn parse_token(raw: &str) -> Result<TokenKind, ApiError> {
    raw.parse().map_err(|err: String| bad_request(&err))
}

fn action_response(receipt: ActionReceipt) -> ActionResponse {
    ActionResponse {
        token: receipt.token,
        action: receipt.action.as_str().to_owned(),
        amount: receipt.amount,
        base_amount: receipt.base_amount,
    }
}
