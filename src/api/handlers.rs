use std::sync::Arc;

use axum::extract::{Extension, Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::auth::AuthUser;
use crate::api::response::{ApiError, ApiResponse};
use crate::models::OrderSpec;
use crate::AppState;

pub async fn submit_order(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(spec): Json<OrderSpec>,
) -> Result<Json<ApiResponse<crate::models::OrderResponse>>, ApiError> {
    let order_id = state.matching_engine.submit(user.user_id, spec).await?;
    Ok(ApiResponse::ok(crate::models::OrderResponse { order_id }))
}

pub async fn cancel_order(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<ApiResponse<bool>>, ApiError> {
    let cancelled = state.matching_engine.cancel(order_id, user.user_id).await?;
    Ok(ApiResponse::ok(cancelled))
}

pub async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<ApiResponse<crate::models::Order>>, ApiError> {
    let order = state.query_surface.get_order(order_id).await?;
    Ok(ApiResponse::ok(order))
}

pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<Vec<crate::models::Order>>>, ApiError> {
    let orders = state.query_surface.list_orders(user.user_id).await?;
    Ok(ApiResponse::ok(orders))
}

#[derive(Debug, Deserialize)]
pub struct OrderbookQuery {
    #[serde(default = "default_depth")]
    pub limit: usize,
}

fn default_depth() -> usize {
    10
}

pub async fn get_orderbook(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
    Query(q): Query<OrderbookQuery>,
) -> Result<Json<ApiResponse<crate::matching::orderbook::OrderBookSnapshot>>, ApiError> {
    let book = state.query_surface.get_orderbook(&ticker, q.limit).await?;
    Ok(ApiResponse::ok(book))
}

#[derive(Debug, Deserialize)]
pub struct TradesQuery {
    #[serde(default = "default_trades_limit")]
    pub limit: i64,
}

fn default_trades_limit() -> i64 {
    50
}

pub async fn get_trades(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
    Query(q): Query<TradesQuery>,
) -> Result<Json<ApiResponse<Vec<crate::models::Trade>>>, ApiError> {
    let trades = state.query_surface.get_transactions(&ticker, q.limit).await?;
    Ok(ApiResponse::ok(trades))
}

pub async fn get_balances(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<Vec<(String, i64)>>>, ApiError> {
    let balances = state.query_surface.get_balances(user.user_id).await?;
    Ok(ApiResponse::ok(balances))
}

pub async fn health() -> Json<ApiResponse<&'static str>> {
    ApiResponse::ok("ok")
}
