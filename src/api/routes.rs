use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::{auth::api_key_auth, handlers};
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/markets/:ticker/orderbook", get(handlers::get_orderbook))
        .route("/markets/:ticker/trades", get(handlers::get_trades))
        .route("/orders/:id", get(handlers::get_order));

    let protected_routes = Router::new()
        .route("/orders", post(handlers::submit_order).get(handlers::list_orders))
        .route("/orders/:id", delete(handlers::cancel_order))
        .route("/account/balances", get(handlers::get_balances))
        .route_layer(middleware::from_fn_with_state(state.clone(), api_key_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::new().allow_origin(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
