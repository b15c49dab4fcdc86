//! API-key auth stub (spec §10: "the minimum needed to populate
//! `Order.user_id`"; full user/session administration is the out-of-scope
//! admin collaborator's job per spec §1).

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::store::queries;
use crate::AppState;

#[derive(Clone)]
pub struct AuthUser {
    pub user_id: uuid::Uuid,
}

pub async fn api_key_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let api_key = request
        .headers()
        .get("X-Api-Key")
        .and_then(|h| h.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let user = queries::get_user_by_api_key(&state.pool, api_key)
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    request.extensions_mut().insert(AuthUser { user_id: user.id });
    Ok(next.run(request).await)
}
