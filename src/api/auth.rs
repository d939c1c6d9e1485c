/// Spotify OAuth passthrough handlers
///
/// No token state is held locally; every call goes straight to the Spotify
/// accounts service.
use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{error::AppResult, models::TokenSet};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshQuery {
    pub refresh_token: String,
}

/// Returns the Spotify authorization URL for the frontend to redirect to.
pub async fn login(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "url": state.oauth.authorize_url() }))
}

/// Exchanges an authorization code for tokens.
pub async fn callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> AppResult<Json<TokenSet>> {
    let tokens = state.oauth.exchange_code(&query.code).await?;
    Ok(Json(tokens))
}

/// Refreshes an access token.
pub async fn refresh(
    State(state): State<AppState>,
    Query(query): Query<RefreshQuery>,
) -> AppResult<Json<Value>> {
    let tokens = state.oauth.refresh_token(&query.refresh_token).await?;
    Ok(Json(json!({ "access_token": tokens.access_token })))
}
