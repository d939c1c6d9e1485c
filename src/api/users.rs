/// Profile, friends, search, and compatibility handlers
///
/// The two compatibility endpoints predate each other's removal and return
/// different response shapes; both are kept for backward compatibility.
use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    models::{FriendSummary, UserProfile},
};

use super::AppState;

/// Header carrying the caller's Spotify access token.
const ACCESS_TOKEN_HEADER: &str = "access-token";

fn access_token(headers: &HeaderMap) -> AppResult<&str> {
    headers
        .get(ACCESS_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("No access token provided".to_string()))
}

#[derive(Debug, Deserialize)]
pub struct UsernameUpdate {
    pub new_username: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub username: String,
}

/// Inserts a fully specified profile.
pub async fn create_profile(
    State(state): State<AppState>,
    Json(profile): Json<UserProfile>,
) -> AppResult<Json<Value>> {
    state.profiles.create(&profile).await?;
    Ok(Json(json!({ "message": "Profile created successfully" })))
}

/// Fetch-or-create the caller's profile from their access token.
pub async fn get_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<UserProfile>> {
    let token = access_token(&headers)?;
    let profile = state.profiles.fetch_or_create(token).await?;
    Ok(Json(profile))
}

/// Updates the caller's Muse username.
pub async fn update_username(
    State(state): State<AppState>,
    Path(spotify_id): Path<String>,
    Json(update): Json<UsernameUpdate>,
) -> AppResult<Json<Value>> {
    state.profiles.rename(&spotify_id, &update.new_username).await?;
    Ok(Json(json!({ "message": "Username updated successfully" })))
}

/// Pairwise compatibility, original response shape.
pub async fn get_compatibility(
    State(state): State<AppState>,
    Path((user1_id, user2_id)): Path<(String, String)>,
) -> AppResult<Json<Value>> {
    let pair = state.profiles.pair_compatibility(&user1_id, &user2_id).await?;

    Ok(Json(json!({
        "compatibility_score": pair.report.rounded_2dp(),
        "shared_artists": pair.report.shared_artists,
        "shared_genres": pair.report.shared_genres,
    })))
}

/// Pairwise compatibility, newer response shape with both users attached.
pub async fn get_compatibility_detailed(
    State(state): State<AppState>,
    Path((spotify_id, friend_spotify_id)): Path<(String, String)>,
) -> AppResult<Json<Value>> {
    let pair = state
        .profiles
        .pair_compatibility(&spotify_id, &friend_spotify_id)
        .await?;

    Ok(Json(json!({
        "compatibilityScore": pair.report.rounded(),
        "commonArtists": pair.report.shared_artists,
        "commonGenres": pair.report.shared_genres,
        "user1": {
            "displayName": pair.user.display_name,
            "museUsername": pair.user.muse_username,
        },
        "user2": {
            "displayName": pair.friend.display_name,
            "museUsername": pair.friend.muse_username,
        },
    })))
}

/// Lists the caller's friends as profile summaries.
pub async fn get_friends(
    State(state): State<AppState>,
    Path(spotify_id): Path<String>,
    headers: HeaderMap,
) -> AppResult<Json<Vec<FriendSummary>>> {
    let token = access_token(&headers)?;
    let friends = state.profiles.friends(token, &spotify_id).await?;
    Ok(Json(friends))
}

/// Adds a mutual friendship and returns the new friend with the pair's score.
pub async fn add_friend(
    State(state): State<AppState>,
    Path((spotify_id, friend_username)): Path<(String, String)>,
) -> AppResult<Json<Value>> {
    let addition = state.profiles.add_friend(&spotify_id, &friend_username).await?;

    Ok(Json(json!({
        "friend": {
            "displayName": addition.friend.display_name,
            "museUsername": addition.friend.muse_username,
        },
        "compatibility_score": addition.compatibility_score,
    })))
}

/// Removes a friend from the caller's list.
pub async fn remove_friend(
    State(state): State<AppState>,
    Path((spotify_id, friend_username)): Path<(String, String)>,
    headers: HeaderMap,
) -> AppResult<Json<Value>> {
    let token = access_token(&headers)?;
    state
        .profiles
        .remove_friend(token, &spotify_id, &friend_username)
        .await?;
    Ok(Json(json!({ "message": "Friend removed successfully" })))
}

/// Username substring search.
pub async fn search_users(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<FriendSummary>>> {
    let users = state.profiles.search(&query.username).await?;
    Ok(Json(users))
}
