use axum::{
    http::{header::CONTENT_TYPE, HeaderName, HeaderValue, Method, StatusCode},
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};

use super::{auth, music, users, AppState};

/// Creates the main API router with all routes
pub fn create_router(state: AppState, frontend_origin: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(
            frontend_origin
                .parse::<HeaderValue>()
                .unwrap_or_else(|_| HeaderValue::from_static("http://localhost:3000")),
        )
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static("access-token")])
        .allow_credentials(true);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/api/auth", auth_routes())
        .nest("/api/users", user_routes())
        .nest("/api/music", music_routes())
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .with_state(state)
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login))
        .route("/callback", get(auth::callback))
        .route("/refresh", get(auth::refresh))
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", post(users::create_profile))
        .route("/profile", get(users::get_profile))
        .route("/profile/:spotify_id/username", put(users::update_username))
        .route("/compatibility/:user1_id/:user2_id", get(users::get_compatibility))
        .route(
            "/:spotify_id/compatibility/:friend_spotify_id",
            get(users::get_compatibility_detailed),
        )
        .route("/friends/:spotify_id", get(users::get_friends))
        .route("/friends/:spotify_id/:friend_username", post(users::add_friend))
        .route(
            "/friends/:spotify_id/:friend_username",
            delete(users::remove_friend),
        )
        .route("/search", get(users::search_users))
}

fn music_routes() -> Router<AppState> {
    Router::new()
        .route("/top-artists/:access_token", get(music::top_artists))
        .route("/top-genres/:access_token", get(music::top_genres))
        .route("/recent-tracks/:access_token", get(music::recent_tracks))
        .route("/vibe-analysis/:access_token", get(music::vibe_analysis))
}

/// Welcome endpoint
async fn root() -> Json<Value> {
    Json(json!({ "message": "Welcome to Muse API" }))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
