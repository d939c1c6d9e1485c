use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::json;

use muse_api::api::{create_router, AppState};
use muse_api::error::{AppError, AppResult};
use muse_api::models::{SpotifyArtist, SpotifyTrack, SpotifyUser, TokenSet};
use muse_api::services::{SpotifyApi, SpotifyAuth};
use muse_api::store::MemoryStore;

/// Spotify stub: any token of the form `token-<id>` is valid and resolves
/// to user `<id>` with a fixed taste profile.
struct StubSpotify;

fn user_id_from_token(token: &str) -> AppResult<&str> {
    token
        .strip_prefix("token-")
        .ok_or_else(|| AppError::Unauthorized("Invalid access token".to_string()))
}

#[async_trait::async_trait]
impl SpotifyApi for StubSpotify {
    async fn current_user(&self, access_token: &str) -> AppResult<SpotifyUser> {
        let id = user_id_from_token(access_token)?;
        Ok(SpotifyUser {
            id: id.to_string(),
            display_name: Some(format!("{} Display", id)),
        })
    }

    async fn top_artists(
        &self,
        access_token: &str,
        limit: usize,
    ) -> AppResult<Vec<SpotifyArtist>> {
        user_id_from_token(access_token)?;
        let mut artists = vec![
            SpotifyArtist {
                id: "a1".to_string(),
                name: "Radiohead".to_string(),
                genres: vec!["art rock".to_string(), "rock".to_string()],
            },
            SpotifyArtist {
                id: "a2".to_string(),
                name: "Bjork".to_string(),
                genres: vec!["art pop".to_string(), "art rock".to_string()],
            },
        ];
        artists.truncate(limit);
        Ok(artists)
    }

    async fn recently_played(
        &self,
        access_token: &str,
        limit: usize,
    ) -> AppResult<Vec<SpotifyTrack>> {
        user_id_from_token(access_token)?;
        let mut tracks = vec![SpotifyTrack {
            id: "t1".to_string(),
            name: "Weird Fishes".to_string(),
            artist: "Radiohead".to_string(),
        }];
        tracks.truncate(limit);
        Ok(tracks)
    }
}

struct StubAuth;

#[async_trait::async_trait]
impl SpotifyAuth for StubAuth {
    fn authorize_url(&self) -> String {
        "https://accounts.spotify.com/authorize?client_id=test".to_string()
    }

    async fn exchange_code(&self, code: &str) -> AppResult<TokenSet> {
        Ok(TokenSet {
            access_token: format!("access-for-{}", code),
            token_type: "Bearer".to_string(),
            expires_in: 3600,
            refresh_token: Some("refresh-1".to_string()),
        })
    }

    async fn refresh_token(&self, refresh_token: &str) -> AppResult<TokenSet> {
        Ok(TokenSet {
            access_token: format!("refreshed-from-{}", refresh_token),
            token_type: "Bearer".to_string(),
            expires_in: 3600,
            refresh_token: None,
        })
    }
}

fn create_test_server() -> TestServer {
    create_test_server_with_symmetric_removal(false)
}

fn create_test_server_with_symmetric_removal(symmetric: bool) -> TestServer {
    let state = AppState::new(
        Arc::new(MemoryStore::new()),
        Arc::new(StubSpotify),
        Arc::new(StubAuth),
        symmetric,
    );
    let app = create_router(state, "http://localhost:3000");
    TestServer::new(app).unwrap()
}

/// Creates a profile through the direct-create endpoint.
async fn create_profile(
    server: &TestServer,
    spotify_id: &str,
    username: &str,
    artists: &[&str],
    genres: &[&str],
) {
    let response = server
        .post("/api/users/profile")
        .json(&json!({
            "spotifyId": spotify_id,
            "displayName": format!("{} Display", spotify_id),
            "museUsername": username,
            "topArtists": artists,
            "topGenres": genres,
            "recentTracks": [],
            "friends": [],
        }))
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server();
    let response = server.get("/health").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_root_welcome() {
    let server = create_test_server();
    let response = server.get("/").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["message"], "Welcome to Muse API");
}

#[tokio::test]
async fn test_login_returns_authorize_url() {
    let server = create_test_server();
    let response = server.get("/api/auth/login").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert!(body["url"]
        .as_str()
        .unwrap()
        .starts_with("https://accounts.spotify.com/authorize"));
}

#[tokio::test]
async fn test_callback_and_refresh() {
    let server = create_test_server();

    let response = server
        .get("/api/auth/callback")
        .add_query_param("code", "abc123")
        .await;
    response.assert_status_ok();
    let tokens: serde_json::Value = response.json();
    assert_eq!(tokens["access_token"], "access-for-abc123");
    assert_eq!(tokens["token_type"], "Bearer");
    assert_eq!(tokens["expires_in"], 3600);
    assert_eq!(tokens["refresh_token"], "refresh-1");

    let response = server
        .get("/api/auth/refresh")
        .add_query_param("refresh_token", "refresh-1")
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["access_token"], "refreshed-from-refresh-1");
}

#[tokio::test]
async fn test_get_profile_requires_token() {
    let server = create_test_server();
    let response = server.get("/api/users/profile").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_get_profile_rejects_bad_token() {
    let server = create_test_server();
    let response = server
        .get("/api/users/profile")
        .add_header(
            HeaderName::from_static("access-token"),
            HeaderValue::from_static("garbage"),
        )
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_fetch_or_create_is_idempotent() {
    let server = create_test_server();

    let response = server
        .get("/api/users/profile")
        .add_header(
            HeaderName::from_static("access-token"),
            HeaderValue::from_static("token-alice"),
        )
        .await;
    response.assert_status_ok();
    let created: serde_json::Value = response.json();
    assert_eq!(created["spotifyId"], "alice");
    // Initial username defaults to the Spotify ID.
    assert_eq!(created["museUsername"], "alice");
    assert_eq!(created["topArtists"][0], "Radiohead");
    assert_eq!(created["friends"].as_array().unwrap().len(), 0);

    // Rename, then fetch again: the stored profile comes back unchanged
    // rather than being rebuilt from Spotify.
    let response = server
        .put("/api/users/profile/alice/username")
        .json(&json!({ "new_username": "wavelength" }))
        .await;
    response.assert_status_ok();

    let response = server
        .get("/api/users/profile")
        .add_header(
            HeaderName::from_static("access-token"),
            HeaderValue::from_static("token-alice"),
        )
        .await;
    response.assert_status_ok();
    let fetched: serde_json::Value = response.json();
    assert_eq!(fetched["museUsername"], "wavelength");
}

#[tokio::test]
async fn test_rename_conflicts_and_noop() {
    let server = create_test_server();
    create_profile(&server, "alice-id", "alice", &[], &[]).await;
    create_profile(&server, "bob-id", "bob", &[], &[]).await;

    // Taken by a different profile.
    let response = server
        .put("/api/users/profile/alice-id/username")
        .json(&json!({ "new_username": "bob" }))
        .await;
    response.assert_status(StatusCode::CONFLICT);

    // Renaming to one's own current username is a no-op that succeeds.
    let response = server
        .put("/api/users/profile/alice-id/username")
        .json(&json!({ "new_username": "alice" }))
        .await;
    response.assert_status_ok();

    // Empty username.
    let response = server
        .put("/api/users/profile/alice-id/username")
        .json(&json!({ "new_username": "" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    // Unknown user.
    let response = server
        .put("/api/users/profile/ghost/username")
        .json(&json!({ "new_username": "anything" }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_search_caps_results_at_five() {
    let server = create_test_server();
    for i in 0..7 {
        create_profile(&server, &format!("id{}", i), &format!("muse{}", i), &[], &[]).await;
    }

    let response = server
        .get("/api/users/search")
        .add_query_param("username", "muse")
        .await;
    response.assert_status_ok();

    let users: Vec<serde_json::Value> = response.json();
    assert_eq!(users.len(), 5);
    assert!(users[0]["museUsername"].as_str().unwrap().contains("muse"));
    assert_eq!(users[0]["profileImageUrl"], "");

    let response = server
        .get("/api/users/search")
        .add_query_param("username", "nobody")
        .await;
    response.assert_status_ok();
    let users: Vec<serde_json::Value> = response.json();
    assert!(users.is_empty());
}

#[tokio::test]
async fn test_add_friend_flow() {
    let server = create_test_server();
    create_profile(&server, "alice-id", "alice", &["x", "y", "z"], &["p"]).await;
    create_profile(&server, "bob-id", "bob", &["x", "y"], &["p"]).await;

    let response = server.post("/api/users/friends/alice-id/bob").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["friend"]["museUsername"], "bob");
    assert_eq!(body["friend"]["displayName"], "bob-id Display");
    // 2/3 * 50 + 1/1 * 50, rounded.
    assert_eq!(body["compatibility_score"], 83);

    // Second attempt conflicts.
    let response = server.post("/api/users/friends/alice-id/bob").await;
    response.assert_status(StatusCode::CONFLICT);

    // The friendship is mirrored on both sides.
    let response = server
        .get("/api/users/friends/alice-id")
        .add_header(
            HeaderName::from_static("access-token"),
            HeaderValue::from_static("token-alice"),
        )
        .await;
    response.assert_status_ok();
    let friends: Vec<serde_json::Value> = response.json();
    assert_eq!(friends.len(), 1);
    assert_eq!(friends[0]["museUsername"], "bob");

    let response = server
        .get("/api/users/friends/bob-id")
        .add_header(
            HeaderName::from_static("access-token"),
            HeaderValue::from_static("token-bob"),
        )
        .await;
    response.assert_status_ok();
    let friends: Vec<serde_json::Value> = response.json();
    assert_eq!(friends.len(), 1);
    assert_eq!(friends[0]["museUsername"], "alice");
}

#[tokio::test]
async fn test_add_unknown_friend_not_found() {
    let server = create_test_server();
    create_profile(&server, "alice-id", "alice", &[], &[]).await;

    let response = server.post("/api/users/friends/alice-id/ghost").await;
    response.assert_status(StatusCode::NOT_FOUND);

    let response = server.post("/api/users/friends/ghost-id/alice").await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_remove_friend_is_one_sided_by_default() {
    let server = create_test_server();
    create_profile(&server, "alice-id", "alice", &[], &[]).await;
    create_profile(&server, "bob-id", "bob", &[], &[]).await;
    server
        .post("/api/users/friends/alice-id/bob")
        .await
        .assert_status_ok();

    let response = server
        .delete("/api/users/friends/alice-id/bob")
        .add_header(
            HeaderName::from_static("access-token"),
            HeaderValue::from_static("token-alice"),
        )
        .await;
    response.assert_status_ok();

    // Alice's list is empty; Bob still lists Alice.
    let response = server
        .get("/api/users/friends/alice-id")
        .add_header(
            HeaderName::from_static("access-token"),
            HeaderValue::from_static("token-alice"),
        )
        .await;
    let friends: Vec<serde_json::Value> = response.json();
    assert!(friends.is_empty());

    let response = server
        .get("/api/users/friends/bob-id")
        .add_header(
            HeaderName::from_static("access-token"),
            HeaderValue::from_static("token-bob"),
        )
        .await;
    let friends: Vec<serde_json::Value> = response.json();
    assert_eq!(friends.len(), 1);
}

#[tokio::test]
async fn test_remove_friend_symmetric_when_enabled() {
    let server = create_test_server_with_symmetric_removal(true);
    create_profile(&server, "alice-id", "alice", &[], &[]).await;
    create_profile(&server, "bob-id", "bob", &[], &[]).await;
    server
        .post("/api/users/friends/alice-id/bob")
        .await
        .assert_status_ok();

    let response = server
        .delete("/api/users/friends/alice-id/bob")
        .add_header(
            HeaderName::from_static("access-token"),
            HeaderValue::from_static("token-alice"),
        )
        .await;
    response.assert_status_ok();

    let response = server
        .get("/api/users/friends/bob-id")
        .add_header(
            HeaderName::from_static("access-token"),
            HeaderValue::from_static("token-bob"),
        )
        .await;
    let friends: Vec<serde_json::Value> = response.json();
    assert!(friends.is_empty());
}

#[tokio::test]
async fn test_remove_missing_friend_not_found() {
    let server = create_test_server();
    create_profile(&server, "alice-id", "alice", &[], &[]).await;

    let response = server
        .delete("/api/users/friends/alice-id/bob")
        .add_header(
            HeaderName::from_static("access-token"),
            HeaderValue::from_static("token-alice"),
        )
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_remove_friend_requires_token() {
    let server = create_test_server();
    let response = server.delete("/api/users/friends/alice-id/bob").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_compatibility_original_shape() {
    let server = create_test_server();
    create_profile(&server, "alice-id", "alice", &["x", "y", "z"], &["p"]).await;
    create_profile(&server, "bob-id", "bob", &["x", "y"], &["p"]).await;

    let response = server
        .get("/api/users/compatibility/alice-id/bob-id")
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["compatibility_score"], 83.33);
    let shared_artists: Vec<String> =
        serde_json::from_value(body["shared_artists"].clone()).unwrap();
    assert_eq!(shared_artists, vec!["x".to_string(), "y".to_string()]);
    assert_eq!(body["shared_genres"][0], "p");
}

#[tokio::test]
async fn test_compatibility_detailed_shape() {
    let server = create_test_server();
    create_profile(&server, "alice-id", "alice", &["x", "y", "z"], &["p"]).await;
    create_profile(&server, "bob-id", "bob", &["x", "y"], &["p"]).await;

    let response = server
        .get("/api/users/alice-id/compatibility/bob-id")
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["compatibilityScore"], 83);
    assert_eq!(body["commonArtists"].as_array().unwrap().len(), 2);
    assert_eq!(body["commonGenres"][0], "p");
    assert_eq!(body["user1"]["museUsername"], "alice");
    assert_eq!(body["user2"]["museUsername"], "bob");
    assert_eq!(body["user2"]["displayName"], "bob-id Display");
}

#[tokio::test]
async fn test_compatibility_unknown_user_not_found() {
    let server = create_test_server();
    create_profile(&server, "alice-id", "alice", &[], &[]).await;

    let response = server
        .get("/api/users/compatibility/alice-id/ghost")
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_music_passthrough_endpoints() {
    let server = create_test_server();

    let response = server.get("/api/music/top-artists/token-alice").await;
    response.assert_status_ok();
    let artists: Vec<serde_json::Value> = response.json();
    assert_eq!(artists[0]["name"], "Radiohead");
    assert_eq!(artists[0]["id"], "a1");

    let response = server.get("/api/music/top-genres/token-alice").await;
    response.assert_status_ok();
    let genres: Vec<serde_json::Value> = response.json();
    // "art rock" appears for both stub artists.
    assert_eq!(genres[0]["genre"], "art rock");
    assert_eq!(genres[0]["count"], 2);

    let response = server.get("/api/music/recent-tracks/token-alice").await;
    response.assert_status_ok();
    let tracks: Vec<serde_json::Value> = response.json();
    assert_eq!(tracks[0]["name"], "Weird Fishes");
    assert_eq!(tracks[0]["artist"], "Radiohead");

    let response = server.get("/api/music/vibe-analysis/token-alice").await;
    response.assert_status_ok();
    let vibe: serde_json::Value = response.json();
    assert!(vibe["vibe_description"]
        .as_str()
        .unwrap()
        .contains("art rock"));
    assert_eq!(vibe["top_artists"].as_array().unwrap().len(), 2);

    let response = server.get("/api/music/top-artists/garbage").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_request_id_header_echoed() {
    let server = create_test_server();
    let response = server.get("/health").await;
    assert!(response.headers().contains_key("x-request-id"));
}
