/// Spotify Web API and OAuth clients
///
/// Two seams: [`SpotifyApi`] for catalog/profile reads with a user's access
/// token, and [`SpotifyAuth`] for the authorization-code flow against the
/// accounts service. Token contents are never validated locally; a bad token
/// surfaces as a 401 from the next API call.
use reqwest::{Client as HttpClient, StatusCode, Url};
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::{GenreCount, SpotifyArtist, SpotifyTrack, SpotifyUser, TokenSet},
};

const API_URL: &str = "https://api.spotify.com/v1";
const ACCOUNTS_URL: &str = "https://accounts.spotify.com";
const TIME_RANGE: &str = "medium_term";
const SCOPES: &str = "user-read-private user-read-email user-top-read user-read-recently-played";

/// Read access to the Spotify catalog on behalf of a user
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SpotifyApi: Send + Sync {
    /// Fetches the profile behind an access token; doubles as token validation.
    async fn current_user(&self, access_token: &str) -> AppResult<SpotifyUser>;

    async fn top_artists(&self, access_token: &str, limit: usize)
        -> AppResult<Vec<SpotifyArtist>>;

    async fn recently_played(&self, access_token: &str, limit: usize)
        -> AppResult<Vec<SpotifyTrack>>;
}

/// Spotify OAuth passthrough
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SpotifyAuth: Send + Sync {
    /// Builds the authorization URL the frontend redirects the user to.
    fn authorize_url(&self) -> String;

    /// Exchanges an authorization code for an access/refresh token pair.
    async fn exchange_code(&self, code: &str) -> AppResult<TokenSet>;

    /// Obtains a fresh access token from a refresh token.
    async fn refresh_token(&self, refresh_token: &str) -> AppResult<TokenSet>;
}

// ============================================================================
// Web API client
// ============================================================================

#[derive(Debug, Deserialize)]
struct TopArtistsResponse {
    items: Vec<SpotifyArtist>,
}

#[derive(Debug, Deserialize)]
struct RecentlyPlayedResponse {
    items: Vec<PlayHistoryItem>,
}

#[derive(Debug, Deserialize)]
struct PlayHistoryItem {
    track: TrackObject,
}

#[derive(Debug, Deserialize)]
struct TrackObject {
    id: String,
    name: String,
    #[serde(default)]
    artists: Vec<ArtistRef>,
}

#[derive(Debug, Deserialize)]
struct ArtistRef {
    name: String,
}

impl From<TrackObject> for SpotifyTrack {
    fn from(track: TrackObject) -> Self {
        let artist = track
            .artists
            .into_iter()
            .next()
            .map(|a| a.name)
            .unwrap_or_default();

        SpotifyTrack {
            id: track.id,
            name: track.name,
            artist,
        }
    }
}

#[derive(Clone)]
pub struct SpotifyWebClient {
    http_client: HttpClient,
    api_url: String,
}

impl Default for SpotifyWebClient {
    fn default() -> Self {
        Self::new(API_URL.to_string())
    }
}

impl SpotifyWebClient {
    pub fn new(api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        access_token: &str,
        query: &[(&str, String)],
    ) -> AppResult<T> {
        let url = format!("{}{}", self.api_url, path);
        let response = self
            .http_client
            .get(&url)
            .bearer_auth(access_token)
            .query(query)
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(AppError::Unauthorized("Invalid access token".to_string()));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Spotify API returned status {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait::async_trait]
impl SpotifyApi for SpotifyWebClient {
    async fn current_user(&self, access_token: &str) -> AppResult<SpotifyUser> {
        self.get_json("/me", access_token, &[]).await
    }

    async fn top_artists(
        &self,
        access_token: &str,
        limit: usize,
    ) -> AppResult<Vec<SpotifyArtist>> {
        let response: TopArtistsResponse = self
            .get_json(
                "/me/top/artists",
                access_token,
                &[
                    ("limit", limit.to_string()),
                    ("time_range", TIME_RANGE.to_string()),
                ],
            )
            .await?;

        tracing::debug!(artists = response.items.len(), "Fetched top artists");
        Ok(response.items)
    }

    async fn recently_played(
        &self,
        access_token: &str,
        limit: usize,
    ) -> AppResult<Vec<SpotifyTrack>> {
        let response: RecentlyPlayedResponse = self
            .get_json(
                "/me/player/recently-played",
                access_token,
                &[("limit", limit.to_string())],
            )
            .await?;

        Ok(response
            .items
            .into_iter()
            .map(|item| item.track.into())
            .collect())
    }
}

/// Counts genre occurrences across a set of artists, most common first.
/// Ties keep first-seen order.
pub fn aggregate_genres(artists: &[SpotifyArtist]) -> Vec<GenreCount> {
    let mut counts: Vec<GenreCount> = Vec::new();

    for artist in artists {
        for genre in &artist.genres {
            match counts.iter_mut().find(|c| &c.genre == genre) {
                Some(existing) => existing.count += 1,
                None => counts.push(GenreCount {
                    genre: genre.clone(),
                    count: 1,
                }),
            }
        }
    }

    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

// ============================================================================
// OAuth client
// ============================================================================

pub struct SpotifyOauthClient {
    http_client: HttpClient,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    accounts_url: String,
}

impl SpotifyOauthClient {
    pub fn new(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        Self::with_accounts_url(client_id, client_secret, redirect_uri, ACCOUNTS_URL.to_string())
    }

    pub fn with_accounts_url(
        client_id: String,
        client_secret: String,
        redirect_uri: String,
        accounts_url: String,
    ) -> Self {
        Self {
            http_client: HttpClient::new(),
            client_id,
            client_secret,
            redirect_uri,
            accounts_url,
        }
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> AppResult<TokenSet> {
        let url = format!("{}/api/token", self.accounts_url);
        let response = self
            .http_client
            .post(&url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Token endpoint returned status {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait::async_trait]
impl SpotifyAuth for SpotifyOauthClient {
    fn authorize_url(&self) -> String {
        // Base URL and params are static, so this cannot fail.
        let url = Url::parse_with_params(
            &format!("{}/authorize", self.accounts_url),
            &[
                ("client_id", self.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("scope", SCOPES),
            ],
        )
        .unwrap_or_else(|_| Url::parse(ACCOUNTS_URL).unwrap());

        url.to_string()
    }

    async fn exchange_code(&self, code: &str) -> AppResult<TokenSet> {
        self.token_request(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
        ])
        .await
    }

    async fn refresh_token(&self, refresh_token: &str) -> AppResult<TokenSet> {
        self.token_request(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artist(name: &str, genres: &[&str]) -> SpotifyArtist {
        SpotifyArtist {
            id: name.to_lowercase(),
            name: name.to_string(),
            genres: genres.iter().map(|g| g.to_string()).collect(),
        }
    }

    #[test]
    fn test_aggregate_genres_counts_and_orders() {
        let artists = vec![
            artist("A", &["indie", "rock"]),
            artist("B", &["rock"]),
            artist("C", &["rock", "indie", "pop"]),
        ];

        let counts = aggregate_genres(&artists);

        assert_eq!(counts[0].genre, "rock");
        assert_eq!(counts[0].count, 3);
        assert_eq!(counts[1].genre, "indie");
        assert_eq!(counts[1].count, 2);
        assert_eq!(counts[2].genre, "pop");
        assert_eq!(counts[2].count, 1);
    }

    #[test]
    fn test_aggregate_genres_empty() {
        assert!(aggregate_genres(&[]).is_empty());
        assert!(aggregate_genres(&[artist("A", &[])]).is_empty());
    }

    #[test]
    fn test_aggregate_genres_tie_keeps_first_seen_order() {
        let artists = vec![artist("A", &["shoegaze", "dream pop"])];
        let counts = aggregate_genres(&artists);

        assert_eq!(counts[0].genre, "shoegaze");
        assert_eq!(counts[1].genre, "dream pop");
    }

    #[test]
    fn test_authorize_url_contains_oauth_params() {
        let client = SpotifyOauthClient::new(
            "client123".to_string(),
            "secret".to_string(),
            "http://localhost:3000/api/auth/callback".to_string(),
        );

        let url = client.authorize_url();

        assert!(url.starts_with("https://accounts.spotify.com/authorize?"));
        assert!(url.contains("client_id=client123"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fapi%2Fauth%2Fcallback"));
        assert!(url.contains("user-top-read"));
    }

    #[test]
    fn test_top_artists_deserialization() {
        let json = r#"{
            "items": [
                { "id": "4Z8W4fKeB5YxbusRsdQVPb", "name": "Radiohead", "genres": ["art rock", "alternative rock"] },
                { "id": "3dBVyJ7JuOMt4GE9607Qin", "name": "T. Rex" }
            ]
        }"#;

        let response: TopArtistsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.items.len(), 2);
        assert_eq!(response.items[0].name, "Radiohead");
        assert_eq!(response.items[0].genres.len(), 2);
        assert!(response.items[1].genres.is_empty());
    }

    #[test]
    fn test_recently_played_track_flattening() {
        let json = r#"{
            "items": [
                {
                    "track": {
                        "id": "2takcwOaAZWiXQijPHIx7B",
                        "name": "Time",
                        "artists": [{ "name": "Pink Floyd" }, { "name": "Someone Else" }]
                    }
                }
            ]
        }"#;

        let response: RecentlyPlayedResponse = serde_json::from_str(json).unwrap();
        let track: SpotifyTrack = response.items.into_iter().next().unwrap().track.into();

        assert_eq!(track.name, "Time");
        assert_eq!(track.artist, "Pink Floyd");
    }

    #[test]
    fn test_track_without_artists() {
        let track = TrackObject {
            id: "x".to_string(),
            name: "Untitled".to_string(),
            artists: vec![],
        };

        let track: SpotifyTrack = track.into();
        assert_eq!(track.artist, "");
    }
}
