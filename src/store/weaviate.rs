/// Weaviate-backed profile store
///
/// Talks to a hosted Weaviate cluster over its REST and GraphQL APIs.
/// Reads go through `/v1/graphql` with a `where` filter on the relevant
/// property; writes go through `/v1/objects`. Schema bootstrap creates the
/// `UserProfile` collection with its seven typed properties.
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use reqwest::Client as HttpClient;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{StoredProfile, UserProfile},
    store::ProfileStore,
};

const COLLECTION: &str = "UserProfile";
const BOOTSTRAP_ATTEMPTS: u32 = 3;
const BOOTSTRAP_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Fields requested on every profile query, plus the record ID.
const PROFILE_FIELDS: &str =
    "spotifyId displayName museUsername topArtists topGenres recentTracks friends \
     _additional { id }";

pub struct WeaviateStore {
    http_client: HttpClient,
    base_url: String,
    api_key: String,
    /// Set once the collection has been verified; later `ensure_ready`
    /// calls short-circuit instead of re-hitting the schema endpoint.
    ready: AtomicBool,
}

impl WeaviateStore {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            ready: AtomicBool::new(false),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// One bootstrap attempt: check for the collection, create it if absent.
    async fn verify_or_create_collection(&self) -> AppResult<()> {
        let response = self
            .http_client
            .get(self.url(&format!("/v1/schema/{}", COLLECTION)))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        match response.status().as_u16() {
            200 => return Ok(()),
            404 => {}
            status => {
                let body = response.text().await.unwrap_or_default();
                return Err(AppError::Store(format!(
                    "Schema check returned status {}: {}",
                    status, body
                )));
            }
        }

        tracing::info!(collection = COLLECTION, "Creating profile collection");

        let response = self
            .http_client
            .post(self.url("/v1/schema"))
            .bearer_auth(&self.api_key)
            .json(&collection_definition())
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Store(format!(
                "Collection create returned status {}: {}",
                status, body
            )));
        }

        tracing::info!(collection = COLLECTION, "Profile collection created");
        Ok(())
    }

    /// Runs a GraphQL `Get` query and extracts the result objects.
    async fn query(&self, query: String) -> AppResult<Vec<StoredProfile>> {
        let response = self
            .http_client
            .post(self.url("/v1/graphql"))
            .bearer_auth(&self.api_key)
            .json(&json!({ "query": query }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Store(format!(
                "Query returned status {}: {}",
                status, body
            )));
        }

        let body: Value = response.json().await?;

        if let Some(errors) = body.get("errors").and_then(Value::as_array) {
            if !errors.is_empty() {
                return Err(AppError::Store(format!("Query failed: {}", errors[0])));
            }
        }

        parse_query_results(&body)
    }

    async fn patch_properties(&self, id: Uuid, properties: Value) -> AppResult<()> {
        let response = self
            .http_client
            .patch(self.url(&format!("/v1/objects/{}/{}", COLLECTION, id)))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "class": COLLECTION,
                "id": id,
                "properties": properties,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Store(format!(
                "Update returned status {}: {}",
                status, body
            )));
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl ProfileStore for WeaviateStore {
    async fn ensure_ready(&self) -> AppResult<()> {
        if self.ready.load(Ordering::Acquire) {
            return Ok(());
        }

        bootstrap_retry(BOOTSTRAP_ATTEMPTS, BOOTSTRAP_RETRY_DELAY, || {
            self.verify_or_create_collection()
        })
        .await?;

        self.ready.store(true, Ordering::Release);
        Ok(())
    }

    async fn find_by_spotify_id(&self, spotify_id: &str) -> AppResult<Option<StoredProfile>> {
        let query = filter_query("spotifyId", "Equal", spotify_id, 1);
        Ok(self.query(query).await?.into_iter().next())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<StoredProfile>> {
        let query = filter_query("museUsername", "Equal", username, 1);
        Ok(self.query(query).await?.into_iter().next())
    }

    async fn search_by_username(
        &self,
        fragment: &str,
        limit: usize,
    ) -> AppResult<Vec<StoredProfile>> {
        let pattern = format!("*{}*", fragment);
        let query = filter_query("museUsername", "Like", &pattern, limit);
        self.query(query).await
    }

    async fn insert(&self, profile: &UserProfile) -> AppResult<()> {
        let response = self
            .http_client
            .post(self.url("/v1/objects"))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "class": COLLECTION,
                "properties": profile,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Store(format!(
                "Insert returned status {}: {}",
                status, body
            )));
        }

        Ok(())
    }

    async fn update_username(&self, id: Uuid, username: &str) -> AppResult<()> {
        self.patch_properties(id, json!({ "museUsername": username }))
            .await
    }

    async fn update_friends(&self, id: Uuid, friends: &[String]) -> AppResult<()> {
        self.patch_properties(id, json!({ "friends": friends })).await
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let response = self
            .http_client
            .delete(self.url(&format!("/v1/objects/{}/{}", COLLECTION, id)))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        match response.status().as_u16() {
            204 => Ok(()),
            404 => Err(AppError::NotFound("Profile record not found".to_string())),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(AppError::Store(format!(
                    "Delete returned status {}: {}",
                    status, body
                )))
            }
        }
    }
}

/// Runs a bootstrap operation up to `attempts` times, sleeping `delay`
/// between failures. The last error is surfaced if every attempt fails.
async fn bootstrap_retry<F, Fut>(attempts: u32, delay: Duration, mut op: F) -> AppResult<()>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = AppResult<()>>,
{
    let mut last_error = None;
    for attempt in 1..=attempts {
        match op().await {
            Ok(()) => return Ok(()),
            Err(e) => {
                tracing::warn!(
                    attempt,
                    max_attempts = attempts,
                    error = %e,
                    "Collection bootstrap attempt failed"
                );
                last_error = Some(e);
                if attempt < attempts {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    Err(last_error.unwrap_or_else(|| AppError::Store("Collection bootstrap failed".to_string())))
}

/// Schema definition for the `UserProfile` collection.
fn collection_definition() -> Value {
    json!({
        "class": COLLECTION,
        "description": "Collection storing user profiles for the Muse app",
        "properties": [
            { "name": "spotifyId", "dataType": ["text"], "description": "Spotify user ID" },
            { "name": "displayName", "dataType": ["text"], "description": "Display name from Spotify" },
            { "name": "museUsername", "dataType": ["text"], "description": "Unique username in Muse" },
            { "name": "topArtists", "dataType": ["text[]"], "description": "Top artists from Spotify" },
            { "name": "topGenres", "dataType": ["text[]"], "description": "Top genres from Spotify" },
            { "name": "recentTracks", "dataType": ["text[]"], "description": "Recently played tracks" },
            { "name": "friends", "dataType": ["text[]"], "description": "Friends by museUsername" },
        ],
    })
}

/// Builds a `Get` query filtering one text property.
fn filter_query(property: &str, operator: &str, value: &str, limit: usize) -> String {
    format!(
        "{{ Get {{ {}(where: {{path: [\"{}\"], operator: {}, valueText: \"{}\"}}, limit: {}) {{ {} }} }} }}",
        COLLECTION,
        property,
        operator,
        escape_graphql_string(value),
        limit,
        PROFILE_FIELDS
    )
}

/// Escapes a value for embedding in a GraphQL string literal.
fn escape_graphql_string(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

/// Extracts stored profiles from a GraphQL query response body.
fn parse_query_results(body: &Value) -> AppResult<Vec<StoredProfile>> {
    let objects = body
        .pointer(&format!("/data/Get/{}", COLLECTION))
        .and_then(Value::as_array)
        .ok_or_else(|| AppError::Store("Malformed query response".to_string()))?;

    let mut profiles = Vec::with_capacity(objects.len());
    for object in objects {
        let id = object
            .pointer("/_additional/id")
            .and_then(Value::as_str)
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or_else(|| AppError::Store("Query result missing record id".to_string()))?;

        let profile: UserProfile = serde_json::from_value(object.clone())
            .map_err(|e| AppError::Store(format!("Failed to parse profile record: {}", e)))?;

        profiles.push(StoredProfile { id, profile });
    }

    Ok(profiles)
}
