/// Profile store abstraction
///
/// The hosted Weaviate cluster is used purely as a flat document store for
/// `UserProfile` records; no vector search is involved. The trait keeps the
/// store swappable so handlers and services can be exercised against an
/// in-memory implementation.
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{StoredProfile, UserProfile},
};

pub mod memory;
pub mod weaviate;

pub use memory::MemoryStore;
pub use weaviate::WeaviateStore;

/// Keyed-record CRUD over stored user profiles
///
/// Lookups are by the Spotify ID or the chosen username; mutations address
/// records by the store-assigned ID carried on [`StoredProfile`].
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ProfileStore: Send + Sync {
    /// Verifies the backing collection exists, creating it if needed.
    ///
    /// Runs once at process start and opportunistically before inserts;
    /// implementations may memoize success.
    async fn ensure_ready(&self) -> AppResult<()>;

    async fn find_by_spotify_id(&self, spotify_id: &str) -> AppResult<Option<StoredProfile>>;

    async fn find_by_username(&self, username: &str) -> AppResult<Option<StoredProfile>>;

    /// Substring match on usernames, capped at `limit` results.
    async fn search_by_username(&self, fragment: &str, limit: usize)
        -> AppResult<Vec<StoredProfile>>;

    async fn insert(&self, profile: &UserProfile) -> AppResult<()>;

    async fn update_username(&self, id: Uuid, username: &str) -> AppResult<()>;

    async fn update_friends(&self, id: Uuid, friends: &[String]) -> AppResult<()>;

    async fn delete(&self, id: Uuid) -> AppResult<()>;
}
