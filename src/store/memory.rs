/// In-memory profile store
///
/// Backs integration tests and local development without a Weaviate
/// cluster. Mirrors the hosted store's observable behavior, including
/// insertion order for username search.
use std::collections::HashMap;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{StoredProfile, UserProfile},
    store::ProfileStore,
};

#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<Uuid, UserProfile>>,
    /// Insertion order, so searches return stable results.
    order: RwLock<Vec<Uuid>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ProfileStore for MemoryStore {
    async fn ensure_ready(&self) -> AppResult<()> {
        Ok(())
    }

    async fn find_by_spotify_id(&self, spotify_id: &str) -> AppResult<Option<StoredProfile>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .find(|(_, p)| p.spotify_id == spotify_id)
            .map(|(id, p)| StoredProfile {
                id: *id,
                profile: p.clone(),
            }))
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<StoredProfile>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .find(|(_, p)| p.muse_username == username)
            .map(|(id, p)| StoredProfile {
                id: *id,
                profile: p.clone(),
            }))
    }

    async fn search_by_username(
        &self,
        fragment: &str,
        limit: usize,
    ) -> AppResult<Vec<StoredProfile>> {
        let records = self.records.read().await;
        let order = self.order.read().await;

        Ok(order
            .iter()
            .filter_map(|id| records.get(id).map(|p| (*id, p)))
            .filter(|(_, p)| p.muse_username.contains(fragment))
            .take(limit)
            .map(|(id, p)| StoredProfile {
                id,
                profile: p.clone(),
            })
            .collect())
    }

    async fn insert(&self, profile: &UserProfile) -> AppResult<()> {
        let id = Uuid::new_v4();
        self.records.write().await.insert(id, profile.clone());
        self.order.write().await.push(id);
        Ok(())
    }

    async fn update_username(&self, id: Uuid, username: &str) -> AppResult<()> {
        let mut records = self.records.write().await;
        let profile = records
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Profile record not found".to_string()))?;
        profile.muse_username = username.to_string();
        Ok(())
    }

    async fn update_friends(&self, id: Uuid, friends: &[String]) -> AppResult<()> {
        let mut records = self.records.write().await;
        let profile = records
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Profile record not found".to_string()))?;
        profile.friends = friends.to_vec();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut records = self.records.write().await;
        if records.remove(&id).is_none() {
            return Err(AppError::NotFound("Profile record not found".to_string()));
        }
        self.order.write().await.retain(|existing| *existing != id);
        Ok(())
    }
}
