/// Profile orchestration
///
/// Sits between the HTTP handlers and the two external collaborators: the
/// Spotify Web API (taste data, token validation) and the profile store.
/// All mutations are plain read-then-write sequences; the hosted store has
/// no conditional updates, so concurrent requests can race on the username
/// uniqueness check and on friend-list writes.
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{FriendSummary, UserProfile},
    services::compatibility::{compatibility, Compatibility},
    services::spotify::{aggregate_genres, SpotifyApi},
    store::ProfileStore,
};

/// How many artists/genres/tracks a new profile captures.
const PROFILE_ARTIST_LIMIT: usize = 5;
const PROFILE_GENRE_LIMIT: usize = 5;
const PROFILE_TRACK_LIMIT: usize = 5;

/// Maximum results for username search.
const SEARCH_LIMIT: usize = 5;

/// Outcome of a successful friend addition.
#[derive(Debug, Clone)]
pub struct FriendAddition {
    pub friend: FriendSummary,
    pub compatibility_score: i64,
}

/// Compatibility between two stored profiles, with both sides attached
/// so handlers can shape their legacy responses.
#[derive(Debug, Clone)]
pub struct PairCompatibility {
    pub report: Compatibility,
    pub user: UserProfile,
    pub friend: UserProfile,
}

pub struct ProfileService {
    store: Arc<dyn ProfileStore>,
    spotify: Arc<dyn SpotifyApi>,
    /// When true, removing a friend also removes the reverse entry.
    /// Defaults to the historical one-sided behavior.
    symmetric_friend_removal: bool,
}

impl ProfileService {
    pub fn new(
        store: Arc<dyn ProfileStore>,
        spotify: Arc<dyn SpotifyApi>,
        symmetric_friend_removal: bool,
    ) -> Self {
        Self {
            store,
            spotify,
            symmetric_friend_removal,
        }
    }

    /// Returns the stored profile for the token's user, creating it from
    /// fresh Spotify data on first sight. An existing profile is returned
    /// as-is and never refreshed.
    pub async fn fetch_or_create(&self, access_token: &str) -> AppResult<UserProfile> {
        self.store.ensure_ready().await?;

        let user = self.spotify.current_user(access_token).await?;

        if let Some(existing) = self.store.find_by_spotify_id(&user.id).await? {
            tracing::debug!(spotify_id = %user.id, "Returning existing profile");
            return Ok(existing.profile);
        }

        let artists = self
            .spotify
            .top_artists(access_token, PROFILE_ARTIST_LIMIT)
            .await?;
        let top_artists: Vec<String> = artists.iter().map(|a| a.name.clone()).collect();
        let top_genres: Vec<String> = aggregate_genres(&artists)
            .into_iter()
            .take(PROFILE_GENRE_LIMIT)
            .map(|g| g.genre)
            .collect();
        let recent_tracks: Vec<String> = self
            .spotify
            .recently_played(access_token, PROFILE_TRACK_LIMIT)
            .await?
            .into_iter()
            .map(|t| t.name)
            .collect();

        let profile = UserProfile {
            spotify_id: user.id.clone(),
            display_name: user.display_name.unwrap_or_else(|| user.id.clone()),
            // Initial username is the Spotify ID; the user renames later.
            muse_username: user.id,
            top_artists,
            top_genres,
            recent_tracks,
            friends: Vec::new(),
        };

        self.store.insert(&profile).await?;
        tracing::info!(spotify_id = %profile.spotify_id, "Created new profile");

        Ok(profile)
    }

    /// Inserts a fully specified profile (legacy direct-create endpoint).
    pub async fn create(&self, profile: &UserProfile) -> AppResult<()> {
        self.store.ensure_ready().await?;
        self.store.insert(profile).await
    }

    /// Changes a user's username after a uniqueness check.
    ///
    /// Renaming to one's own current username is a no-op that succeeds.
    pub async fn rename(&self, spotify_id: &str, new_username: &str) -> AppResult<()> {
        if new_username.is_empty() {
            return Err(AppError::InvalidInput("Username cannot be empty".to_string()));
        }

        let user = self
            .store
            .find_by_spotify_id(spotify_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if let Some(owner) = self.store.find_by_username(new_username).await? {
            if owner.profile.spotify_id != spotify_id {
                return Err(AppError::Conflict("Username already taken".to_string()));
            }
        }

        self.store.update_username(user.id, new_username).await?;
        tracing::info!(spotify_id, new_username, "Username updated");

        Ok(())
    }

    /// Substring search on usernames, capped at 5 results.
    pub async fn search(&self, fragment: &str) -> AppResult<Vec<FriendSummary>> {
        let results = self.store.search_by_username(fragment, SEARCH_LIMIT).await?;
        Ok(results.iter().map(|r| FriendSummary::from(&r.profile)).collect())
    }

    /// Resolves a user's friend list to summaries. Entries that no longer
    /// resolve to a profile are skipped with a warning.
    pub async fn friends(&self, access_token: &str, spotify_id: &str) -> AppResult<Vec<FriendSummary>> {
        self.spotify.current_user(access_token).await?;

        let user = self
            .store
            .find_by_spotify_id(spotify_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let mut friends = Vec::with_capacity(user.profile.friends.len());
        for username in &user.profile.friends {
            match self.store.find_by_username(username).await? {
                Some(friend) => friends.push(FriendSummary::from(&friend.profile)),
                None => {
                    tracing::warn!(username = %username, "Friend entry does not resolve to a profile");
                }
            }
        }

        Ok(friends)
    }

    /// Adds a friendship in both directions and reports the pair's
    /// compatibility score.
    ///
    /// The two friend-list writes are separate store calls; a failure
    /// between them leaves the friendship one-sided.
    pub async fn add_friend(
        &self,
        spotify_id: &str,
        friend_username: &str,
    ) -> AppResult<FriendAddition> {
        let user = self
            .store
            .find_by_spotify_id(spotify_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let friend = self
            .store
            .find_by_username(friend_username)
            .await?
            .ok_or_else(|| AppError::NotFound("Friend not found".to_string()))?;

        if user.profile.muse_username == friend.profile.muse_username {
            return Err(AppError::InvalidInput(
                "Cannot add yourself as a friend".to_string(),
            ));
        }

        if user
            .profile
            .friends
            .contains(&friend.profile.muse_username)
        {
            return Err(AppError::Conflict(
                "Already friends with this user".to_string(),
            ));
        }

        let report = compatibility(
            &user.profile.top_artists,
            &user.profile.top_genres,
            &friend.profile.top_artists,
            &friend.profile.top_genres,
        );

        let mut user_friends = user.profile.friends.clone();
        user_friends.push(friend.profile.muse_username.clone());
        self.store.update_friends(user.id, &user_friends).await?;

        let mut friend_friends = friend.profile.friends.clone();
        friend_friends.push(user.profile.muse_username.clone());
        self.store.update_friends(friend.id, &friend_friends).await?;

        tracing::info!(
            spotify_id,
            friend_username,
            score = report.rounded(),
            "Friendship added"
        );

        Ok(FriendAddition {
            friend: FriendSummary::from(&friend.profile),
            compatibility_score: report.rounded(),
        })
    }

    /// Removes a friend from the caller's list. The reverse entry is only
    /// removed when symmetric removal is enabled.
    pub async fn remove_friend(
        &self,
        access_token: &str,
        spotify_id: &str,
        friend_username: &str,
    ) -> AppResult<()> {
        self.spotify.current_user(access_token).await?;

        let user = self
            .store
            .find_by_spotify_id(spotify_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if !user.profile.friends.iter().any(|f| f == friend_username) {
            return Err(AppError::NotFound(
                "Friend not found in friends list".to_string(),
            ));
        }

        let remaining: Vec<String> = user
            .profile
            .friends
            .iter()
            .filter(|f| f.as_str() != friend_username)
            .cloned()
            .collect();
        self.store.update_friends(user.id, &remaining).await?;

        if self.symmetric_friend_removal {
            // Mirror the removal; a missing reverse entry is not an error.
            if let Some(friend) = self.store.find_by_username(friend_username).await? {
                let reverse: Vec<String> = friend
                    .profile
                    .friends
                    .iter()
                    .filter(|f| f.as_str() != user.profile.muse_username)
                    .cloned()
                    .collect();
                if reverse.len() != friend.profile.friends.len() {
                    self.store.update_friends(friend.id, &reverse).await?;
                }
            }
        }

        tracing::info!(spotify_id, friend_username, "Friendship removed");
        Ok(())
    }

    /// Computes compatibility between two users looked up by Spotify ID.
    pub async fn pair_compatibility(
        &self,
        spotify_id: &str,
        friend_spotify_id: &str,
    ) -> AppResult<PairCompatibility> {
        let user = self.store.find_by_spotify_id(spotify_id).await?;
        let friend = self.store.find_by_spotify_id(friend_spotify_id).await?;

        let (user, friend) = match (user, friend) {
            (Some(u), Some(f)) => (u, f),
            _ => {
                return Err(AppError::NotFound(
                    "One or both users not found".to_string(),
                ))
            }
        };

        let report = compatibility(
            &user.profile.top_artists,
            &user.profile.top_genres,
            &friend.profile.top_artists,
            &friend.profile.top_genres,
        );

        Ok(PairCompatibility {
            report,
            user: user.profile,
            friend: friend.profile,
        })
    }

    /// Administrative delete by Spotify ID; returns the removed profile.
    pub async fn delete_by_spotify_id(&self, spotify_id: &str) -> AppResult<UserProfile> {
        let user = self
            .store
            .find_by_spotify_id(spotify_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        self.store.delete(user.id).await?;
        Ok(user.profile)
    }
}
