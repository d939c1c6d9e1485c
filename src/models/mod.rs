use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Weaviate's GraphQL layer returns `null` for empty array properties, so
/// list fields read back from the store must accept it as an empty list.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A user's stored music-taste record, keyed by their Spotify user ID.
///
/// Field names serialize in camelCase to match the store's property names
/// and the wire format expected by the frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Stable external ID from Spotify; immutable and unique.
    pub spotify_id: String,
    /// Display name as reported by Spotify.
    pub display_name: String,
    /// User-chosen unique handle; defaults to `spotify_id` at creation.
    pub muse_username: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub top_artists: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub top_genres: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub recent_tracks: Vec<String>,
    /// Friends by `muse_username`. Additions are mirrored on both sides.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub friends: Vec<String>,
}

/// A profile together with the record ID assigned by the store.
///
/// The record ID is needed for updates and deletes; it is never exposed
/// to clients.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredProfile {
    pub id: Uuid,
    pub profile: UserProfile,
}

/// Compact view of a profile returned by friend listing and user search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FriendSummary {
    pub display_name: String,
    pub muse_username: String,
    pub spotify_id: String,
    /// Not tracked in the store yet; serialized as an empty string for
    /// compatibility with existing clients.
    #[serde(default)]
    pub profile_image_url: String,
}

impl From<&UserProfile> for FriendSummary {
    fn from(profile: &UserProfile) -> Self {
        Self {
            display_name: profile.display_name.clone(),
            muse_username: profile.muse_username.clone(),
            spotify_id: profile.spotify_id.clone(),
            profile_image_url: String::new(),
        }
    }
}

// ============================================================================
// Spotify Web API Types
// ============================================================================

/// Current user as returned by `/v1/me`
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyUser {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Artist object from the top-artists endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyArtist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
}

/// A recently played track, flattened from Spotify's play-history items
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpotifyTrack {
    pub id: String,
    pub name: String,
    /// Primary artist name
    pub artist: String,
}

/// Artist name/id pair returned by the music passthrough endpoints
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ArtistSummary {
    pub name: String,
    pub id: String,
}

impl From<&SpotifyArtist> for ArtistSummary {
    fn from(artist: &SpotifyArtist) -> Self {
        Self {
            name: artist.name.clone(),
            id: artist.id.clone(),
        }
    }
}

/// Genre with its occurrence count across the user's top artists
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GenreCount {
    pub genre: String,
    pub count: usize,
}

// ============================================================================
// OAuth Token Types
// ============================================================================

/// Access/refresh token pair from the Spotify accounts service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenSet {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}
