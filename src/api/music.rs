/// Music catalog passthrough handlers
///
/// Thin reads against the Spotify Web API using the access token from the
/// path, matching the original route shapes.
use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use crate::{
    error::AppResult,
    models::{ArtistSummary, GenreCount, SpotifyTrack},
    services::spotify::aggregate_genres,
};

use super::AppState;

const ARTIST_LIMIT: usize = 20;
/// Genres are aggregated over a wider artist sample than the artist list
/// itself exposes.
const GENRE_SOURCE_LIMIT: usize = 50;
const GENRE_LIMIT: usize = 10;
const TRACK_LIMIT: usize = 20;

/// Slice size for each section of the vibe analysis.
const VIBE_SECTION_LIMIT: usize = 5;

/// User's top artists.
pub async fn top_artists(
    State(state): State<AppState>,
    Path(access_token): Path<String>,
) -> AppResult<Json<Vec<ArtistSummary>>> {
    let artists = state.spotify.top_artists(&access_token, ARTIST_LIMIT).await?;
    Ok(Json(artists.iter().map(ArtistSummary::from).collect()))
}

/// User's top genres, counted across their top artists.
pub async fn top_genres(
    State(state): State<AppState>,
    Path(access_token): Path<String>,
) -> AppResult<Json<Vec<GenreCount>>> {
    let artists = state
        .spotify
        .top_artists(&access_token, GENRE_SOURCE_LIMIT)
        .await?;

    let genres: Vec<GenreCount> = aggregate_genres(&artists)
        .into_iter()
        .take(GENRE_LIMIT)
        .collect();

    Ok(Json(genres))
}

/// User's recently played tracks.
pub async fn recent_tracks(
    State(state): State<AppState>,
    Path(access_token): Path<String>,
) -> AppResult<Json<Vec<SpotifyTrack>>> {
    let tracks = state
        .spotify
        .recently_played(&access_token, TRACK_LIMIT)
        .await?;
    Ok(Json(tracks))
}

/// One-shot summary of the user's music taste.
pub async fn vibe_analysis(
    State(state): State<AppState>,
    Path(access_token): Path<String>,
) -> AppResult<Json<Value>> {
    let artists = state
        .spotify
        .top_artists(&access_token, GENRE_SOURCE_LIMIT)
        .await?;
    let tracks = state
        .spotify
        .recently_played(&access_token, TRACK_LIMIT)
        .await?;

    let genres = aggregate_genres(&artists);
    let primary_genres: Vec<&str> = genres
        .iter()
        .take(3)
        .map(|g| g.genre.as_str())
        .collect();

    let top_artists: Vec<ArtistSummary> = artists
        .iter()
        .take(VIBE_SECTION_LIMIT)
        .map(ArtistSummary::from)
        .collect();

    Ok(Json(json!({
        "vibe_description": vibe_description(&primary_genres),
        "top_artists": top_artists,
        "top_genres": genres.iter().take(VIBE_SECTION_LIMIT).collect::<Vec<_>>(),
        "recent_tracks": tracks.iter().take(VIBE_SECTION_LIMIT).collect::<Vec<_>>(),
    })))
}

/// Builds the taste blurb from the user's leading genres.
fn vibe_description(primary_genres: &[&str]) -> String {
    let mut description = format!(
        "Your music taste leans towards {}. ",
        primary_genres.join(", ")
    );

    if primary_genres
        .iter()
        .any(|g| *g == "indie" || *g == "alternative")
    {
        description.push_str("You have an eclectic and independent spirit.");
    } else if primary_genres.iter().any(|g| *g == "pop" || *g == "dance") {
        description.push_str("You're energetic and love to keep the party going.");
    } else if primary_genres.iter().any(|g| *g == "rock" || *g == "metal") {
        description.push_str("You have a strong and passionate personality.");
    } else {
        description.push_str("You have a unique and diverse taste in music.");
    }

    description
}
