/// Compatibility scoring
///
/// A 0-100 measure of shared music taste between two profiles: two 0-50
/// sub-scores, one for artist overlap and one for genre overlap. The
/// denominator for each sub-score is the larger of the two list lengths
/// (floored at 1), so the score is symmetric in its arguments and identical
/// lists always score 100.
///
/// Raw sub-scores are kept as `f64`; callers round for presentation — the
/// friend-add flow reports a whole number, the pairwise endpoint two
/// decimals.
use std::collections::HashSet;

/// Result of comparing two taste profiles.
#[derive(Debug, Clone, PartialEq)]
pub struct Compatibility {
    pub artist_score: f64,
    pub genre_score: f64,
    /// Artists both sides share, in the first profile's order.
    pub shared_artists: Vec<String>,
    /// Genres both sides share, in the first profile's order.
    pub shared_genres: Vec<String>,
}

impl Compatibility {
    pub fn total(&self) -> f64 {
        self.artist_score + self.genre_score
    }

    /// Whole-number score, rounded half away from zero.
    pub fn rounded(&self) -> i64 {
        self.total().round() as i64
    }

    /// Score rounded to two decimal places.
    pub fn rounded_2dp(&self) -> f64 {
        (self.total() * 100.0).round() / 100.0
    }
}

/// Scores two (artists, genres) pairs against each other.
pub fn compatibility(
    user_artists: &[String],
    user_genres: &[String],
    friend_artists: &[String],
    friend_genres: &[String],
) -> Compatibility {
    let shared_artists = shared(user_artists, friend_artists);
    let shared_genres = shared(user_genres, friend_genres);

    Compatibility {
        artist_score: sub_score(shared_artists.len(), user_artists, friend_artists),
        genre_score: sub_score(shared_genres.len(), user_genres, friend_genres),
        shared_artists,
        shared_genres,
    }
}

/// One 0-50 sub-score: overlap size over the larger list length.
///
/// The `max(.., 1)` guard makes empty lists degrade to 0 instead of
/// dividing by zero.
fn sub_score(shared_count: usize, user_items: &[String], friend_items: &[String]) -> f64 {
    let denominator = user_items.len().max(friend_items.len()).max(1);
    shared_count as f64 / denominator as f64 * 50.0
}

/// Items present in both lists, deduplicated, in `user_items` order.
fn shared(user_items: &[String], friend_items: &[String]) -> Vec<String> {
    let friend_set: HashSet<&str> = friend_items.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();

    user_items
        .iter()
        .filter(|item| friend_set.contains(item.as_str()) && seen.insert(item.as_str()))
        .cloned()
        .collect()
}
