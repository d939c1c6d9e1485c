use std::sync::Arc;

use crate::{
    services::{ProfileService, SpotifyApi, SpotifyAuth},
    store::ProfileStore,
};

/// Shared application state
///
/// All external collaborators are injected explicitly so the bootstrap and
/// shutdown lifecycle stays visible and handlers can be tested against an
/// in-memory store and stubbed Spotify clients.
#[derive(Clone)]
pub struct AppState {
    pub profiles: Arc<ProfileService>,
    pub spotify: Arc<dyn SpotifyApi>,
    pub oauth: Arc<dyn SpotifyAuth>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ProfileStore>,
        spotify: Arc<dyn SpotifyApi>,
        oauth: Arc<dyn SpotifyAuth>,
        symmetric_friend_removal: bool,
    ) -> Self {
        Self {
            profiles: Arc::new(ProfileService::new(
                store,
                spotify.clone(),
                symmetric_friend_removal,
            )),
            spotify,
            oauth,
        }
    }
}
