use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use muse_api::{
    api::{create_router, AppState},
    config::Config,
    services::{SpotifyOauthClient, SpotifyWebClient},
    store::{ProfileStore, WeaviateStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "muse_api=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;

    let store = Arc::new(WeaviateStore::new(
        config.weaviate_url.clone(),
        config.weaviate_api_key.clone(),
    ));

    // Bootstrap the profile collection up front; a failure here is logged
    // but not fatal, since the store retries before profile creation.
    if let Err(e) = store.ensure_ready().await {
        tracing::warn!(error = %e, "Failed to verify profile collection at startup");
    }

    let spotify = Arc::new(SpotifyWebClient::default());
    let oauth = Arc::new(SpotifyOauthClient::new(
        config.spotify_client_id.clone(),
        config.spotify_client_secret.clone(),
        config.spotify_redirect_uri.clone(),
    ));

    let state = AppState::new(store, spotify, oauth, config.symmetric_friend_removal);
    let app = create_router(state, &config.frontend_origin);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}
