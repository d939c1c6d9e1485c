//! Administrative script: delete a user profile by Spotify ID.
//!
//! Usage: `delete_user <spotify_id>`
//!
//! Out-of-band maintenance only; the API surface has no delete endpoint.

use muse_api::{
    config::Config,
    store::{ProfileStore, WeaviateStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let spotify_id = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("Usage: delete_user <spotify_id>"))?;

    let config = Config::from_env()?;
    let store = WeaviateStore::new(config.weaviate_url, config.weaviate_api_key);

    let Some(user) = store.find_by_spotify_id(&spotify_id).await? else {
        println!("User with Spotify ID {} not found", spotify_id);
        return Ok(());
    };

    println!(
        "Found user: {} (@{})",
        user.profile.display_name, user.profile.muse_username
    );

    store.delete(user.id).await?;
    println!("Successfully deleted user with Spotify ID {}", spotify_id);
    println!("\nThey can now log in again to recreate their profile.");

    Ok(())
}
