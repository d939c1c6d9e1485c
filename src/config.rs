use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Spotify application client ID
    pub spotify_client_id: String,

    /// Spotify application client secret
    pub spotify_client_secret: String,

    /// OAuth redirect URI registered with Spotify (frontend callback)
    #[serde(default = "default_redirect_uri")]
    pub spotify_redirect_uri: String,

    /// Weaviate cluster URL
    pub weaviate_url: String,

    /// Weaviate API key
    pub weaviate_api_key: String,

    /// Allowed frontend origin for CORS
    #[serde(default = "default_frontend_origin")]
    pub frontend_origin: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Whether removing a friend also removes the reverse entry.
    /// The historical behavior is one-sided removal, so this defaults to false.
    #[serde(default)]
    pub symmetric_friend_removal: bool,
}

fn default_redirect_uri() -> String {
    "http://localhost:3000/api/auth/callback".to_string()
}

fn default_frontend_origin() -> String {
    "http://localhost:3000".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }
}
