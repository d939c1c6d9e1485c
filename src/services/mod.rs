pub mod compatibility;
pub mod profiles;
pub mod spotify;

pub use compatibility::{compatibility, Compatibility};
pub use profiles::ProfileService;
pub use spotify::{SpotifyApi, SpotifyAuth, SpotifyOauthClient, SpotifyWebClient};
