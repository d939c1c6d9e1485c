pub mod auth;
pub mod music;
pub mod routes;
pub mod state;
pub mod users;

pub use routes::create_router;
pub use state::AppState;
