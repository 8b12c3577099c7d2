pub mod app;
pub mod authz;
pub mod clock;
pub mod config;
pub mod docs;
pub mod errors;
pub mod events;
pub mod jwt;
pub mod models;
pub mod password;
pub mod ratelimit;
pub mod revocation;
pub mod routes;

// Re-export commonly used items for tests
pub use app::{create_app, AppState};
