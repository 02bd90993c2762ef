//! HTTP front for the docvoice service: configuration, routes, handlers and
//! the mapping from service failures to HTTP responses.

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use error::ApiError;
pub use routes::{create_router, RouterConfig};
pub use state::AppState;
