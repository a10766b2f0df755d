//! Folio API crate - axum HTTP server for the portfolio terminal.
//!
//! Exposes the chat orchestrator, session management and the guestbook
//! over JSON, with CORS for the front end and a rate limit on chat.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
