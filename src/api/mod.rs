//! Web API module for ravensh
//!
//! Provides REST API endpoints for:
//! - Interactive terminal (`/exec`, `/update`, `/reset`)
//! - One-shot program execution (`/program`)
//! - Health check (`/health`)

pub mod error;
pub mod health;
pub mod program;
pub mod terminal;

#[cfg(all(test, unix))]
mod tests;

use axum::Router;

pub use error::ApiError;
pub use health::health_routes;
pub use program::program_routes;
pub use terminal::terminal_routes;

/// Routes that act on behalf of a client session
pub fn api_router() -> Router {
    Router::new()
        .merge(terminal_routes())
        .merge(program_routes())
}
