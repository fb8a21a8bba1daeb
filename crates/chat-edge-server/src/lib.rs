//! HTTP edge for chat: admission control, bounded history, and model calls.

pub mod app;
pub mod config;
pub mod handlers;
pub mod models;
pub mod security;
pub mod services;
pub mod state;
pub mod utils;

pub use app::build_router;
pub use state::AppState;
