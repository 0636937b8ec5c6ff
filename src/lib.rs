//! journal-sync - multi-device synchronization server for a personal
//! journaling app.

pub mod api;
pub mod clock;
pub mod config;
pub mod error;
pub mod services;
pub mod types;

use std::sync::Arc;

pub use clock::Clock;
pub use config::Config;
pub use error::AppError;
pub use services::SyncStore;

/// State shared across every handler: one store, one clock, one config.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SyncStore>,
    pub clock: Arc<Clock>,
    pub config: Arc<Config>,
}
