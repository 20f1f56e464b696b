//! Shared application state, constructed once in `main`.

use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::notify::Notifier;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: Arc<Config>,
    pub http: reqwest::Client,
    pub notifier: Notifier,
    pub started_at: Instant,
}
