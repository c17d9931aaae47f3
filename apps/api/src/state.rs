use std::sync::Arc;

use crate::config::Config;
use crate::screening::Screener;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Pattern set, role catalog and judge, all read-only after startup.
    pub screener: Arc<Screener>,
    pub config: Config,
}
