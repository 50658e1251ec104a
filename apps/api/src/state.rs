use std::sync::Arc;

use crate::config::Config;
use crate::layout::LayoutConfig;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Validated layout parameters, shared read-only with blocking planner tasks.
    pub layout: Arc<LayoutConfig>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let layout = Arc::new(config.layout.clone());
        Self { config, layout }
    }
}
