use std::{fmt, sync::Arc};

use findpepe_core::SelectionEngine;

use crate::infra::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub engine: SelectionEngine,
    pub config: Arc<Config>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(engine: SelectionEngine, config: Arc<Config>) -> Self {
        Self { engine, config }
    }

    pub fn engine(&self) -> &SelectionEngine {
        &self.engine
    }

    pub fn config_handle(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }
}
