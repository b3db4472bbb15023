//! Shared server state.

use std::sync::Arc;

use tileboard_canvas::CanvasStore;
use tileboard_core::config::Config;

/// State shared by the acceptor and every session: the config and the
/// one canvas this process owns.
pub struct AppState {
    pub config: Arc<Config>,
    pub canvas: Arc<CanvasStore>,
}

impl AppState {
    pub fn new(config: Arc<Config>) -> Self {
        let canvas = Arc::new(CanvasStore::new(
            config.width(),
            config.height(),
            config.default_color(),
            config.palette(),
        ));
        Self { config, canvas }
    }
}
