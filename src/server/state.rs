use crate::engine::Engine;
use std::sync::Arc;

pub struct AppState {
    pub engine: Arc<Engine>,
}
