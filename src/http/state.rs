use crate::protocol::Background;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The background service every surface talks to
    pub background: Arc<Background>,
}

impl AppState {
    pub fn new(background: Arc<Background>) -> Self {
        Self { background }
    }
}
