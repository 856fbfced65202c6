//! Application state shared across handlers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use sessions::SessionsManager;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// The live-session state machine.
    pub manager: Arc<SessionsManager>,
    /// Flips to true once recovery has completed; `/health` gates on it.
    ready: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(manager: Arc<SessionsManager>) -> Self {
        Self {
            manager,
            ready: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn set_ready(&self) {
        self.ready.store(true, Ordering::Relaxed);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Relaxed)
    }
}
