//! Application state for the web layer.

use std::sync::Arc;

use crate::engine::ArrivalsEngine;
use crate::poller::SharedSnapshot;

/// Shared application state.
///
/// Handlers read the board from the poller's snapshot and answer stop
/// lookups from the engine's schedule cache.
pub struct AppState<F> {
    /// Arrival engine, shared with the poller
    pub engine: Arc<ArrivalsEngine<F>>,

    /// Latest published board
    pub board: SharedSnapshot,
}

impl<F> AppState<F> {
    /// Create a new app state.
    pub fn new(engine: Arc<ArrivalsEngine<F>>, board: SharedSnapshot) -> Self {
        Self { engine, board }
    }
}

impl<F> Clone for AppState<F> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            board: Arc::clone(&self.board),
        }
    }
}
