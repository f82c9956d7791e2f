//! Web layer for the arrivals board.
//!
//! Serves the poller's latest board as JSON, plus stop lookups against the
//! cached schedule.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
