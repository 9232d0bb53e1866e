//! HTTP and WebSocket boundary for soundshift.
//!
//! Commands arrive under `/api/v1`; progress leaves over `/ws`.

pub mod api;
pub mod metrics;
pub mod state;

pub use api::create_router;
pub use state::{AppState, EncoderStatus};
