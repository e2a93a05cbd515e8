//! HTTP transport for the message bus
//!
//! Surfaces (popup, recording page, player) reach the background through:
//! - POST /messages - Send a command, get its response
//! - GET /events - Server-sent status and notice stream
//! - GET /surfaces/:id/control - Control actions for one surface; closing
//!   the stream closes the surface
//! - GET /status, GET|DELETE /history, DELETE /history/:id - Shortcuts
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
