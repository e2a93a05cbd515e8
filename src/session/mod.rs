//! Recording session management
//!
//! This module provides the `SessionController` state machine and the pieces
//! it owns:
//! - Status store (state plus clock fields)
//! - 1 Hz elapsed-time timer
//! - Wall clock abstraction
//! - Events and transitions

mod clock;
mod config;
mod controller;
mod event;
mod status;
mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::SessionConfig;
pub use controller::{SessionController, Transition};
pub use event::SessionEvent;
pub use status::{format_elapsed, SessionState, SessionStatus, StatusSnapshot};
pub use timer::TimerService;
