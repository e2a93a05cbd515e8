//! Message bus between the background service and UI surfaces
//!
//! Two channels:
//! - status/notice broadcast to every subscriber (popup, player, pages)
//! - control actions forwarded only to recording pages

mod broadcaster;
pub mod messages;
mod surfaces;

pub use broadcaster::Broadcaster;
pub use messages::{BusMessage, ControlAction, Notice, NoticeLevel};
pub use surfaces::{Registration, SurfaceRegistry};
