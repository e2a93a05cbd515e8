//! Recording page: capture and encoder collaborators plus the driver that
//! reacts to forwarded control actions

mod backend;
mod page;

pub use backend::{CaptureConstraints, CaptureSource, Encoder, MediaStream};
pub use page::{PageStep, RecordingPage};
