//! Command/response protocol between surfaces and the background

mod background;
mod command;
mod response;

pub use background::{Background, BackgroundLink};
pub use command::Command;
pub use response::{Ack, HistoryEntry, Response};
