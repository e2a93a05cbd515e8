pub mod client;
pub mod messages;

pub use client::NatsRelay;
pub use messages::RelayMessage;
