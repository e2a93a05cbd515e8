use crate::bus::BusMessage;
use serde::{Deserialize, Serialize};

/// Bus message as relayed to NATS
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayMessage {
    /// Service instance that produced the message
    pub source: String,
    pub timestamp: String, // RFC3339 timestamp
    #[serde(flatten)]
    pub message: BusMessage,
}
