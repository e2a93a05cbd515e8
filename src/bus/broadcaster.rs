use super::messages::{BusMessage, Notice};
use crate::error::{Disposition, RecorderError};
use crate::session::StatusSnapshot;
use tokio::sync::broadcast;
use tracing::{debug, error, info};

/// Fire-and-forget fan-out to every open surface.
///
/// Publishing never fails and never waits: with nobody subscribed the message
/// is dropped. Subscribers that fall behind lose the oldest messages.
#[derive(Debug, Clone)]
pub struct Broadcaster {
    tx: broadcast::Sender<BusMessage>,
}

impl Broadcaster {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BusMessage> {
        self.tx.subscribe()
    }

    pub fn listener_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn publish_status(&self, status: StatusSnapshot) {
        self.publish(BusMessage::Status(status));
    }

    pub fn publish_notice(&self, notice: Notice) {
        self.publish(BusMessage::Notice(notice));
    }

    /// Log an error and raise whatever notice its disposition calls for
    pub fn report(&self, err: &RecorderError) {
        match err.disposition() {
            Disposition::Suppress => info!("{}", err),
            Disposition::LogOnly => debug!("{}", err),
            Disposition::Alert | Disposition::Toast => error!("{}", err),
        }

        if let Some(notice) = Notice::from_error(err) {
            self.publish_notice(notice);
        }
    }

    fn publish(&self, message: BusMessage) {
        if self.tx.send(message).is_err() {
            debug!("{}", RecorderError::NoListener("bus message".to_string()));
        }
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new(64)
    }
}
