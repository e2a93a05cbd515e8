use super::messages::RelayMessage;
use crate::bus::{Broadcaster, BusMessage};
use anyhow::{Context, Result};
use async_nats::Client;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Mirrors the local bus onto NATS for listeners outside the process.
///
/// Purely a subscriber: publish failures are logged and never reach the
/// session controller.
pub struct NatsRelay {
    client: Client,
    source: String,
    subject_prefix: String,
}

impl NatsRelay {
    /// Connect to NATS server
    pub async fn connect(url: &str, source: String, subject_prefix: String) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self {
            client,
            source,
            subject_prefix,
        })
    }

    /// Subject a bus message is relayed on, e.g. `recorder.status`
    pub fn subject_for(prefix: &str, message: &BusMessage) -> String {
        let kind = match message {
            BusMessage::Status(_) => "status",
            BusMessage::Notice(_) => "notice",
        };
        format!("{}.{}", prefix, kind)
    }

    /// Publish one bus message
    pub async fn publish(&self, message: BusMessage) -> Result<()> {
        let subject = Self::subject_for(&self.subject_prefix, &message);

        let relayed = RelayMessage {
            source: self.source.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            message,
        };

        let payload = serde_json::to_vec(&relayed)?;

        self.client
            .publish(subject.clone(), payload.into())
            .await
            .with_context(|| format!("Failed to publish to {}", subject))?;

        Ok(())
    }

    /// Relay everything the broadcaster publishes until it shuts down
    pub fn spawn(self, broadcaster: &Broadcaster) -> JoinHandle<()> {
        let mut rx = broadcaster.subscribe();

        tokio::spawn(async move {
            info!("NATS relay started ({}.*)", self.subject_prefix);

            loop {
                match rx.recv().await {
                    Ok(message) => {
                        if let Err(e) = self.publish(message).await {
                            error!("Failed to relay bus message: {:#}", e);
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("NATS relay lagged, {} messages skipped", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }

            info!("NATS relay stopped");
        })
    }
}
