use crate::error::RecorderError;
use anyhow::Result;
use tokio::sync::{mpsc, oneshot};

/// What to ask the capture picker for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConstraints {
    pub video: bool,
    pub audio: bool,
}

impl CaptureConstraints {
    pub fn with_audio() -> Self {
        Self {
            video: true,
            audio: true,
        }
    }

    pub fn video_only() -> Self {
        Self {
            video: true,
            audio: false,
        }
    }
}

/// A live display stream granted by the capture collaborator
#[derive(Debug)]
pub struct MediaStream {
    /// Human-readable source name (tab title, screen name)
    pub label: String,

    pub has_audio: bool,

    /// Fires when the user stops sharing from the host UI
    pub ended: Option<oneshot::Receiver<()>>,
}

/// Display capture
///
/// Implementations:
/// - browser host: `getDisplayMedia`
/// - tests: scripted fakes
#[async_trait::async_trait]
pub trait CaptureSource: Send + Sync {
    /// Ask the user for a stream.
    ///
    /// Fails with `UserCancelled`, `PermissionDenied` or `CaptureUnavailable`.
    async fn request_capture(
        &self,
        constraints: CaptureConstraints,
    ) -> std::result::Result<MediaStream, RecorderError>;
}

/// Native encoder
#[async_trait::async_trait]
pub trait Encoder: Send + Sync {
    /// Start encoding a stream
    ///
    /// Returns a channel receiver that yields encoded chunks in order; the
    /// channel closes once `stop` has flushed the last chunk.
    async fn start(&mut self, stream: MediaStream) -> Result<mpsc::Receiver<Vec<u8>>>;

    async fn pause(&mut self) -> Result<()>;

    async fn resume(&mut self) -> Result<()>;

    /// Flush and close the chunk channel
    async fn stop(&mut self) -> Result<()>;

    /// MIME type of the finalized blob
    fn mime(&self) -> &str;

    /// Get encoder name for logging
    fn name(&self) -> &str;
}
