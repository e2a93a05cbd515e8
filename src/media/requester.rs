use super::download::Downloader;
use super::format::MediaFormat;
use super::transcode::Transcoder;
use crate::error::{RecorderError, RecorderResult};
use crate::history::{HistoryStore, RecordId, RecordingRecord};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// How a download or transcode request ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum MediaOutcome {
    /// File handed to the download collaborator
    Saved { location: String },
    /// The record was deleted while the request was in flight
    Discarded,
}

/// Hands stored clips to the download and transcode collaborators.
///
/// At most one transcode per record is outstanding at a time, tracked by the
/// record's `converting` flag.
pub struct MediaRequester {
    history: Arc<HistoryStore>,
    transcoder: Arc<dyn Transcoder>,
    downloader: Arc<dyn Downloader>,
}

impl MediaRequester {
    pub fn new(
        history: Arc<HistoryStore>,
        transcoder: Arc<dyn Transcoder>,
        downloader: Arc<dyn Downloader>,
    ) -> Self {
        Self {
            history,
            transcoder,
            downloader,
        }
    }

    /// Save a record in the requested format; anything but the stored
    /// format goes through the transcoder.
    pub async fn request_native_download(
        &self,
        id: RecordId,
        format: MediaFormat,
    ) -> RecorderResult<MediaOutcome> {
        let record = self.lookup(id).await?;
        let payload = record.payload()?;
        let source = source_format(&payload.mime)?;

        if source != format {
            return self.request_transcode(id, format).await;
        }

        self.save(&record, format, &payload.bytes).await
    }

    pub async fn request_transcode(
        &self,
        id: RecordId,
        target: MediaFormat,
    ) -> RecorderResult<MediaOutcome> {
        let record = self.history.begin_converting(id).await?;
        info!(
            "Transcoding {} to {} with {}",
            record.filename,
            target,
            self.transcoder.name()
        );

        let converted = match record.payload() {
            Ok(payload) => match source_format(&payload.mime) {
                Ok(source) => self
                    .transcoder
                    .transcode(payload.bytes, source, target)
                    .await
                    .map_err(|e| RecorderError::Transcode(format!("{:#}", e))),
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };

        // The record may have been deleted while we waited
        if !self.history.finish_converting(id).await {
            return Ok(MediaOutcome::Discarded);
        }

        let bytes = converted?;
        self.save(&record, target, &bytes).await
    }

    pub async fn is_converting(&self, id: RecordId) -> bool {
        self.history
            .get(id)
            .await
            .map(|r| r.converting)
            .unwrap_or(false)
    }

    async fn lookup(&self, id: RecordId) -> RecorderResult<RecordingRecord> {
        self.history
            .get(id)
            .await
            .ok_or_else(|| RecorderError::RecordNotFound(id.to_string()))
    }

    async fn save(
        &self,
        record: &RecordingRecord,
        format: MediaFormat,
        bytes: &[u8],
    ) -> RecorderResult<MediaOutcome> {
        let filename = format!("{}.{}", record.filename, format.extension());

        match self.downloader.save(&filename, bytes).await {
            Ok(location) => Ok(MediaOutcome::Saved { location }),
            Err(e) => {
                warn!("Download of {} failed: {:#}", filename, e);
                Err(RecorderError::Download(format!("{:#}", e)))
            }
        }
    }
}

fn source_format(mime: &str) -> RecorderResult<MediaFormat> {
    MediaFormat::from_mime(mime).ok_or_else(|| RecorderError::UnsupportedFormat(mime.to_string()))
}
