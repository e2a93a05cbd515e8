use super::command::Command;
use super::response::{Ack, HistoryEntry, Response};
use crate::bus::{Broadcaster, Registration};
use crate::error::RecorderError;
use crate::history::{HistoryStore, RecordingRecord};
use crate::media::{MediaFormat, MediaOutcome, MediaRequester};
use crate::session::{SessionController, SessionEvent};
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

/// Anything that can deliver a command to the background and bring back
/// its response
#[async_trait::async_trait]
pub trait BackgroundLink: Send + Sync {
    async fn send(&self, command: Command) -> Result<Response>;
}

/// The background service: routes surface commands to the controller,
/// the history store and the media requester.
///
/// Errors stop here. Each one is turned into `{success: false, error}` and,
/// depending on its disposition, a notice on the bus.
pub struct Background {
    controller: Arc<SessionController>,
    history: Arc<HistoryStore>,
    media: Arc<MediaRequester>,
}

impl Background {
    pub fn new(
        controller: Arc<SessionController>,
        history: Arc<HistoryStore>,
        media: Arc<MediaRequester>,
    ) -> Self {
        Self {
            controller,
            history,
            media,
        }
    }

    pub fn controller(&self) -> &Arc<SessionController> {
        &self.controller
    }

    pub fn history(&self) -> &Arc<HistoryStore> {
        &self.history
    }

    pub fn broadcaster(&self) -> &Broadcaster {
        self.controller.broadcaster()
    }

    pub async fn handle(&self, command: Command) -> Response {
        match command {
            Command::GetStatus => self.controller.status().await.into(),
            Command::StartRecording => self.transition(SessionEvent::Start).await,
            Command::PauseRecording => self.transition(SessionEvent::Pause).await,
            Command::ResumeRecording => self.transition(SessionEvent::Resume).await,
            Command::StopRecording => self.transition(SessionEvent::Stop).await,
            Command::SaveRecordingToHistory { recording } => self.save_recording(recording).await,
            Command::GetVideoForPlayer { reference } => self.video_for_player(&reference).await,
            Command::GetHistory => self.list_history().await,
            Command::DeleteRecording { id } => match self.history.remove(id).await {
                Ok(true) => Ack::ok().with_count(self.history.len().await).into(),
                Ok(false) => self.fail(RecorderError::RecordNotFound(id.to_string())),
                Err(e) => self.fail(e),
            },
            Command::ClearHistory => match self.history.clear().await {
                Ok(()) => Ack::ok().with_count(0).into(),
                Err(e) => self.fail(e),
            },
            Command::DownloadRecording { id, format } => {
                let result = match format.parse::<MediaFormat>() {
                    Ok(format) => self.media.request_native_download(id, format).await,
                    Err(e) => Err(e),
                };
                self.media_response(result)
            }
            Command::TranscodeRecording { id, format } => {
                let result = match format.parse::<MediaFormat>() {
                    Ok(format) => self.media.request_transcode(id, format).await,
                    Err(e) => Err(e),
                };
                self.media_response(result)
            }
            Command::Unknown => {
                warn!("Unknown action received");
                Ack::failed("unknown action").into()
            }
        }
    }

    /// A surface's control stream ended.
    ///
    /// When that was the last open recording page, the session is over.
    pub async fn surface_closed(&self, registration_id: &str, token: u64) {
        let surfaces = self.controller.surfaces();

        if surfaces.deregister(registration_id, token).await != Some(true) {
            return;
        }

        if surfaces.recording_page_count().await == 0 {
            info!("Last recording page closed");
            self.controller.surface_closed().await;
        }
    }

    pub async fn register_surface(&self, id: &str, location: &str) -> Registration {
        self.controller.surfaces().register(id, location).await
    }

    async fn transition(&self, event: SessionEvent) -> Response {
        let transition = self.controller.apply(event).await;
        Ack::ok().with_state(transition.to).into()
    }

    async fn save_recording(&self, recording: RecordingRecord) -> Response {
        info!(
            "Saving {} ({} bytes) to history",
            recording.filename, recording.size
        );

        match self.history.append(recording).await {
            Ok(count) => Ack::ok().with_count(count).into(),
            Err(e) => self.fail(e),
        }
    }

    async fn video_for_player(&self, reference: &str) -> Response {
        let Some(record) = self.history.resolve(reference).await else {
            return self.fail(RecorderError::RecordNotFound(reference.to_string()));
        };

        match self.entry(record).await {
            Some(entry) => Ack::ok().with_recording(entry).into(),
            // Deleted between the lookup and the URL request
            None => self.fail(RecorderError::RecordNotFound(reference.to_string())),
        }
    }

    async fn list_history(&self) -> Response {
        let mut entries = Vec::new();
        for record in self.history.records().await {
            if let Some(entry) = self.entry(record).await {
                entries.push(entry);
            }
        }

        Ack::ok()
            .with_count(entries.len())
            .with_recordings(entries)
            .into()
    }

    async fn entry(&self, record: RecordingRecord) -> Option<HistoryEntry> {
        let url = self.history.object_url(record.id).await?;
        Some(HistoryEntry { record, url })
    }

    fn media_response(&self, result: Result<MediaOutcome, RecorderError>) -> Response {
        match result {
            Ok(MediaOutcome::Saved { location }) => Ack::ok().with_location(location).into(),
            Ok(MediaOutcome::Discarded) => Ack::failed("recording was deleted").into(),
            Err(e) => self.fail(e),
        }
    }

    fn fail(&self, err: RecorderError) -> Response {
        self.broadcaster().report(&err);
        Ack::failed(err.to_string()).into()
    }
}

#[async_trait::async_trait]
impl BackgroundLink for Background {
    async fn send(&self, command: Command) -> Result<Response> {
        Ok(self.handle(command).await)
    }
}
