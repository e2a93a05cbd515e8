use super::backend::{CaptureConstraints, CaptureSource, Encoder, MediaStream};
use crate::bus::{Broadcaster, ControlAction};
use crate::error::{RecorderError, RecorderResult};
use crate::history::{retry_with_spacing, RecordingRecord, RetryPolicy};
use crate::protocol::{BackgroundLink, Command, Response};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// What a control action did on the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageStep {
    Started,
    /// User dismissed the capture picker
    Cancelled,
    Paused,
    Resumed,
    /// Clip stored in history; `count` is the retained history size
    Saved { count: usize },
    /// Capture stopped without producing any data
    Empty,
    /// Action did not apply in the current page state
    Ignored,
}

struct ActiveCapture {
    generation: u64,
    paused: bool,
    collector: JoinHandle<Vec<Vec<u8>>>,
}

/// The surface that performs the actual capture.
///
/// Driven by control actions forwarded from the background, so it keeps
/// working after the popup that asked for the recording has closed. On stop
/// it assembles the clip and pushes it into history with a bounded retry.
pub struct RecordingPage {
    capture: Arc<dyn CaptureSource>,
    encoder: Box<dyn Encoder>,
    link: Arc<dyn BackgroundLink>,
    broadcaster: Broadcaster,
    retry: RetryPolicy,
    active: Option<ActiveCapture>,
    generation: u64,
    ended_tx: mpsc::Sender<u64>,
    ended_rx: Option<mpsc::Receiver<u64>>,
}

impl RecordingPage {
    pub fn new(
        capture: Arc<dyn CaptureSource>,
        encoder: Box<dyn Encoder>,
        link: Arc<dyn BackgroundLink>,
        broadcaster: Broadcaster,
    ) -> Self {
        let (ended_tx, ended_rx) = mpsc::channel(4);

        Self {
            capture,
            encoder,
            link,
            broadcaster,
            retry: RetryPolicy::default(),
            active: None,
            generation: 0,
            ended_tx,
            ended_rx: Some(ended_rx),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn is_capturing(&self) -> bool {
        self.active.is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.active.as_ref().map(|a| a.paused).unwrap_or(false)
    }

    /// React to control actions until the control channel closes
    pub async fn run(mut self, mut control: mpsc::Receiver<ControlAction>) {
        let Some(mut ended_rx) = self.ended_rx.take() else {
            return;
        };

        info!("Recording page ready ({})", self.encoder.name());

        loop {
            tokio::select! {
                action = control.recv() => match action {
                    Some(action) => {
                        if let Err(e) = self.handle(action).await {
                            self.broadcaster.report(&e);
                        }
                    }
                    None => break,
                },
                Some(generation) = ended_rx.recv() => {
                    if self.active.as_ref().map(|a| a.generation) == Some(generation) {
                        info!("Sharing ended by user");
                        if let Err(e) = self.stop().await {
                            self.broadcaster.report(&e);
                        }
                        self.notify(Command::StopRecording).await;
                    }
                }
            }
        }

        if self.active.take().is_some() {
            warn!("Recording page closed mid-capture; clip discarded");
            if let Err(e) = self.encoder.stop().await {
                debug!("Encoder stop on close failed: {:#}", e);
            }
        }
    }

    pub async fn handle(&mut self, action: ControlAction) -> RecorderResult<PageStep> {
        debug!("Recording page received {:?}", action);

        match action {
            ControlAction::Start => self.start().await,
            ControlAction::Pause => self.pause().await,
            ControlAction::Resume => self.resume().await,
            ControlAction::Stop => self.stop().await,
        }
    }

    async fn start(&mut self) -> RecorderResult<PageStep> {
        if self.active.is_some() {
            return Ok(PageStep::Ignored);
        }

        let mut stream = match self.acquire_stream().await {
            Ok(stream) => stream,
            Err(e) => {
                // Put the session back to idle; the popup already moved on
                self.notify(Command::StopRecording).await;
                return match e {
                    RecorderError::UserCancelled => {
                        info!("Capture cancelled by user");
                        Ok(PageStep::Cancelled)
                    }
                    other => Err(other),
                };
            }
        };

        info!(
            "Capturing {} (audio: {})",
            stream.label, stream.has_audio
        );

        let ended = stream.ended.take();
        let chunks = match self.encoder.start(stream).await {
            Ok(chunks) => chunks,
            Err(e) => {
                error!("Failed to start encoder: {:#}", e);
                self.notify(Command::StopRecording).await;
                return Err(RecorderError::CaptureUnavailable(format!("{:#}", e)));
            }
        };

        self.generation += 1;
        let generation = self.generation;

        if let Some(ended) = ended {
            let ended_tx = self.ended_tx.clone();
            tokio::spawn(async move {
                if ended.await.is_ok() {
                    let _ = ended_tx.send(generation).await;
                }
            });
        }

        self.active = Some(ActiveCapture {
            generation,
            paused: false,
            collector: tokio::spawn(collect_chunks(chunks)),
        });

        self.notify(Command::StartRecording).await;
        Ok(PageStep::Started)
    }

    async fn pause(&mut self) -> RecorderResult<PageStep> {
        let Some(active) = self.active.as_mut() else {
            return Ok(PageStep::Ignored);
        };
        if active.paused {
            return Ok(PageStep::Ignored);
        }

        self.encoder
            .pause()
            .await
            .map_err(|e| RecorderError::CaptureUnavailable(format!("{:#}", e)))?;
        active.paused = true;
        Ok(PageStep::Paused)
    }

    async fn resume(&mut self) -> RecorderResult<PageStep> {
        let Some(active) = self.active.as_mut() else {
            return Ok(PageStep::Ignored);
        };
        if !active.paused {
            return Ok(PageStep::Ignored);
        }

        self.encoder
            .resume()
            .await
            .map_err(|e| RecorderError::CaptureUnavailable(format!("{:#}", e)))?;
        active.paused = false;
        Ok(PageStep::Resumed)
    }

    async fn stop(&mut self) -> RecorderResult<PageStep> {
        let Some(active) = self.active.take() else {
            return Ok(PageStep::Ignored);
        };

        if let Err(e) = self.encoder.stop().await {
            warn!("Encoder did not stop cleanly: {:#}", e);
        }

        let chunks = active
            .collector
            .await
            .map_err(|e| RecorderError::CaptureUnavailable(format!("chunk collector failed: {}", e)))?;
        let clip = chunks.concat();

        if clip.is_empty() {
            warn!("Capture produced no data");
            return Ok(PageStep::Empty);
        }

        let record = RecordingRecord::from_clip(&clip, self.encoder.mime(), Utc::now());
        info!("Clip {} finalized ({} bytes)", record.filename, record.size);

        let count = self.save(record).await?;
        Ok(PageStep::Saved { count })
    }

    /// Hand the clip to the background, retrying while it does not answer
    async fn save(&self, record: RecordingRecord) -> RecorderResult<usize> {
        let link = Arc::clone(&self.link);

        retry_with_spacing(self.retry, |attempt| {
            let link = Arc::clone(&link);
            let recording = record.clone();

            async move {
                debug!("Saving recording to history (attempt {})", attempt);
                match link.send(Command::SaveRecordingToHistory { recording }).await {
                    Ok(Response::Ack(ack)) if ack.success => Ok(ack.count.unwrap_or_default()),
                    Ok(Response::Ack(ack)) => Err(RecorderError::Persistence(
                        ack.error.unwrap_or_else(|| "save rejected".to_string()),
                    )),
                    Ok(Response::Status(_)) => Err(RecorderError::Persistence(
                        "unexpected response to save".to_string(),
                    )),
                    Err(e) => Err(RecorderError::Persistence(format!(
                        "background not responding: {:#}",
                        e
                    ))),
                }
            }
        })
        .await
    }

    /// Best-effort report to the background
    async fn notify(&self, command: Command) {
        if let Err(e) = self.link.send(command).await {
            debug!("Background not responding: {:#}", e);
        }
    }

    async fn acquire_stream(&self) -> RecorderResult<MediaStream> {
        match self
            .capture
            .request_capture(CaptureConstraints::with_audio())
            .await
        {
            Ok(stream) => Ok(stream),
            Err(RecorderError::UserCancelled) => Err(RecorderError::UserCancelled),
            Err(e) => {
                warn!("Capture with audio failed ({}), retrying video only", e);
                self.capture
                    .request_capture(CaptureConstraints::video_only())
                    .await
            }
        }
    }
}

async fn collect_chunks(mut chunks: mpsc::Receiver<Vec<u8>>) -> Vec<Vec<u8>> {
    let mut collected = Vec::new();
    while let Some(chunk) = chunks.recv().await {
        if !chunk.is_empty() {
            collected.push(chunk);
        }
    }
    collected
}
