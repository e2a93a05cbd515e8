// Integration tests for the command protocol and the background service
//
// Commands go in as JSON the way surfaces send them; responses and bus
// traffic are checked on the way out.

use anyhow::Result;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use web_recorder::bus::{Broadcaster, BusMessage, ControlAction, NoticeLevel, SurfaceRegistry};
use web_recorder::history::{HistoryStore, MemoryPersistence, RecordingRecord, WEBM_MIME};
use web_recorder::media::{DirectoryDownloader, FfmpegTranscoder, MediaRequester};
use web_recorder::protocol::{Background, Command, Response};
use web_recorder::session::{ManualClock, SessionConfig, SessionController, SessionState};

const RECORDING_PAGE: &str = "chrome-extension://test/index.html";

struct Harness {
    clock: Arc<ManualClock>,
    background: Background,
    bus: broadcast::Receiver<BusMessage>,
    _downloads: tempfile::TempDir,
}

async fn harness() -> Result<Harness> {
    let downloads = tempfile::TempDir::new()?;
    let clock = Arc::new(ManualClock::new(5_000_000));
    let broadcaster = Broadcaster::new(64);
    let bus = broadcaster.subscribe();

    let config = SessionConfig {
        tick_interval: Duration::from_secs(1),
        recording_page: RECORDING_PAGE.to_string(),
        bus_capacity: 64,
    };
    let controller = Arc::new(SessionController::new(
        &config,
        clock.clone(),
        broadcaster,
        Arc::new(SurfaceRegistry::new(RECORDING_PAGE)),
    ));

    let history = Arc::new(HistoryStore::open(Arc::new(MemoryPersistence::new()), 20).await?);
    let media = Arc::new(MediaRequester::new(
        history.clone(),
        Arc::new(FfmpegTranscoder::new(
            "/nonexistent/ffmpeg",
            downloads.path().join("scratch"),
        )),
        Arc::new(DirectoryDownloader::new(downloads.path())),
    ));

    Ok(Harness {
        clock,
        background: Background::new(controller, history, media),
        bus,
        _downloads: downloads,
    })
}

async fn send(background: &Background, message: serde_json::Value) -> Result<serde_json::Value> {
    let command: Command = serde_json::from_value(message)?;
    Ok(serde_json::to_value(background.handle(command).await)?)
}

fn notices(rx: &mut broadcast::Receiver<BusMessage>) -> Vec<(NoticeLevel, String)> {
    let mut out = Vec::new();
    while let Ok(message) = rx.try_recv() {
        if let BusMessage::Notice(notice) = message {
            out.push((notice.level, notice.message));
        }
    }
    out
}

#[test]
fn test_commands_parse_from_surface_json() -> Result<()> {
    let parsed: Command = serde_json::from_value(json!({"action": "getStatus"}))?;
    assert_eq!(parsed, Command::GetStatus);

    let parsed: Command = serde_json::from_value(json!({"action": "recordingStarted"}))?;
    assert_eq!(parsed, Command::StartRecording);

    let parsed: Command = serde_json::from_value(json!({"action": "recordingStopped"}))?;
    assert_eq!(parsed, Command::StopRecording);

    let parsed: Command =
        serde_json::from_value(json!({"action": "getVideoForPlayer", "reference": "abc"}))?;
    assert_eq!(
        parsed,
        Command::GetVideoForPlayer {
            reference: "abc".to_string()
        }
    );

    let parsed: Command = serde_json::from_value(json!({"action": "launchRockets"}))?;
    assert_eq!(parsed, Command::Unknown);
    Ok(())
}

#[tokio::test]
async fn test_get_status_shape() -> Result<()> {
    let h = harness().await?;

    let reply = send(&h.background, json!({"action": "getStatus"})).await?;
    assert_eq!(
        reply,
        json!({"state": "idle", "elapsedSeconds": 0, "label": "00:00:00"})
    );
    Ok(())
}

#[tokio::test]
async fn test_transition_commands_acknowledge() -> Result<()> {
    let h = harness().await?;

    let reply = send(&h.background, json!({"action": "startRecording"})).await?;
    assert_eq!(reply, json!({"success": true, "state": "recording"}));

    h.clock.advance(Duration::from_secs(65));
    let reply = send(&h.background, json!({"action": "pauseRecording"})).await?;
    assert_eq!(reply, json!({"success": true, "state": "paused"}));

    let reply = send(&h.background, json!({"action": "getStatus"})).await?;
    assert_eq!(reply["label"], "00:01:05");

    // Ignored by the guard but still acknowledged
    let reply = send(&h.background, json!({"action": "pauseRecording"})).await?;
    assert_eq!(reply, json!({"success": true, "state": "paused"}));

    let reply = send(&h.background, json!({"action": "stopRecording"})).await?;
    assert_eq!(reply, json!({"success": true, "state": "idle"}));
    Ok(())
}

#[tokio::test]
async fn test_unknown_action_is_rejected() -> Result<()> {
    let h = harness().await?;

    let reply = send(&h.background, json!({"action": "launchRockets"})).await?;
    assert_eq!(reply, json!({"success": false, "error": "unknown action"}));
    Ok(())
}

#[tokio::test]
async fn test_save_then_play_back() -> Result<()> {
    let h = harness().await?;
    let record = RecordingRecord::from_clip(b"clip", WEBM_MIME, Utc::now());

    let reply = send(
        &h.background,
        json!({"action": "saveRecordingToHistory", "recording": record}),
    )
    .await?;
    assert_eq!(reply, json!({"success": true, "count": 1}));

    let reply = send(
        &h.background,
        json!({"action": "getVideoForPlayer", "reference": record.filename}),
    )
    .await?;
    assert_eq!(reply["success"], true);
    assert_eq!(reply["recording"]["id"], json!(record.id));
    assert_eq!(reply["recording"]["blobData"], json!(record.blob_data));
    let url = reply["recording"]["url"].as_str().unwrap_or_default().to_string();
    assert!(url.starts_with("blob:"));

    // The object URL itself resolves to the same record
    let reply = send(
        &h.background,
        json!({"action": "getVideoForPlayer", "reference": url}),
    )
    .await?;
    assert_eq!(reply["recording"]["id"], json!(record.id));

    let reply = send(&h.background, json!({"action": "getHistory"})).await?;
    assert_eq!(reply["count"], 1);
    assert_eq!(reply["recordings"][0]["filename"], json!(record.filename));
    Ok(())
}

#[tokio::test]
async fn test_missing_video_raises_toast() -> Result<()> {
    let mut h = harness().await?;

    let reply = send(
        &h.background,
        json!({"action": "getVideoForPlayer", "reference": "video_19700101_000000"}),
    )
    .await?;
    assert_eq!(reply["success"], false);

    let raised = notices(&mut h.bus);
    assert_eq!(raised.len(), 1);
    assert_eq!(raised[0].0, NoticeLevel::Toast);
    assert!(raised[0].1.contains("not found"));
    Ok(())
}

#[tokio::test]
async fn test_delete_and_clear_history() -> Result<()> {
    let h = harness().await?;
    let first = RecordingRecord::from_clip(b"one", WEBM_MIME, Utc::now());
    let second = RecordingRecord::from_clip(b"two", WEBM_MIME, Utc::now());

    for record in [&first, &second] {
        h.background
            .handle(Command::SaveRecordingToHistory {
                recording: record.clone(),
            })
            .await;
    }

    let reply = send(
        &h.background,
        json!({"action": "deleteRecording", "id": first.id}),
    )
    .await?;
    assert_eq!(reply, json!({"success": true, "count": 1}));

    let reply = send(
        &h.background,
        json!({"action": "deleteRecording", "id": first.id}),
    )
    .await?;
    assert_eq!(reply["success"], false);

    let reply = send(&h.background, json!({"action": "clearHistory"})).await?;
    assert_eq!(reply, json!({"success": true, "count": 0}));
    assert!(h.background.history().is_empty().await);
    Ok(())
}

#[tokio::test]
async fn test_download_saves_webm_and_rejects_unknown_format() -> Result<()> {
    let h = harness().await?;
    let record = RecordingRecord::from_clip(b"clip", WEBM_MIME, Utc::now());
    h.background
        .handle(Command::SaveRecordingToHistory {
            recording: record.clone(),
        })
        .await;

    let reply = send(
        &h.background,
        json!({"action": "downloadRecording", "id": record.id, "format": "webm"}),
    )
    .await?;
    assert_eq!(reply["success"], true);
    let location = reply["location"].as_str().unwrap_or_default();
    assert!(location.ends_with(&format!("{}.webm", record.filename)));
    assert_eq!(std::fs::read(location)?, b"clip");

    let reply = send(
        &h.background,
        json!({"action": "downloadRecording", "id": record.id, "format": "gif"}),
    )
    .await?;
    assert_eq!(reply["success"], false);
    Ok(())
}

#[tokio::test]
async fn test_transcode_failure_is_reported_and_retryable() -> Result<()> {
    let mut h = harness().await?;
    let record = RecordingRecord::from_clip(b"clip", WEBM_MIME, Utc::now());
    h.background
        .handle(Command::SaveRecordingToHistory {
            recording: record.clone(),
        })
        .await;
    notices(&mut h.bus);

    for _ in 0..2 {
        let reply = send(
            &h.background,
            json!({"action": "transcodeRecording", "id": record.id, "format": "mp4"}),
        )
        .await?;
        assert_eq!(reply["success"], false);
    }

    // Both attempts reached the transcoder, so neither was blocked by the flag
    let raised = notices(&mut h.bus);
    assert_eq!(raised.len(), 2);
    assert!(raised
        .iter()
        .all(|(level, message)| *level == NoticeLevel::Toast && message.starts_with("transcode failed")));
    Ok(())
}

#[tokio::test]
async fn test_closing_last_recording_page_stops_session() -> Result<()> {
    let h = harness().await?;

    let mut first = h.background.register_surface("tab-1", RECORDING_PAGE).await;
    let second = h.background.register_surface("tab-2", RECORDING_PAGE).await;
    let popup = h
        .background
        .register_surface("popup", "chrome-extension://test/popup.html")
        .await;

    h.background.handle(Command::StartRecording).await;
    assert_eq!(first.control.try_recv().ok(), Some(ControlAction::Start));

    h.background.surface_closed(&popup.id, popup.token).await;
    h.background.surface_closed(&second.id, second.token).await;
    assert_eq!(
        h.background.controller().status().await.state,
        SessionState::Recording
    );

    h.background.surface_closed(&first.id, first.token).await;
    assert_eq!(
        h.background.controller().status().await.state,
        SessionState::Idle
    );
    Ok(())
}

#[tokio::test]
async fn test_stale_close_does_not_stop_new_registration() -> Result<()> {
    let h = harness().await?;

    let stale = h.background.register_surface("tab-1", RECORDING_PAGE).await;
    let _fresh = h.background.register_surface("tab-1", RECORDING_PAGE).await;

    h.background.handle(Command::StartRecording).await;
    h.background.surface_closed(&stale.id, stale.token).await;

    assert_eq!(
        h.background.controller().status().await.state,
        SessionState::Recording
    );
    Ok(())
}

#[test]
fn test_response_round_trips_untagged() -> Result<()> {
    let status: Response =
        serde_json::from_value(json!({"state": "paused", "elapsedSeconds": 3, "label": "00:00:03"}))?;
    assert!(matches!(status, Response::Status(_)));

    let ack: Response = serde_json::from_value(json!({"success": false, "error": "boom"}))?;
    assert!(!ack.is_success());
    assert_eq!(ack.ack().and_then(|a| a.error.as_deref()), Some("boom"));
    Ok(())
}
