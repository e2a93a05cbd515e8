use crate::bus::{Broadcaster, SurfaceRegistry};
use crate::config::Config;
use crate::history::{HistoryStore, JsonFilePersistence, MemoryPersistence, Persistence};
use crate::media::{DirectoryDownloader, FfmpegTranscoder, MediaRequester};
use crate::protocol::Background;
use crate::session::{SessionController, SystemClock};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

/// Wire the background service from configuration
pub async fn build_background(cfg: &Config) -> Result<Arc<Background>> {
    let session_config = cfg.session_config();

    let broadcaster = Broadcaster::new(session_config.bus_capacity);
    let surfaces = Arc::new(SurfaceRegistry::new(session_config.recording_page.clone()));
    let controller = Arc::new(SessionController::new(
        &session_config,
        Arc::new(SystemClock),
        broadcaster,
        surfaces,
    ));

    let persistence: Arc<dyn Persistence> = match cfg.history_path() {
        Some(path) => {
            info!("History stored at {:?}", path);
            Arc::new(JsonFilePersistence::new(path))
        }
        None => {
            info!("History kept in memory only");
            Arc::new(MemoryPersistence::new())
        }
    };

    let history = Arc::new(
        HistoryStore::open(persistence, cfg.history.max_records)
            .await
            .context("Failed to open recording history")?,
    );

    let media = Arc::new(MediaRequester::new(
        Arc::clone(&history),
        Arc::new(FfmpegTranscoder::new(
            &cfg.transcode.ffmpeg,
            cfg.transcode_work_dir(),
        )),
        Arc::new(DirectoryDownloader::new(cfg.downloads_dir())),
    ));

    Ok(Arc::new(Background::new(controller, history, media)))
}
