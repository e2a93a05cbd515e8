use crate::history::DEFAULT_MAX_RECORDS;
use crate::session::SessionConfig;
use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub recorder: RecorderConfig,
    pub history: HistoryConfig,
    pub downloads: DownloadsConfig,
    pub transcode: TranscodeConfig,
    pub nats: NatsConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "web-recorder".to_string(),
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 7878,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Location prefix of recording pages
    pub recording_page: String,
    pub tick_interval_ms: u64,
    pub bus_capacity: usize,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        let session = SessionConfig::default();
        Self {
            recording_page: session.recording_page,
            tick_interval_ms: session.tick_interval.as_millis() as u64,
            bus_capacity: session.bus_capacity,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// JSON document holding the history; empty keeps it in memory
    pub path: String,
    pub max_records: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: "~/.local/share/web-recorder/storage.json".to_string(),
            max_records: DEFAULT_MAX_RECORDS,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DownloadsConfig {
    pub dir: String,
}

impl Default for DownloadsConfig {
    fn default() -> Self {
        Self {
            dir: "~/Downloads".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TranscodeConfig {
    /// ffmpeg executable
    pub ffmpeg: String,
    /// Scratch space; defaults to the system temp dir
    pub work_dir: Option<String>,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            work_dir: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct NatsConfig {
    /// Relay the bus to NATS when set
    pub url: Option<String>,
    pub subject_prefix: String,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            url: None,
            subject_prefix: "recorder".to_string(),
        }
    }
}

impl Config {
    /// Layered load: optional file, then `WEB_RECORDER_*` environment
    /// variables (`__` between sections, e.g. `WEB_RECORDER_SERVICE__HTTP__PORT`)
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("WEB_RECORDER").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            tick_interval: Duration::from_millis(self.recorder.tick_interval_ms.max(1)),
            recording_page: self.recorder.recording_page.clone(),
            bus_capacity: self.recorder.bus_capacity,
        }
    }

    pub fn history_path(&self) -> Option<PathBuf> {
        if self.history.path.trim().is_empty() {
            return None;
        }
        Some(expand(&self.history.path))
    }

    pub fn downloads_dir(&self) -> PathBuf {
        expand(&self.downloads.dir)
    }

    pub fn transcode_work_dir(&self) -> PathBuf {
        self.transcode
            .work_dir
            .as_deref()
            .map(expand)
            .unwrap_or_else(std::env::temp_dir)
    }
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}
