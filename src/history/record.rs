use crate::error::{RecorderError, RecorderResult};
use base64::Engine;
use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// MIME type of clips produced by the encoder
pub const WEBM_MIME: &str = "video/webm";

/// Time-based record identity: capture time in milliseconds plus a random
/// fraction, so two clips finished in the same millisecond still differ.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(f64);

impl RecordId {
    pub fn generate(timestamp_ms: i64) -> Self {
        Self(timestamp_ms as f64 + rand::random::<f64>())
    }

    pub fn from_f64(value: f64) -> Self {
        Self(value)
    }

    pub fn as_f64(self) -> f64 {
        self.0
    }
}

impl PartialEq for RecordId {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for RecordId {}

impl Hash for RecordId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A completed recording as kept in history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingRecord {
    pub id: RecordId,

    /// Capture completion time, milliseconds since the epoch
    pub timestamp: i64,

    /// Size of the decoded clip in bytes
    pub size: u64,

    /// Base filename without extension, e.g. `video_20251019_142305`
    pub filename: String,

    /// The clip itself as a `data:<mime>;base64,<payload>` URL
    pub blob_data: String,

    /// Set while a transcode for this record is outstanding; never persisted
    #[serde(skip)]
    pub converting: bool,
}

impl RecordingRecord {
    /// Build a record for a freshly finalized clip
    pub fn from_clip<Tz: TimeZone>(clip: &[u8], mime: &str, finished_at: DateTime<Tz>) -> Self {
        let timestamp = finished_at.timestamp_millis();
        Self {
            id: RecordId::generate(timestamp),
            timestamp,
            size: clip.len() as u64,
            filename: generate_filename(&finished_at.with_timezone(&Local)),
            blob_data: encode_data_url(mime, clip),
            converting: false,
        }
    }

    /// Decode the stored clip
    pub fn payload(&self) -> RecorderResult<Payload> {
        decode_data_url(&self.blob_data)
    }
}

/// A decoded clip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// `video_YYYYMMDD_HHMMSS`
pub fn generate_filename(at: &DateTime<Local>) -> String {
    at.format("video_%Y%m%d_%H%M%S").to_string()
}

pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

pub fn decode_data_url(url: &str) -> RecorderResult<Payload> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| RecorderError::InvalidPayload("not a data URL".to_string()))?;

    let (header, body) = rest
        .split_once(',')
        .ok_or_else(|| RecorderError::InvalidPayload("missing payload separator".to_string()))?;

    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| RecorderError::InvalidPayload("payload is not base64".to_string()))?;

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(body)
        .map_err(|e| RecorderError::InvalidPayload(e.to_string()))?;

    Ok(Payload {
        mime: mime.split(';').next().unwrap_or(mime).to_string(),
        bytes,
    })
}
