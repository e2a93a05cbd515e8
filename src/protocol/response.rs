use crate::history::RecordingRecord;
use crate::session::{SessionState, StatusSnapshot};
use serde::{Deserialize, Serialize};

/// A history record as handed to a surface, with its playback URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub record: RecordingRecord,

    /// Transient `blob:` reference for playback
    pub url: String,
}

/// Generic acknowledgement: `{success, ...}` with optional payload fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ack {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<SessionState>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recording: Option<HistoryEntry>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recordings: Option<Vec<HistoryEntry>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Ack {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn with_state(mut self, state: SessionState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_recording(mut self, entry: HistoryEntry) -> Self {
        self.recording = Some(entry);
        self
    }

    pub fn with_recordings(mut self, entries: Vec<HistoryEntry>) -> Self {
        self.recordings = Some(entries);
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// Reply to a [`Command`](super::Command)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Status(StatusSnapshot),
    Ack(Ack),
}

impl Response {
    pub fn is_success(&self) -> bool {
        match self {
            Response::Status(_) => true,
            Response::Ack(ack) => ack.success,
        }
    }

    pub fn ack(&self) -> Option<&Ack> {
        match self {
            Response::Ack(ack) => Some(ack),
            Response::Status(_) => None,
        }
    }
}

impl From<Ack> for Response {
    fn from(ack: Ack) -> Self {
        Response::Ack(ack)
    }
}

impl From<StatusSnapshot> for Response {
    fn from(status: StatusSnapshot) -> Self {
        Response::Status(status)
    }
}
