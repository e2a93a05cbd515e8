use crate::history::{RecordId, RecordingRecord};
use serde::{Deserialize, Serialize};

/// Intent sent by a surface to the background.
///
/// Tagged by `action`. The recording page reports what it did with the
/// `recording*` spellings, which land on the same transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Command {
    GetStatus,

    #[serde(alias = "recordingStarted")]
    StartRecording,

    #[serde(alias = "recordingPaused")]
    PauseRecording,

    #[serde(alias = "recordingResumed")]
    ResumeRecording,

    #[serde(alias = "recordingStopped")]
    StopRecording,

    SaveRecordingToHistory {
        recording: RecordingRecord,
    },

    /// `reference` is a record id, object URL or filename
    GetVideoForPlayer {
        reference: String,
    },

    GetHistory,

    DeleteRecording {
        id: RecordId,
    },

    ClearHistory,

    DownloadRecording {
        id: RecordId,
        format: String,
    },

    TranscodeRecording {
        id: RecordId,
        format: String,
    },

    /// Anything this build does not understand
    #[serde(other)]
    Unknown,
}
