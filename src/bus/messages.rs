use crate::error::{Disposition, RecorderError};
use crate::session::StatusSnapshot;
use serde::{Deserialize, Serialize};

/// Low-level action forwarded to recording pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlAction {
    Start,
    Pause,
    Resume,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    /// Blocking alert
    Alert,
    /// Transient toast
    Toast,
}

/// User-visible notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn toast(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Toast,
            message: message.into(),
        }
    }

    pub fn alert(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Alert,
            message: message.into(),
        }
    }

    /// The notice an error should raise, if any
    pub fn from_error(err: &RecorderError) -> Option<Self> {
        match err.disposition() {
            Disposition::Alert => Some(Self::alert(err.to_string())),
            Disposition::Toast => Some(Self::toast(err.to_string())),
            Disposition::Suppress | Disposition::LogOnly => None,
        }
    }
}

/// Everything pushed to bus subscribers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BusMessage {
    Status(StatusSnapshot),
    Notice(Notice),
}
