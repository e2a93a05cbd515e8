use serde::{Deserialize, Serialize};

/// Recording session state, shared process-wide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    #[default]
    Idle,
    Recording,
    Paused,
}

/// The status store: current state plus the clock fields derived from it.
///
/// All instants are wall-clock milliseconds. `paused_time` is zero unless
/// the session is paused; every field is zero while idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStatus {
    pub state: SessionState,

    /// When the current segment began, shifted forward by time spent paused
    pub start_time: u64,

    /// When the current pause began
    pub paused_time: u64,

    pub elapsed_seconds: u64,
}

impl SessionStatus {
    pub fn is_idle(&self) -> bool {
        self.state == SessionState::Idle
    }

    /// Recompute `elapsed_seconds` from the wall clock.
    ///
    /// Only moves while recording. A clock stepping backwards never makes
    /// the counter go down.
    pub fn refresh(&mut self, now_ms: u64) -> u64 {
        if self.state == SessionState::Recording {
            let elapsed = now_ms.saturating_sub(self.start_time) / 1000;
            self.elapsed_seconds = self.elapsed_seconds.max(elapsed);
        }
        self.elapsed_seconds
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            state: self.state,
            elapsed_seconds: self.elapsed_seconds,
            label: format_elapsed(self.elapsed_seconds),
        }
    }
}

/// What surfaces get to see of the status store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub state: SessionState,
    pub elapsed_seconds: u64,

    /// Badge text, `HH:MM:SS`
    pub label: String,
}

/// Format seconds as `HH:MM:SS`; hours keep growing past 99
pub fn format_elapsed(secs: u64) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60
    )
}
