use thiserror::Error;

/// Errors that can surface from collaborators or bus operations.
///
/// The session controller itself never fails: guards turn invalid transitions
/// into no-ops. Everything here is caught at the boundary that issued the
/// operation and mapped to a [`Disposition`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecorderError {
    /// User dismissed the capture picker
    #[error("capture cancelled by user")]
    UserCancelled,

    #[error("capture permission denied")]
    PermissionDenied,

    #[error("capture unavailable: {0}")]
    CaptureUnavailable(String),

    #[error("persistence failure: {0}")]
    Persistence(String),

    #[error("transcode failed: {0}")]
    Transcode(String),

    #[error("download failed: {0}")]
    Download(String),

    /// A broadcast or control forward found nobody listening
    #[error("no listener for {0}")]
    NoListener(String),

    #[error("recording {0} not found")]
    RecordNotFound(String),

    #[error("recording {0} is already being converted")]
    AlreadyConverting(String),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

/// How an error is presented to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Dropped without a trace beyond a log line
    Suppress,
    /// Blocking alert
    Alert,
    /// Transient toast notification
    Toast,
    /// Logged, never shown
    LogOnly,
}

impl RecorderError {
    pub fn disposition(&self) -> Disposition {
        match self {
            RecorderError::UserCancelled => Disposition::Suppress,
            RecorderError::PermissionDenied | RecorderError::CaptureUnavailable(_) => {
                Disposition::Alert
            }
            RecorderError::NoListener(_) => Disposition::LogOnly,
            RecorderError::Persistence(_)
            | RecorderError::Transcode(_)
            | RecorderError::Download(_)
            | RecorderError::RecordNotFound(_)
            | RecorderError::AlreadyConverting(_)
            | RecorderError::UnsupportedFormat(_)
            | RecorderError::InvalidPayload(_) => Disposition::Toast,
        }
    }

    pub(crate) fn persistence(err: anyhow::Error) -> Self {
        RecorderError::Persistence(format!("{:#}", err))
    }
}

pub type RecorderResult<T> = std::result::Result<T, RecorderError>;
