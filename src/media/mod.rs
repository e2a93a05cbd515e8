//! Playback, download and transcode requests for stored clips

mod download;
mod format;
mod requester;
mod transcode;

pub use download::{DirectoryDownloader, Downloader};
pub use format::MediaFormat;
pub use requester::{MediaOutcome, MediaRequester};
pub use transcode::{FfmpegTranscoder, Transcoder};
