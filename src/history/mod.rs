//! Recording history
//!
//! Completed clips, newest first, capped at a fixed count. Storage goes
//! through the `Persistence` collaborator; playback goes through transient
//! object URLs that are revoked when their record leaves.

mod object_urls;
mod persistence;
mod record;
mod retry;
mod store;

pub use object_urls::ObjectUrls;
pub use persistence::{JsonFilePersistence, MemoryPersistence, Persistence};
pub use record::{
    decode_data_url, encode_data_url, generate_filename, Payload, RecordId, RecordingRecord,
    WEBM_MIME,
};
pub use retry::{retry_with_spacing, RetryPolicy};
pub use store::{HistoryStore, DEFAULT_MAX_RECORDS, HISTORY_KEY};
