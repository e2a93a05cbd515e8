use super::object_urls::ObjectUrls;
use super::persistence::Persistence;
use super::record::{RecordId, RecordingRecord};
use crate::error::{RecorderError, RecorderResult};
use anyhow::Context;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Persistence key holding the history list
pub const HISTORY_KEY: &str = "recordings";

/// Records retained before the oldest are evicted
pub const DEFAULT_MAX_RECORDS: usize = 20;

struct State {
    records: Vec<RecordingRecord>,
    urls: ObjectUrls,
}

/// Bounded history of completed recordings, most recent first.
///
/// The in-memory list is written through to the persistence collaborator on
/// every mutation. A failed write leaves memory as it was, so the caller can
/// retry the same operation.
pub struct HistoryStore {
    persistence: Arc<dyn Persistence>,
    max_records: usize,
    state: Mutex<State>,
}

impl HistoryStore {
    /// Load history from persistence
    pub async fn open(
        persistence: Arc<dyn Persistence>,
        max_records: usize,
    ) -> RecorderResult<Self> {
        let max_records = max_records.max(1);
        let mut records = read_records(persistence.as_ref()).await?;
        records.truncate(max_records);

        info!(
            "History loaded from {} store: {} recordings",
            persistence.name(),
            records.len()
        );

        Ok(Self {
            persistence,
            max_records,
            state: Mutex::new(State {
                records,
                urls: ObjectUrls::new("web-recorder"),
            }),
        })
    }

    /// Fresh read from persistence, bypassing the in-memory list
    pub async fn load(&self) -> RecorderResult<Vec<RecordingRecord>> {
        read_records(self.persistence.as_ref()).await
    }

    pub async fn records(&self) -> Vec<RecordingRecord> {
        self.state.lock().await.records.clone()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.records.is_empty()
    }

    /// Insert at the head, evict past the limit, persist.
    ///
    /// A record whose id is already present replaces the old entry, so a
    /// retried save does not duplicate. Returns the retained count.
    pub async fn append(&self, mut record: RecordingRecord) -> RecorderResult<usize> {
        let mut state = self.state.lock().await;

        // A replacement must not clear an outstanding transcode
        if let Some(existing) = state.records.iter().find(|r| r.id == record.id) {
            record.converting = existing.converting;
        }

        let mut records = state.records.clone();
        records.retain(|r| r.id != record.id);
        records.insert(0, record);

        let evicted: Vec<RecordId> = records
            .iter()
            .skip(self.max_records)
            .map(|r| r.id)
            .collect();
        records.truncate(self.max_records);

        self.persist(&records).await?;

        for id in evicted {
            debug!("Evicting recording {}", id);
            state.urls.revoke(id);
        }
        state.records = records;

        Ok(state.records.len())
    }

    pub async fn find<P>(&self, predicate: P) -> Option<RecordingRecord>
    where
        P: Fn(&RecordingRecord) -> bool,
    {
        let state = self.state.lock().await;
        state.records.iter().find(|r| predicate(r)).cloned()
    }

    pub async fn get(&self, id: RecordId) -> Option<RecordingRecord> {
        self.find(|r| r.id == id).await
    }

    /// Look up a record by id, object URL or filename
    pub async fn resolve(&self, reference: &str) -> Option<RecordingRecord> {
        let state = self.state.lock().await;
        let by_url = state.urls.resolve(reference);

        state
            .records
            .iter()
            .find(|r| {
                Some(r.id) == by_url || r.id.to_string() == reference || r.filename == reference
            })
            .cloned()
    }

    /// Object URL for playback of a record, created on first use
    pub async fn object_url(&self, id: RecordId) -> Option<String> {
        let mut state = self.state.lock().await;
        if !state.records.iter().any(|r| r.id == id) {
            return None;
        }
        Some(state.urls.acquire(id))
    }

    /// Remove a record, revoking its object URL. Returns false if absent.
    pub async fn remove(&self, id: RecordId) -> RecorderResult<bool> {
        let mut state = self.state.lock().await;

        if !state.records.iter().any(|r| r.id == id) {
            return Ok(false);
        }

        let records: Vec<RecordingRecord> = state
            .records
            .iter()
            .filter(|r| r.id != id)
            .cloned()
            .collect();
        self.persist(&records).await?;

        state.urls.revoke(id);
        state.records = records;

        info!("Recording {} removed from history", id);
        Ok(true)
    }

    pub async fn clear(&self) -> RecorderResult<()> {
        let mut state = self.state.lock().await;

        self.persist(&[]).await?;

        let revoked = state.urls.revoke_all();
        state.records.clear();

        info!("History cleared ({} object URLs revoked)", revoked);
        Ok(())
    }

    /// Mark a record as having a transcode outstanding
    pub async fn begin_converting(&self, id: RecordId) -> RecorderResult<RecordingRecord> {
        let mut state = self.state.lock().await;
        let record = state
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| RecorderError::RecordNotFound(id.to_string()))?;

        if record.converting {
            return Err(RecorderError::AlreadyConverting(id.to_string()));
        }

        record.converting = true;
        Ok(record.clone())
    }

    /// Clear the converting flag. Returns false if the record is gone.
    pub async fn finish_converting(&self, id: RecordId) -> bool {
        let mut state = self.state.lock().await;
        match state.records.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                record.converting = false;
                true
            }
            None => {
                warn!("Recording {} was removed while converting", id);
                false
            }
        }
    }

    async fn persist(&self, records: &[RecordingRecord]) -> RecorderResult<()> {
        let value = serde_json::to_value(records)
            .context("Failed to serialize history")
            .map_err(RecorderError::persistence)?;

        self.persistence
            .set(HISTORY_KEY, value)
            .await
            .context("Failed to write history")
            .map_err(RecorderError::persistence)
    }
}

async fn read_records(persistence: &dyn Persistence) -> RecorderResult<Vec<RecordingRecord>> {
    let value = persistence
        .get(HISTORY_KEY)
        .await
        .context("Failed to read history")
        .map_err(RecorderError::persistence)?;

    let records: Vec<RecordingRecord> = match value {
        Some(value) => serde_json::from_value(value)
            .context("Failed to parse history")
            .map_err(RecorderError::persistence)?,
        None => Vec::new(),
    };

    // Stored newest first; append order is authoritative
    Ok(records)
}
