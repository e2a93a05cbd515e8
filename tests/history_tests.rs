// Integration tests for the bounded recording history
//
// Covers eviction, lookup, write-through persistence and the behaviour
// when the persistence collaborator fails.

use anyhow::Result;
use chrono::{TimeZone, Utc};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use web_recorder::error::RecorderError;
use web_recorder::history::{
    HistoryStore, JsonFilePersistence, MemoryPersistence, Persistence, RecordingRecord, WEBM_MIME,
};

fn clip(n: i64) -> RecordingRecord {
    let at = Utc.timestamp_millis_opt(1_760_000_000_000 + n * 1_000).unwrap();
    RecordingRecord::from_clip(format!("clip-{}", n).as_bytes(), WEBM_MIME, at)
}

/// Memory store that can be told to reject writes
#[derive(Default)]
struct FlakyPersistence {
    inner: MemoryPersistence,
    failing: AtomicBool,
}

#[async_trait::async_trait]
impl Persistence for FlakyPersistence {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("quota exceeded");
        }
        self.inner.set(key, value).await
    }

    fn name(&self) -> &str {
        "flaky"
    }
}

#[tokio::test]
async fn test_append_keeps_most_recent_first() -> Result<()> {
    let store = HistoryStore::open(Arc::new(MemoryPersistence::new()), 20).await?;

    let first = clip(1);
    let second = clip(2);
    store.append(first.clone()).await?;
    let count = store.append(second.clone()).await?;

    assert_eq!(count, 2);
    let ids: Vec<_> = store.records().await.into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
    Ok(())
}

#[tokio::test]
async fn test_append_evicts_oldest_past_limit() -> Result<()> {
    let store = HistoryStore::open(Arc::new(MemoryPersistence::new()), 20).await?;

    let oldest = clip(0);
    store.append(oldest.clone()).await?;
    let url = store.object_url(oldest.id).await;
    assert!(url.is_some());

    for n in 1..=20 {
        store.append(clip(n)).await?;
    }

    assert_eq!(store.len().await, 20);
    assert!(store.get(oldest.id).await.is_none());

    // The evicted record's object URL no longer resolves
    let url = url.unwrap_or_default();
    assert!(store.resolve(&url).await.is_none());
    Ok(())
}

#[tokio::test]
async fn test_retried_save_does_not_duplicate() -> Result<()> {
    let store = HistoryStore::open(Arc::new(MemoryPersistence::new()), 20).await?;

    let record = clip(1);
    store.append(record.clone()).await?;
    let count = store.append(record.clone()).await?;

    assert_eq!(count, 1);
    Ok(())
}

#[tokio::test]
async fn test_find_returns_identical_metadata() -> Result<()> {
    let store = HistoryStore::open(Arc::new(MemoryPersistence::new()), 20).await?;
    let record = clip(4);
    store.append(record.clone()).await?;

    let id = record.id;
    let found = store.find(|r| r.id == id).await;
    assert_eq!(found, Some(record));
    Ok(())
}

#[tokio::test]
async fn test_resolve_by_id_url_or_filename() -> Result<()> {
    let store = HistoryStore::open(Arc::new(MemoryPersistence::new()), 20).await?;

    let record = clip(7);
    store.append(record.clone()).await?;
    store.append(clip(8)).await?;

    let url = store.object_url(record.id).await.unwrap_or_default();
    assert!(url.starts_with("blob:"));

    for reference in [record.id.to_string(), url, record.filename.clone()] {
        let found = store.resolve(&reference).await;
        assert_eq!(found.map(|r| r.id), Some(record.id), "{}", reference);
    }

    assert!(store.resolve("blob:web-recorder/unknown").await.is_none());
    Ok(())
}

#[tokio::test]
async fn test_remove_and_clear() -> Result<()> {
    let store = HistoryStore::open(Arc::new(MemoryPersistence::new()), 20).await?;

    let record = clip(1);
    store.append(record.clone()).await?;
    store.append(clip(2)).await?;

    assert!(store.remove(record.id).await?);
    assert!(!store.remove(record.id).await?);
    assert_eq!(store.len().await, 1);

    store.clear().await?;
    assert!(store.is_empty().await);
    assert!(store.load().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_history_survives_reopen() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("storage.json");

    let record = clip(3);
    {
        let store = HistoryStore::open(Arc::new(JsonFilePersistence::new(&path)), 20).await?;
        store.append(clip(1)).await?;
        store.append(record.clone()).await?;
    }

    let reopened = HistoryStore::open(Arc::new(JsonFilePersistence::new(&path)), 20).await?;
    let records = reopened.records().await;

    assert_eq!(records.len(), 2);
    assert_eq!(records[0], record);
    assert!(!records[0].converting);

    let doc: Value = serde_json::from_slice(&std::fs::read(&path)?)?;
    assert!(doc["recordings"].is_array());
    assert!(doc["recordings"][0]["blobData"]
        .as_str()
        .unwrap_or_default()
        .starts_with("data:video/webm;base64,"));
    Ok(())
}

#[tokio::test]
async fn test_failed_write_leaves_history_unchanged() -> Result<()> {
    let persistence = Arc::new(FlakyPersistence::default());
    let store = HistoryStore::open(persistence.clone(), 20).await?;

    let kept = clip(1);
    store.append(kept.clone()).await?;

    persistence.failing.store(true, Ordering::SeqCst);

    let err = store.append(clip(2)).await.unwrap_err();
    assert!(matches!(err, RecorderError::Persistence(_)));
    assert!(store.remove(kept.id).await.is_err());
    assert!(store.clear().await.is_err());

    let ids: Vec<_> = store.records().await.into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![kept.id]);
    assert!(store.object_url(kept.id).await.is_some());
    Ok(())
}

#[tokio::test]
async fn test_converting_flag_guards_concurrent_transcodes() -> Result<()> {
    let store = HistoryStore::open(Arc::new(MemoryPersistence::new()), 20).await?;
    let record = clip(1);
    store.append(record.clone()).await?;

    store.begin_converting(record.id).await?;
    let second = store.begin_converting(record.id).await;
    assert!(matches!(second, Err(RecorderError::AlreadyConverting(_))));

    assert!(store.finish_converting(record.id).await);
    assert!(store.begin_converting(record.id).await.is_ok());

    store.remove(record.id).await?;
    assert!(!store.finish_converting(record.id).await);
    Ok(())
}

#[tokio::test]
async fn test_resave_keeps_converting_flag() -> Result<()> {
    let store = HistoryStore::open(Arc::new(MemoryPersistence::new()), 20).await?;
    let record = clip(1);
    store.append(record.clone()).await?;

    store.begin_converting(record.id).await?;

    // A retried save of the same clip arrives mid-transcode
    store.append(record.clone()).await?;

    let second = store.begin_converting(record.id).await;
    assert!(matches!(second, Err(RecorderError::AlreadyConverting(_))));
    assert_eq!(store.len().await, 1);
    Ok(())
}

#[tokio::test]
async fn test_memory_and_persisted_order_agree() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("storage.json");
    let store = HistoryStore::open(Arc::new(JsonFilePersistence::new(&path)), 20).await?;

    // Finished later, saved first
    let later = clip(200);
    let earlier = clip(100);
    store.append(later.clone()).await?;
    store.append(earlier.clone()).await?;

    let in_memory: Vec<_> = store.records().await.into_iter().map(|r| r.id).collect();
    let loaded: Vec<_> = store.load().await?.into_iter().map(|r| r.id).collect();
    assert_eq!(in_memory, vec![earlier.id, later.id]);
    assert_eq!(loaded, in_memory);

    let reopened = HistoryStore::open(Arc::new(JsonFilePersistence::new(&path)), 20).await?;
    let reopened: Vec<_> = reopened.records().await.into_iter().map(|r| r.id).collect();
    assert_eq!(reopened, in_memory);
    Ok(())
}
