use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

/// Key/value store over JSON documents.
///
/// No transactions: the last `set` for a key wins.
#[async_trait::async_trait]
pub trait Persistence: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    async fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// Process-local store; contents vanish with the process
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    doc: Mutex<Map<String, Value>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl Persistence for MemoryPersistence {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.doc.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.doc.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// One JSON object on disk holding every key.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// crash mid-write leaves the previous document intact.
#[derive(Debug)]
pub struct JsonFilePersistence {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFilePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> Result<Map<String, Value>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {:?}", self.path));
            }
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Map::new());
        }

        match serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse {:?}", self.path))?
        {
            Value::Object(map) => Ok(map),
            other => anyhow::bail!("{:?} holds {} instead of an object", self.path, kind(&other)),
        }
    }
}

#[async_trait::async_trait]
impl Persistence for JsonFilePersistence {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let mut doc = self.read_document().await?;
        Ok(doc.remove(key))
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut doc = self.read_document().await?;
        doc.insert(key.to_string(), value);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create {:?}", parent))?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        let bytes = serde_json::to_vec(&Value::Object(doc))?;
        tokio::fs::write(&tmp, &bytes)
            .await
            .with_context(|| format!("Failed to write {:?}", tmp))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("Failed to replace {:?}", self.path))?;

        debug!("Persisted {} ({} bytes) to {:?}", key, bytes.len(), self.path);
        Ok(())
    }

    fn name(&self) -> &str {
        "json-file"
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
