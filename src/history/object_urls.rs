use super::record::RecordId;
use std::collections::HashMap;

/// Transient `blob:` references handed to surfaces for playback.
///
/// They live only as long as the process and must be revoked when the record
/// they point at goes away.
#[derive(Debug)]
pub struct ObjectUrls {
    origin: String,
    urls: HashMap<RecordId, String>,
}

impl ObjectUrls {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            urls: HashMap::new(),
        }
    }

    /// Existing URL for a record, or a new one
    pub fn acquire(&mut self, id: RecordId) -> String {
        let origin = &self.origin;
        self.urls
            .entry(id)
            .or_insert_with(|| format!("blob:{}/{}", origin, uuid::Uuid::new_v4()))
            .clone()
    }

    /// Which record a URL points at
    pub fn resolve(&self, url: &str) -> Option<RecordId> {
        self.urls
            .iter()
            .find(|(_, candidate)| candidate.as_str() == url)
            .map(|(id, _)| *id)
    }

    pub fn revoke(&mut self, id: RecordId) -> Option<String> {
        self.urls.remove(&id)
    }

    pub fn revoke_all(&mut self) -> usize {
        let count = self.urls.len();
        self.urls.clear();
        count
    }
}
