//! `MatchStore` implementations: in-memory and a single JSON file.
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use affinity_core::traits::MatchStore;
use affinity_core::{Error, MatchRecord, Result};

#[derive(Debug, Default)]
pub struct InMemoryMatchStore {
    records: RwLock<Vec<MatchRecord>>,
}

impl InMemoryMatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl MatchStore for InMemoryMatchStore {
    async fn exists(&self, user_id: &str, matched_user_id: &str, event_id: &str) -> Result<bool> {
        Ok(self.records.read().await.iter().any(|r| r.same_pair(user_id, matched_user_id, event_id)))
    }

    async fn insert(&self, record: MatchRecord) -> Result<()> {
        self.records.write().await.push(record);
        Ok(())
    }

    async fn list(&self, event_id: &str) -> Result<Vec<MatchRecord>> {
        Ok(self.records.read().await.iter().filter(|r| r.event_id == event_id).cloned().collect())
    }
}

/// Match records kept as one JSON array, rewritten on every insert.
///
/// A missing file reads as an empty store. Writes go through a sibling
/// temporary file and a rename.
#[derive(Debug)]
pub struct JsonFileMatchStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileMatchStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Vec<MatchRecord>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| Error::Store(format!("decoding {}: {e}", self.path.display()))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(Error::Store(format!("reading {}: {e}", self.path.display()))),
        }
    }

    async fn write_all(&self, records: &[MatchRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::Store(format!("creating {}: {e}", parent.display())))?;
        }
        let json = serde_json::to_vec_pretty(records).map_err(|e| Error::Store(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| Error::Store(format!("writing {}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| Error::Store(format!("replacing {}: {e}", self.path.display())))
    }
}

#[async_trait]
impl MatchStore for JsonFileMatchStore {
    async fn exists(&self, user_id: &str, matched_user_id: &str, event_id: &str) -> Result<bool> {
        Ok(self.read_all().await?.iter().any(|r| r.same_pair(user_id, matched_user_id, event_id)))
    }

    async fn insert(&self, record: MatchRecord) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.read_all().await?;
        records.push(record);
        self.write_all(&records).await?;
        debug!(path = %self.path.display(), total = records.len(), "match record written");
        Ok(())
    }

    async fn list(&self, event_id: &str) -> Result<Vec<MatchRecord>> {
        Ok(self.read_all().await?.into_iter().filter(|r| r.event_id == event_id).collect())
    }
}
