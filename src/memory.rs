use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::confidence::ConfidenceLevel;
use crate::error::{LingoError, Result};

pub const MEMORY_FILE: &str = "memory.json";

/// A previously approved or high-confidence translation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub translation: String,
    pub confidence: ConfidenceLevel,
    pub timestamp: DateTime<Utc>,
}

/// Durable, unbounded store of translations keyed like the bounded cache.
///
/// Entries are only added through [`TranslationMemory::promote`] and only
/// removed by [`TranslationMemory::clear`].
pub struct TranslationMemory {
    entries: RwLock<BTreeMap<String, MemoryEntry>>,
    path: Option<PathBuf>,
    /// Serialises writers so snapshots reach the file in update order.
    writer: Mutex<()>,
}

impl TranslationMemory {
    /// A memory that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            path: None,
            writer: Mutex::new(()),
        }
    }

    /// Open (or start) a memory persisted at `path`.
    ///
    /// A missing file means an empty memory. A file that cannot be read or
    /// parsed is logged and ignored; it is overwritten on the next promote.
    pub async fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();

        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(content) => match serde_json::from_str::<BTreeMap<String, MemoryEntry>>(&content) {
                Ok(entries) => {
                    info!("Loaded {} translation memory entries from {}", entries.len(), path.display());
                    entries
                }
                Err(e) => {
                    warn!("Failed to parse translation memory {}: {}", path.display(), e);
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!("Failed to read translation memory {}: {}", path.display(), e);
                BTreeMap::new()
            }
        };

        Self {
            entries: RwLock::new(entries),
            path: Some(path),
            writer: Mutex::new(()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub async fn lookup(&self, key: &str) -> Option<MemoryEntry> {
        let hit = self.entries.read().await.get(key).cloned();
        if hit.is_some() {
            debug!("Translation memory hit: {}", key);
        }
        hit
    }

    /// Record a translation, overwriting any previous entry for the key.
    ///
    /// The in-memory entry is updated even if persisting it fails.
    pub async fn promote(&self, key: &str, translation: &str, confidence: ConfidenceLevel) -> Result<()> {
        let _writer = self.writer.lock().await;
        let snapshot = {
            let mut entries = self.entries.write().await;
            entries.insert(
                key.to_string(),
                MemoryEntry {
                    translation: translation.to_string(),
                    confidence,
                    timestamp: Utc::now(),
                },
            );
            self.path.as_ref().map(|_| entries.clone())
        };
        debug!("Promoted translation into memory: {}", key);
        self.persist(snapshot).await
    }

    /// Remove every entry. Returns how many were removed.
    pub async fn clear(&self) -> Result<u64> {
        let _writer = self.writer.lock().await;
        let count = {
            let mut entries = self.entries.write().await;
            let count = entries.len() as u64;
            entries.clear();
            count
        };
        info!("Cleared {} translation memory entries", count);
        self.persist(self.path.as_ref().map(|_| BTreeMap::new())).await?;
        Ok(count)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Snapshot of all entries, newest first.
    pub async fn list(&self) -> Vec<(String, MemoryEntry)> {
        let mut entries: Vec<_> = self
            .entries
            .read()
            .await
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        entries.sort_by(|a, b| b.1.timestamp.cmp(&a.1.timestamp));
        entries
    }

    /// Write a snapshot taken under the entries lock. Callers hold `writer`,
    /// so lookups are not blocked by the disk write.
    async fn persist(&self, snapshot: Option<BTreeMap<String, MemoryEntry>>) -> Result<()> {
        match (&self.path, snapshot) {
            (Some(path), Some(entries)) => write_json_atomic(path, &entries).await,
            _ => Ok(()),
        }
    }
}

/// Write `value` as pretty JSON next to `path`, then rename it into place.
pub(crate) async fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let content = serde_json::to_string_pretty(value)?;
    let mut tmp_name = path.as_os_str().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    tokio::fs::write(&tmp_path, content).await.map_err(|e| {
        LingoError::Storage(format!("Failed to write {}: {}", tmp_path.display(), e))
    })?;
    tokio::fs::rename(&tmp_path, path).await.map_err(|e| {
        LingoError::Storage(format!("Failed to replace {}: {}", path.display(), e))
    })?;

    Ok(())
}
