use crate::core::model::{Asset, Record, RecordId, Transaction};
use crate::core::repository::Repository;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// On-disk layout: one JSON document holding both collections. Keys other
/// than the two collections are carried through untouched.
#[derive(Debug, Default, Serialize, Deserialize)]
struct LedgerDocument {
    #[serde(default)]
    transactions: Vec<Value>,
    #[serde(default)]
    assets: Vec<Value>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Repository backed by a single JSON file.
///
/// Entries are kept as raw JSON until read so that an entry which no longer
/// parses is skipped on load but never dropped from the file.
pub struct FileRepository {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileRepository {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        FileRepository {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> Result<LedgerDocument> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No ledger file at {}, starting empty", self.path.display());
                return Ok(LedgerDocument::default());
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read ledger file: {}", self.path.display())
                });
            }
        };
        if content.trim().is_empty() {
            return Ok(LedgerDocument::default());
        }
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse ledger file: {}", self.path.display()))
    }

    async fn write_document(&self, document: &LedgerDocument) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(document)?;
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, content)
            .await
            .with_context(|| format!("Failed to write ledger file: {}", tmp_path.display()))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .with_context(|| format!("Failed to replace ledger file: {}", self.path.display()))?;
        debug!("Wrote ledger file {}", self.path.display());
        Ok(())
    }

    async fn list<T: Record>(&self, pick: fn(&LedgerDocument) -> &Vec<Value>) -> Result<Vec<T>> {
        let _guard = self.lock.lock().await;
        let document = self.read_document().await?;
        Ok(parse_entries(pick(&document)))
    }

    async fn modify(&self, change: impl FnOnce(&mut LedgerDocument) -> Result<()>) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut document = self.read_document().await?;
        change(&mut document)?;
        self.write_document(&document).await
    }
}

fn parse_entries<T: Record>(entries: &[Value]) -> Vec<T> {
    entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value(entry.clone()) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(
                    collection = T::COLLECTION,
                    index, "Skipping malformed stored entry: {e}"
                );
                None
            }
        })
        .collect()
}

fn entry_id(entry: &Value) -> Option<RecordId> {
    entry
        .get("id")
        .and_then(|id| serde_json::from_value(id.clone()).ok())
}

fn upsert<T: Record>(entries: &mut Vec<Value>, record: &T) -> Result<()> {
    let value = serde_json::to_value(record)?;
    match entries
        .iter_mut()
        .find(|entry| entry_id(entry).as_ref() == Some(record.id()))
    {
        Some(existing) => *existing = value,
        None => entries.push(value),
    }
    Ok(())
}

fn remove(entries: &mut Vec<Value>, id: &RecordId) {
    entries.retain(|entry| entry_id(entry).as_ref() != Some(id));
}

#[async_trait]
impl Repository for FileRepository {
    async fn list_transactions(&self) -> Result<Vec<Transaction>> {
        self.list(|d| &d.transactions).await
    }

    async fn list_assets(&self) -> Result<Vec<Asset>> {
        self.list(|d| &d.assets).await
    }

    async fn put_transaction(&self, transaction: &Transaction) -> Result<()> {
        self.modify(|d| upsert(&mut d.transactions, transaction)).await
    }

    async fn put_asset(&self, asset: &Asset) -> Result<()> {
        self.modify(|d| upsert(&mut d.assets, asset)).await
    }

    async fn delete_transaction(&self, id: &RecordId) -> Result<()> {
        self.modify(|d| {
            remove(&mut d.transactions, id);
            Ok(())
        })
        .await
    }

    async fn delete_asset(&self, id: &RecordId) -> Result<()> {
        self.modify(|d| {
            remove(&mut d.assets, id);
            Ok(())
        })
        .await
    }
}
