use std::io;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::ident;

/// A record kind persisted as one named collection document.
///
/// The on-disk shape is a single JSON object with exactly one top-level
/// field ([`DOC_FIELD`](Record::DOC_FIELD)) holding the record array.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Name of the top-level document field holding the record sequence.
    const DOC_FIELD: &'static str;

    fn id(&self) -> &str;
}

/// Record kinds whose ids are generated by the store at append time.
pub trait GeneratedId: Record {
    /// Caller-supplied fields of a new record, without an id.
    type Draft: Send;

    /// Prefix baked into generated ids.
    const ID_PREFIX: &'static str;

    /// Attach a freshly generated id to a draft, producing the full record.
    fn finalize(id: String, draft: Self::Draft) -> Self;
}

/// Durable store for one collection of records.
///
/// Every operation reloads the full document from disk before acting, so a
/// caller always observes writes made since its last call.  Mutations hold
/// the collection gate across the whole reload → modify → persist cycle;
/// operations on *different* collections are independent.
pub struct Collection<R: Record> {
    path: PathBuf,
    gate: Mutex<()>,
    _record: PhantomData<R>,
}

impl<R: Record> Collection<R> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            gate: Mutex::new(()),
            _record: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure the backing document exists, creating it with an empty
    /// collection when absent.  Idempotent: existing records are preserved.
    pub async fn init(&self) -> Result<()> {
        let _gate = self.gate.lock().await;
        let records = self.load().await?;
        self.persist(&records).await?;
        debug!(path = %self.path.display(), records = records.len(), "collection initialised");
        Ok(())
    }

    /// Reload the document and return all records in insertion order.
    pub async fn list(&self) -> Result<Vec<R>> {
        let _gate = self.gate.lock().await;
        self.load().await
    }

    /// Reload, replace the record with a matching id or append it, and
    /// persist the full document.
    pub async fn upsert(&self, record: R) -> Result<()> {
        let _gate = self.gate.lock().await;
        let mut records = self.load().await?;
        match records.iter_mut().find(|existing| existing.id() == record.id()) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
        self.persist(&records).await
    }

    /// Reload and linear-scan for a matching id.  Absence is `None`.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<R>> {
        let _gate = self.gate.lock().await;
        let records = self.load().await?;
        Ok(records.into_iter().find(|record| record.id() == id))
    }

    /// Load the full document image.  A missing file, an empty file, or a
    /// document without the collection field all read as an empty sequence.
    async fn load(&self) -> Result<Vec<R>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(self.unavailable(err)),
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        let mut doc: serde_json::Value =
            serde_json::from_str(&raw).map_err(|err| self.malformed(err))?;
        match doc.get_mut(R::DOC_FIELD) {
            Some(records) => {
                serde_json::from_value(records.take()).map_err(|err| self.malformed(err))
            }
            None => Ok(Vec::new()),
        }
    }

    /// Atomically replace the document with a new full image.
    ///
    /// The image is written to a `.tmp` sibling, fsync'd, then renamed over
    /// the original.  A crash or error before the rename leaves the previous
    /// document untouched; the `.tmp` file is cleaned up on any error path.
    async fn persist(&self, records: &[R]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| self.unavailable(err))?;
        }

        let tmp_path = {
            let filename = self
                .path
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| format!("{}.json", R::DOC_FIELD));
            self.path.with_file_name(format!("{filename}.tmp"))
        };

        let mut doc = serde_json::Map::new();
        doc.insert(
            R::DOC_FIELD.to_string(),
            serde_json::to_value(records).map_err(|err| self.malformed(err))?,
        );
        let rendered =
            serde_json::to_string_pretty(&doc).map_err(|err| self.malformed(err))?;

        let write_result: Result<()> = async {
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp_path)
                .await
                .map_err(|err| self.unavailable(err))?;
            file.write_all(rendered.as_bytes())
                .await
                .map_err(|err| self.unavailable(err))?;
            file.flush().await.map_err(|err| self.unavailable(err))?;
            file.sync_all().await.map_err(|err| self.unavailable(err))?;
            Ok(())
        }
        .await;

        if let Err(err) = write_result {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(err);
        }

        if let Err(err) = tokio::fs::rename(&tmp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(self.unavailable(err));
        }

        Ok(())
    }

    fn unavailable(&self, source: io::Error) -> StoreError {
        StoreError::Unavailable {
            path: self.path.clone(),
            source,
        }
    }

    fn malformed(&self, source: serde_json::Error) -> StoreError {
        StoreError::Malformed {
            path: self.path.clone(),
            source,
        }
    }
}

impl<R: GeneratedId> Collection<R> {
    /// Reload, finalize the draft with a generated id, append, and persist
    /// the full document.  The reload happens inside the same critical
    /// section as the append, so two `append` calls on one collection can
    /// never interleave mid-operation.
    pub async fn append(&self, draft: R::Draft) -> Result<R> {
        let _gate = self.gate.lock().await;
        let mut records = self.load().await?;
        let record = R::finalize(ident::new_id(R::ID_PREFIX), draft);
        records.push(record.clone());
        self.persist(&records).await?;
        debug!(path = %self.path.display(), id = %record.id(), "record appended");
        Ok(record)
    }
}
