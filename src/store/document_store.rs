//! JSON document store
//!
//! The whole session lives in one JSON array on disk, rewritten on
//! every append.

use std::path::{Path, PathBuf};

use thiserror::Error;

use super::record::DocumentRecord;

/// Store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize records: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Append-only JSON array of records in a single file
#[derive(Debug, Clone)]
pub struct DocumentStore {
    path: PathBuf,
}

impl DocumentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the store with an empty array
    pub async fn reset(&self) -> Result<(), StoreError> {
        self.ensure_parent_dir().await?;
        tokio::fs::write(&self.path, b"[]")
            .await
            .map_err(|e| self.io_error(e))?;

        tracing::info!(path = %self.path.display(), "Document store reset");
        Ok(())
    }

    /// All records, oldest first.
    ///
    /// An absent, blank or unparseable file reads as empty.
    pub async fn load(&self) -> Vec<DocumentRecord> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "Failed to read document store: {}", e);
                return Vec::new();
            }
        };

        if raw.trim().is_empty() {
            return Vec::new();
        }

        match serde_json::from_str::<Vec<DocumentRecord>>(&raw) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    "Document store is corrupt, treating as empty: {}",
                    e
                );
                Vec::new()
            }
        }
    }

    /// Add records at the end; empty input leaves the file untouched
    pub async fn append(&self, records: &[DocumentRecord]) -> Result<(), StoreError> {
        if records.is_empty() {
            return Ok(());
        }

        let mut all = self.load().await;
        all.extend_from_slice(records);
        self.save(&all).await?;

        tracing::debug!(added = records.len(), total = all.len(), "Appended records");
        Ok(())
    }

    /// Rewrite the whole file through a temporary sibling and a rename
    async fn save(&self, records: &[DocumentRecord]) -> Result<(), StoreError> {
        self.ensure_parent_dir().await?;

        let json = serde_json::to_string_pretty(records)?;
        let tmp = self.path.with_extension("json.tmp");

        tokio::fs::write(&tmp, json.as_bytes())
            .await
            .map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        Ok(())
    }

    async fn ensure_parent_dir(&self) -> Result<(), StoreError> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e)),
            _ => Ok(()),
        }
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

/// One usage session: the store is reset exactly once, on creation
#[derive(Debug)]
pub struct Session {
    id: uuid::Uuid,
    started_at: chrono::DateTime<chrono::Utc>,
    store: DocumentStore,
}

impl Session {
    pub async fn begin(store: DocumentStore) -> Result<Self, StoreError> {
        store.reset().await?;
        let session = Self {
            id: uuid::Uuid::new_v4(),
            started_at: chrono::Utc::now(),
            store,
        };
        tracing::info!(session = %session.id, "Session started");
        Ok(session)
    }

    pub fn id(&self) -> uuid::Uuid {
        self.id
    }

    pub fn started_at(&self) -> chrono::DateTime<chrono::Utc> {
        self.started_at
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::PersonFields;
    use crate::store::build_records;

    fn records(names: &[&str]) -> Vec<DocumentRecord> {
        let people: Vec<PersonFields> = names
            .iter()
            .map(|n| PersonFields {
                full_name: Some(n.to_string()),
                ..Default::default()
            })
            .collect();
        build_records(&people, "doc.pdf", false)
    }

    fn temp_store() -> (tempfile::TempDir, DocumentStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path().join("data").join("documentos.json"));
        (dir, store)
    }

    #[tokio::test]
    async fn test_reset_then_append_then_load() {
        let (_dir, store) = temp_store();
        store.reset().await.unwrap();

        let first = records(&["A", "B"]);
        let second = records(&["C"]);
        store.append(&first).await.unwrap();
        store.append(&second).await.unwrap();

        let loaded = store.load().await;
        let expected: Vec<_> = first.into_iter().chain(second).collect();
        assert_eq!(loaded, expected);
    }

    #[tokio::test]
    async fn test_append_empty_is_noop() {
        let (_dir, store) = temp_store();
        store.reset().await.unwrap();
        store.append(&records(&["A"])).await.unwrap();
        let before = tokio::fs::read(store.path()).await.unwrap();

        store.append(&[]).await.unwrap();

        let after = tokio::fs::read(store.path()).await.unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_reset_writes_empty_array() {
        let (_dir, store) = temp_store();
        store.append(&records(&["A"])).await.unwrap();
        store.reset().await.unwrap();

        assert_eq!(tokio::fs::read_to_string(store.path()).await.unwrap(), "[]");
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_absent_blank_and_corrupt_files_read_empty() {
        let (_dir, store) = temp_store();
        assert!(store.load().await.is_empty());

        tokio::fs::create_dir_all(store.path().parent().unwrap()).await.unwrap();
        tokio::fs::write(store.path(), "  \n").await.unwrap();
        assert!(store.load().await.is_empty());

        tokio::fs::write(store.path(), "{\"not\": \"an array\"}").await.unwrap();
        assert!(store.load().await.is_empty());

        // Appending over a corrupt file starts from empty
        store.append(&records(&["A"])).await.unwrap();
        assert_eq!(store.load().await.len(), 1);
    }

    #[tokio::test]
    async fn test_session_begin_resets() {
        let (_dir, store) = temp_store();
        store.append(&records(&["old"])).await.unwrap();

        let session = Session::begin(store.clone()).await.unwrap();
        assert!(session.store().load().await.is_empty());
    }
}
