//! # Document Object Storage
//!
//! Per-owner namespaced storage for shared PDFs. Objects live at
//! `<root>/<owner_id>/<name>` and are published read-only under
//! `<public_base_url>/documents/<owner_id>/<name>`.
//!
//! Names reaching this layer are already sanitised by the document service;
//! the store still refuses anything that is not a single path segment.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::StoredDocument;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, info};

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Documents of an owner ordered by name
    async fn list(&self, owner_id: &str) -> Result<Vec<StoredDocument>>;

    /// Create or replace a document
    async fn upload(&self, owner_id: &str, name: &str, bytes: &[u8]) -> Result<StoredDocument>;

    async fn download(&self, owner_id: &str, name: &str) -> Result<Option<Vec<u8>>>;

    /// Returns false when the document did not exist
    async fn delete(&self, owner_id: &str, name: &str) -> Result<bool>;

    fn public_url(&self, owner_id: &str, name: &str) -> String;
}

/// Filesystem-backed document store
#[derive(Debug, Clone)]
pub struct LocalDocumentStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalDocumentStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    fn owner_dir(&self, owner_id: &str) -> Result<PathBuf> {
        ensure_segment(owner_id)?;
        Ok(self.root.join(owner_id))
    }

    fn object_path(&self, owner_id: &str, name: &str) -> Result<PathBuf> {
        ensure_segment(name)?;
        Ok(self.owner_dir(owner_id)?.join(name))
    }

    fn describe(&self, owner_id: &str, name: &str, metadata: &std::fs::Metadata) -> StoredDocument {
        let updated_at = metadata
            .modified()
            .map(|t| DateTime::<Utc>::from(t).to_rfc3339())
            .unwrap_or_default();

        StoredDocument {
            name: name.to_string(),
            size_bytes: metadata.len(),
            updated_at,
            public_url: self.public_url(owner_id, name),
        }
    }
}

fn ensure_segment(segment: &str) -> Result<()> {
    if segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(|c| matches!(c, '/' | '\\' | '\0'))
    {
        bail!("Invalid storage path segment: {:?}", segment);
    }
    Ok(())
}

#[async_trait]
impl DocumentStore for LocalDocumentStore {
    async fn list(&self, owner_id: &str) -> Result<Vec<StoredDocument>> {
        let dir = self.owner_dir(owner_id)?;

        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No document folder for owner {} yet", owner_id);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to read {:?}", dir)),
        };

        let mut documents = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                documents.push(self.describe(owner_id, name, &metadata));
            }
        }

        documents.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(documents)
    }

    async fn upload(&self, owner_id: &str, name: &str, bytes: &[u8]) -> Result<StoredDocument> {
        let path = self.object_path(owner_id, name)?;
        let dir = self.owner_dir(owner_id)?;

        fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create {:?}", dir))?;
        fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write {:?}", path))?;

        let metadata = fs::metadata(&path).await?;
        info!("Stored document {} for owner {} ({} bytes)", name, owner_id, metadata.len());
        Ok(self.describe(owner_id, name, &metadata))
    }

    async fn download(&self, owner_id: &str, name: &str) -> Result<Option<Vec<u8>>> {
        let path = self.object_path(owner_id, name)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {:?}", path)),
        }
    }

    async fn delete(&self, owner_id: &str, name: &str) -> Result<bool> {
        let path = self.object_path(owner_id, name)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                info!("Deleted document {} for owner {}", name, owner_id);
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("Failed to delete {:?}", path)),
        }
    }

    fn public_url(&self, owner_id: &str, name: &str) -> String {
        format!(
            "{}/documents/{}/{}",
            self.public_base_url,
            urlencoding::encode(owner_id),
            urlencoding::encode(name)
        )
    }
}
