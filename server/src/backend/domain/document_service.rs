//! PDF document sharing: upload checks, name sanitising and public links.

use anyhow::Result;
use shared::{DocumentUrlResponse, StoredDocument};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::backend::storage::DocumentStore;

const PDF_MAGIC: &[u8] = b"%PDF-";
const MAX_NAME_CHARS: usize = 120;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DocumentError {
    #[error("Invalid document name: {0:?}")]
    InvalidName(String),
    #[error("The file is empty")]
    Empty,
    #[error("Only PDF files can be shared")]
    NotPdf,
    #[error("Document is {size} bytes, the limit is {max} bytes")]
    TooLarge { size: usize, max: usize },
    #[error("Document not found: {0}")]
    NotFound(String),
}

/// Reduce an uploaded file name to a single safe path segment ending in `.pdf`
pub fn sanitize_file_name(raw: &str) -> Result<String, DocumentError> {
    let base = raw.rsplit(|c| c == '/' || c == '\\').next().unwrap_or("");

    let mut name = String::with_capacity(base.len());
    for ch in base.trim().chars() {
        if ch.is_alphanumeric() || matches!(ch, '-' | '_' | '.') {
            name.push(ch);
        } else if ch.is_whitespace() {
            name.push('_');
        }
    }

    let stem = match name.len().checked_sub(4) {
        Some(cut) if name.is_char_boundary(cut) && name[cut..].eq_ignore_ascii_case(".pdf") => &name[..cut],
        _ => name.as_str(),
    };
    let stem: String = stem.trim_matches('.').chars().take(MAX_NAME_CHARS).collect();

    if stem.is_empty() {
        return Err(DocumentError::InvalidName(raw.to_string()));
    }
    Ok(format!("{}.pdf", stem))
}

#[derive(Clone)]
pub struct DocumentService {
    store: Arc<dyn DocumentStore>,
    max_bytes: usize,
}

impl DocumentService {
    pub fn new(store: Arc<dyn DocumentStore>, max_bytes: usize) -> Self {
        Self { store, max_bytes }
    }

    pub async fn list_documents(&self, owner_id: &str) -> Result<Vec<StoredDocument>> {
        self.store.list(owner_id).await
    }

    pub async fn upload_document(&self, owner_id: &str, raw_name: &str, bytes: &[u8]) -> Result<StoredDocument> {
        let name = sanitize_file_name(raw_name)?;

        if bytes.is_empty() {
            return Err(DocumentError::Empty.into());
        }
        if bytes.len() > self.max_bytes {
            warn!("Rejected {} ({} bytes) for owner {}", name, bytes.len(), owner_id);
            return Err(DocumentError::TooLarge { size: bytes.len(), max: self.max_bytes }.into());
        }
        if !bytes.starts_with(PDF_MAGIC) {
            return Err(DocumentError::NotPdf.into());
        }

        let stored = self.store.upload(owner_id, &name, bytes).await?;
        info!("📄 Uploaded {} for owner {}", stored.name, owner_id);
        Ok(stored)
    }

    pub async fn download_document(&self, owner_id: &str, name: &str) -> Result<Vec<u8>> {
        let name = sanitize_file_name(name)?;
        self.store
            .download(owner_id, &name)
            .await?
            .ok_or_else(|| DocumentError::NotFound(name).into())
    }

    pub async fn delete_document(&self, owner_id: &str, name: &str) -> Result<()> {
        let name = sanitize_file_name(name)?;
        if !self.store.delete(owner_id, &name).await? {
            return Err(DocumentError::NotFound(name).into());
        }
        Ok(())
    }

    /// Public link of an existing document
    pub async fn document_url(&self, owner_id: &str, name: &str) -> Result<DocumentUrlResponse> {
        let name = sanitize_file_name(name)?;
        let documents = self.store.list(owner_id).await?;
        match documents.into_iter().find(|d| d.name == name) {
            Some(document) => Ok(DocumentUrlResponse {
                name: document.name,
                public_url: document.public_url,
            }),
            None => Err(DocumentError::NotFound(name).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::storage::LocalDocumentStore;
    use tempfile::TempDir;

    fn service(dir: &TempDir, max_bytes: usize) -> DocumentService {
        DocumentService::new(
            Arc::new(LocalDocumentStore::new(dir.path(), "http://localhost:3000")),
            max_bytes,
        )
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("Tabela 2025.pdf").unwrap(), "Tabela_2025.pdf");
        assert_eq!(sanitize_file_name("../../etc/passwd").unwrap(), "passwd.pdf");
        assert_eq!(sanitize_file_name("C:\\docs\\Preços.PDF").unwrap(), "Preços.pdf");
        assert_eq!(sanitize_file_name("..hidden.pdf").unwrap(), "hidden.pdf");
        assert_eq!(sanitize_file_name("contrato").unwrap(), "contrato.pdf");
        assert!(sanitize_file_name("..").is_err());
        assert!(sanitize_file_name("/").is_err());
        assert!(sanitize_file_name(".pdf").is_err());
    }

    #[tokio::test]
    async fn test_upload_checks() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir, 16);

        let err = service.upload_document("owner-1", "a.pdf", b"hello").await.unwrap_err();
        assert_eq!(err.downcast_ref::<DocumentError>(), Some(&DocumentError::NotPdf));

        let err = service.upload_document("owner-1", "a.pdf", b"").await.unwrap_err();
        assert_eq!(err.downcast_ref::<DocumentError>(), Some(&DocumentError::Empty));

        let err = service
            .upload_document("owner-1", "a.pdf", b"%PDF-1.4 far too long")
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DocumentError>(),
            Some(DocumentError::TooLarge { max: 16, .. })
        ));

        let stored = service.upload_document("owner-1", "Tabela.pdf", b"%PDF-1.4").await.unwrap();
        assert_eq!(stored.name, "Tabela.pdf");
    }

    #[tokio::test]
    async fn test_download_url_and_delete() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir, 1024);
        service.upload_document("owner-1", "Tabela.pdf", b"%PDF-1.4").await.unwrap();

        assert_eq!(service.download_document("owner-1", "Tabela.pdf").await.unwrap(), b"%PDF-1.4");

        let url = service.document_url("owner-1", "Tabela.pdf").await.unwrap();
        assert_eq!(url.public_url, "http://localhost:3000/documents/owner-1/Tabela.pdf");

        let err = service.document_url("owner-2", "Tabela.pdf").await.unwrap_err();
        assert!(matches!(err.downcast_ref::<DocumentError>(), Some(DocumentError::NotFound(_))));

        service.delete_document("owner-1", "Tabela.pdf").await.unwrap();
        assert!(service.download_document("owner-1", "Tabela.pdf").await.is_err());
    }
}
