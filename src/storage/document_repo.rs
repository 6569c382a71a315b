use crate::domain::{Document, DocumentId};
use crate::error::{AppError, Result};
use crate::storage::DocumentRepository;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Process-lifetime document store behind a single reader/writer lock.
#[derive(Debug, Default)]
pub struct InMemoryDocumentRepository {
    documents: RwLock<HashMap<DocumentId, Document>>,
}

impl InMemoryDocumentRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentRepository for InMemoryDocumentRepository {
    #[tracing::instrument(level = "debug", skip(self), fields(document_id = %id))]
    async fn find_by_id(&self, id: &DocumentId) -> Result<Document> {
        let documents = self.documents.read().await;
        documents.get(id).cloned().ok_or(AppError::DocumentNotFound)
    }

    #[tracing::instrument(
        level = "debug",
        skip(self, document),
        fields(document_id = %document.id(), version = document.version())
    )]
    async fn save(&self, document: &Document) -> Result<()> {
        let snapshot = document.clone();
        let mut documents = self.documents.write().await;
        documents.insert(snapshot.id().clone(), snapshot);
        Ok(())
    }

    async fn exists(&self, id: &DocumentId) -> Result<bool> {
        Ok(self.documents.read().await.contains_key(id))
    }

    async fn list_ids(&self) -> Result<Vec<DocumentId>> {
        Ok(self.documents.read().await.keys().cloned().collect())
    }

    #[tracing::instrument(level = "debug", skip(self), fields(document_id = %id))]
    async fn delete(&self, id: &DocumentId) -> Result<bool> {
        Ok(self.documents.write().await.remove(id).is_some())
    }

    #[tracing::instrument(level = "debug", skip(self), fields(document_id = %id))]
    async fn delete_if_version(&self, id: &DocumentId, expected_version: u64) -> Result<bool> {
        let mut documents = self.documents.write().await;
        if documents.get(id).is_some_and(|stored| stored.version() == expected_version) {
            documents.remove(id);
            return Ok(true);
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Attachment, AttachmentId, Content, FileName, FileSize, MimeType};
    use std::collections::HashSet;
    use std::sync::Arc;
    use time::OffsetDateTime;

    fn attachment(id: &str, now: OffsetDateTime) -> Attachment {
        Attachment::new(
            AttachmentId::new(id),
            DocumentId::new("d1"),
            FileName::new("a.bin").unwrap(),
            MimeType::default(),
            FileSize::new(3).unwrap(),
            now,
        )
    }

    #[tokio::test]
    async fn test_save_then_find_round_trips() {
        let repo = InMemoryDocumentRepository::new();
        let now = OffsetDateTime::now_utc();
        let mut doc = Document::new(DocumentId::new("d1"), now);
        doc.update_content(Content::new("hello").unwrap(), now).unwrap();
        doc.add_attachment(attachment("f1", now), now).unwrap();

        repo.save(&doc).await.unwrap();
        let found = repo.find_by_id(&DocumentId::new("d1")).await.unwrap();

        assert_eq!(found, doc);
        assert_eq!(found.version(), 3);
        assert_eq!(found.last_updated(), doc.last_updated());
        assert_eq!(found.expires_at(), doc.expires_at());
    }

    #[tokio::test]
    async fn test_missing_document() {
        let repo = InMemoryDocumentRepository::new();
        let id = DocumentId::new("missing");
        assert_eq!(repo.find_by_id(&id).await.unwrap_err(), AppError::DocumentNotFound);
        assert!(!repo.exists(&id).await.unwrap());
        assert!(!repo.delete(&id).await.unwrap());
    }

    #[tokio::test]
    async fn test_returned_copies_are_isolated() {
        let repo = InMemoryDocumentRepository::new();
        let now = OffsetDateTime::now_utc();
        repo.save(&Document::new(DocumentId::new("d1"), now)).await.unwrap();

        let mut copy = repo.find_by_id(&DocumentId::new("d1")).await.unwrap();
        copy.add_attachment(attachment("f1", now), now).unwrap();
        copy.update_content(Content::new("local only").unwrap(), now).unwrap();

        let stored = repo.find_by_id(&DocumentId::new("d1")).await.unwrap();
        assert_eq!(stored.attachment_count(), 0);
        assert!(stored.content().is_empty());
        assert_eq!(stored.version(), 1);
    }

    #[tokio::test]
    async fn test_save_is_last_writer_wins() {
        let repo = InMemoryDocumentRepository::new();
        let now = OffsetDateTime::now_utc();
        repo.save(&Document::new(DocumentId::new("d1"), now)).await.unwrap();

        let mut first = repo.find_by_id(&DocumentId::new("d1")).await.unwrap();
        let mut second = repo.find_by_id(&DocumentId::new("d1")).await.unwrap();
        first.update_content(Content::new("first").unwrap(), now).unwrap();
        second.update_content(Content::new("second").unwrap(), now).unwrap();

        repo.save(&first).await.unwrap();
        repo.save(&second).await.unwrap();

        let stored = repo.find_by_id(&DocumentId::new("d1")).await.unwrap();
        assert_eq!(stored.content().as_str(), "second");
        assert_eq!(stored.version(), 2);
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let repo = InMemoryDocumentRepository::new();
        let now = OffsetDateTime::now_utc();
        for id in ["a", "b"] {
            repo.save(&Document::new(DocumentId::new(id), now)).await.unwrap();
        }

        let ids: HashSet<DocumentId> = repo.list_ids().await.unwrap().into_iter().collect();
        assert_eq!(ids, HashSet::from([DocumentId::new("a"), DocumentId::new("b")]));

        assert!(repo.delete(&DocumentId::new("a")).await.unwrap());
        assert!(!repo.exists(&DocumentId::new("a")).await.unwrap());
        assert!(repo.exists(&DocumentId::new("b")).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_if_version_skips_newer_copy() {
        let repo = InMemoryDocumentRepository::new();
        let now = OffsetDateTime::now_utc();
        let id = DocumentId::new("d1");
        repo.save(&Document::new(id.clone(), now)).await.unwrap();

        let mut renewed = repo.find_by_id(&id).await.unwrap();
        renewed.clear(now);
        repo.save(&renewed).await.unwrap();

        assert!(!repo.delete_if_version(&id, 1).await.unwrap());
        assert!(repo.exists(&id).await.unwrap());

        assert!(repo.delete_if_version(&id, renewed.version()).await.unwrap());
        assert!(!repo.exists(&id).await.unwrap());
        assert!(!repo.delete_if_version(&id, renewed.version()).await.unwrap());
    }

    #[tokio::test]
    async fn test_concurrent_saves_of_distinct_documents() {
        let repo = Arc::new(InMemoryDocumentRepository::new());
        let now = OffsetDateTime::now_utc();

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let repo = Arc::clone(&repo);
                tokio::spawn(async move { repo.save(&Document::new(DocumentId::new(format!("doc-{i}")), now)).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(repo.list_ids().await.unwrap().len(), 16);
    }
}
