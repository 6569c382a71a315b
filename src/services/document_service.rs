use crate::domain::{Attachment, Clock, Content, Document, DocumentId};
use crate::error::{AppError, Result};
use crate::storage::DocumentRepository;
use std::sync::Arc;
use time::{Duration, OffsetDateTime};

/// A document as presented to readers: only attachments that are still live.
#[derive(Debug, Clone)]
pub struct DocumentView {
    pub document: Document,
    pub attachments: Vec<Attachment>,
    pub as_of: OffsetDateTime,
}

/// Read-modify-write orchestration over the document repository.
#[derive(Clone)]
pub struct DocumentService {
    repo: Arc<dyn DocumentRepository>,
    clock: Arc<dyn Clock>,
    max_content_bytes: usize,
}

impl std::fmt::Debug for DocumentService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentService")
            .field("clock", &self.clock)
            .field("max_content_bytes", &self.max_content_bytes)
            .finish_non_exhaustive()
    }
}

impl DocumentService {
    #[must_use]
    pub fn new(repo: Arc<dyn DocumentRepository>, clock: Arc<dyn Clock>, max_content_bytes: usize) -> Self {
        Self { repo, clock, max_content_bytes }
    }

    #[must_use]
    pub fn now(&self) -> OffsetDateTime {
        self.clock.now()
    }

    /// Loads a document, creating and persisting a fresh one if it does not exist.
    ///
    /// # Errors
    /// Propagates any repository failure other than `AppError::DocumentNotFound`.
    #[tracing::instrument(err(level = "warn"), skip(self), fields(document_id = %id))]
    pub async fn get_or_create(&self, id: &DocumentId) -> Result<Document> {
        match self.repo.find_by_id(id).await {
            Ok(document) => Ok(document),
            Err(AppError::DocumentNotFound) => {
                let document = Document::new(id.clone(), self.clock.now());
                self.repo.save(&document).await?;
                tracing::debug!("Created document");
                Ok(document)
            }
            Err(e) => Err(e),
        }
    }

    /// Validates and applies new content, persisting the result.
    ///
    /// # Errors
    /// Returns `AppError::ContentTooLarge` before storage is touched if the content is
    /// too big, and `AppError::Expired` if the document can no longer be mutated.
    #[tracing::instrument(
        err(level = "warn"),
        skip(self, raw),
        fields(document_id = %id, content_len = raw.len(), version = tracing::field::Empty)
    )]
    pub async fn update_content(&self, id: &DocumentId, raw: String) -> Result<Document> {
        let content = Content::with_max_len(raw, self.max_content_bytes)?;

        let mut document = self.get_or_create(id).await?;
        let previous = document.version();
        document.update_content(content, self.clock.now())?;

        if document.version() != previous {
            self.repo.save(&document).await?;
        }

        tracing::Span::current().record("version", document.version());
        Ok(document)
    }

    /// Returns the document with expired attachments filtered out.
    ///
    /// # Errors
    /// Propagates repository failures.
    pub async fn get_content(&self, id: &DocumentId) -> Result<DocumentView> {
        let document = self.get_or_create(id).await?;
        let as_of = self.clock.now();
        let attachments = document.active_attachments(as_of);
        Ok(DocumentView { document, attachments, as_of })
    }

    /// Empties the document content.
    ///
    /// # Errors
    /// Propagates repository failures.
    #[tracing::instrument(err(level = "warn"), skip(self), fields(document_id = %id))]
    pub async fn clear(&self, id: &DocumentId) -> Result<Document> {
        let mut document = self.get_or_create(id).await?;
        document.clear(self.clock.now());
        self.repo.save(&document).await?;
        Ok(document)
    }

    /// Pushes an existing document's expiration forward.
    ///
    /// # Errors
    /// Returns `AppError::DocumentNotFound` if the document does not exist and
    /// `AppError::Expired` if it has already expired.
    #[tracing::instrument(err(level = "warn"), skip(self), fields(document_id = %id))]
    pub async fn extend_expiration(&self, id: &DocumentId, by: Duration) -> Result<Document> {
        let mut document = self.repo.find_by_id(id).await?;
        document.extend_expiration(by, self.clock.now())?;
        self.repo.save(&document).await?;
        Ok(document)
    }
}
