use crate::domain::{Attachment, AttachmentId, Document, DocumentId, FileName, FileSize, MimeType};
use crate::error::{AppError, Result};
use crate::services::document_service::DocumentService;
use crate::storage::{BlobStorage, DocumentRepository, StorageStream};
use bytes::Bytes;
use opentelemetry::{
    global,
    metrics::{Counter, Histogram},
};
use std::sync::Arc;
use time::OffsetDateTime;

#[derive(Clone, Debug)]
pub(crate) struct Metrics {
    pub(crate) uploaded_bytes: Counter<u64>,
    pub(crate) upload_size_bytes: Histogram<u64>,
    pub(crate) rollbacks: Counter<u64>,
    pub(crate) blob_delete_failures: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("homeclip");
        Self {
            uploaded_bytes: meter
                .u64_counter("attachments_uploaded_bytes")
                .with_description("Total bytes of attachments uploaded")
                .build(),
            upload_size_bytes: meter
                .u64_histogram("attachments_upload_size_bytes")
                .with_description("Distribution of attachment upload sizes")
                .build(),
            rollbacks: meter
                .u64_counter("attachments_upload_rollbacks_total")
                .with_description("Uploads whose stored file was discarded after the document update failed")
                .build(),
            blob_delete_failures: meter
                .u64_counter("attachments_blob_delete_failures_total")
                .with_description("Best-effort file deletions that failed and were ignored")
                .build(),
        }
    }
}

/// A file upload as handed over by the transport layer.
pub struct UploadRequest {
    pub document_id: DocumentId,
    pub file_name: String,
    pub mime_type: Option<String>,
    pub size: u64,
    pub content: StorageStream,
}

impl std::fmt::Debug for UploadRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadRequest")
            .field("document_id", &self.document_id)
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// Coordinates attachment writes across the document and blob stores.
///
/// Uploads write the blob first and register it on the document second; if the
/// second step fails the blob is deleted again before the error is returned.
#[derive(Clone)]
pub struct AttachmentService {
    documents: DocumentService,
    repo: Arc<dyn DocumentRepository>,
    blobs: Arc<dyn BlobStorage>,
    max_file_bytes: u64,
    metrics: Metrics,
}

impl std::fmt::Debug for AttachmentService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttachmentService")
            .field("documents", &self.documents)
            .field("max_file_bytes", &self.max_file_bytes)
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

impl AttachmentService {
    #[must_use]
    pub fn new(
        documents: DocumentService,
        repo: Arc<dyn DocumentRepository>,
        blobs: Arc<dyn BlobStorage>,
        max_file_bytes: u64,
    ) -> Self {
        Self { documents, repo, blobs, max_file_bytes, metrics: Metrics::new() }
    }

    #[must_use]
    pub fn now(&self) -> OffsetDateTime {
        self.documents.now()
    }

    /// Stores a file and attaches it to a document.
    ///
    /// # Errors
    /// Returns a validation error before anything is stored if the name or size is
    /// invalid. Returns `AppError::Expired` if the document is expired. Any failure
    /// after the file was stored leaves no blob behind.
    #[tracing::instrument(
        err(level = "warn"),
        skip(self, request),
        fields(
            document_id = %request.document_id,
            attachment_id = tracing::field::Empty,
            attachment_size = request.size,
        )
    )]
    pub async fn upload(&self, request: UploadRequest) -> Result<Attachment> {
        let file_name = FileName::new(&request.file_name)?;
        let mime_type = request.mime_type.as_deref().map_or_else(MimeType::default, MimeType::new);
        let size = FileSize::with_max(request.size, self.max_file_bytes)?;

        let id = AttachmentId::generate();
        tracing::Span::current().record("attachment_id", tracing::field::display(&id));

        let mut document = self.documents.get_or_create(&request.document_id).await?;

        let stored = self.blobs.store(&id, request.content).await?;
        if stored != size.bytes() {
            self.discard_blob(&id).await;
            return Err(AppError::BadRequest(format!(
                "declared size {} does not match received {stored} bytes",
                size.bytes()
            )));
        }

        let attachment =
            Attachment::new(id.clone(), document.id().clone(), file_name, mime_type, size, self.documents.now());

        if let Err(e) = self.register(&mut document, attachment.clone()).await {
            self.discard_blob(&id).await;
            return Err(e);
        }

        self.metrics.uploaded_bytes.add(size.bytes(), &[]);
        self.metrics.upload_size_bytes.record(size.bytes(), &[]);
        tracing::debug!(version = document.version(), "Attachment uploaded");

        Ok(attachment)
    }

    /// Detaches a file from its document, then deletes the stored bytes.
    ///
    /// The document update is authoritative; a failure to delete the bytes
    /// afterwards is logged and ignored.
    ///
    /// # Errors
    /// Returns `AppError::DocumentNotFound` or `AppError::AttachmentNotFound` if
    /// either is missing, or a storage error if the document cannot be saved.
    #[tracing::instrument(err(level = "warn"), skip(self), fields(document_id = %document_id, attachment_id = %attachment_id))]
    pub async fn delete(&self, document_id: &DocumentId, attachment_id: &AttachmentId) -> Result<Document> {
        let mut document = self.repo.find_by_id(document_id).await?;
        document.remove_attachment(attachment_id, self.documents.now())?;
        self.repo.save(&document).await?;

        if let Err(e) = self.blobs.delete(attachment_id).await {
            tracing::warn!(error = %e, "Failed to delete attachment content");
            self.metrics.blob_delete_failures.add(1, &[]);
        }

        Ok(document)
    }

    /// Fetches an attachment and its bytes through the owning document.
    ///
    /// # Errors
    /// Returns a not-found error if the document, the attachment or its bytes are
    /// missing, or if the attachment has expired.
    #[tracing::instrument(err(level = "debug"), skip(self), fields(document_id = %document_id, attachment_id = %attachment_id))]
    pub async fn retrieve(&self, document_id: &DocumentId, attachment_id: &AttachmentId) -> Result<(Attachment, Bytes)> {
        let document = self.repo.find_by_id(document_id).await?;
        let attachment = document.attachment(attachment_id)?;
        if attachment.is_expired_at(self.documents.now()) {
            return Err(AppError::AttachmentNotFound);
        }

        let data = self.blobs.retrieve(attachment_id).await?;
        Ok((attachment.clone(), data))
    }

    /// Lists attachments that have not expired. A missing document has none.
    ///
    /// # Errors
    /// Propagates repository failures other than `AppError::DocumentNotFound`.
    pub async fn list(&self, document_id: &DocumentId) -> Result<Vec<Attachment>> {
        match self.repo.find_by_id(document_id).await {
            Ok(document) => Ok(document.active_attachments(self.documents.now())),
            Err(AppError::DocumentNotFound) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    async fn register(&self, document: &mut Document, attachment: Attachment) -> Result<()> {
        document.add_attachment(attachment, self.documents.now())?;
        self.repo.save(document).await
    }

    async fn discard_blob(&self, id: &AttachmentId) {
        self.metrics.rollbacks.add(1, &[]);
        if let Err(e) = self.blobs.delete(id).await {
            tracing::warn!(error = %e, attachment_id = %id, "Failed to discard file after aborted upload");
            self.metrics.blob_delete_failures.add(1, &[]);
        }
    }
}
