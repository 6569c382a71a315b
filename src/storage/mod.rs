use crate::domain::{AttachmentId, Document, DocumentId};
use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

pub mod blob_store;
pub mod document_repo;

pub use blob_store::InMemoryBlobStorage;
pub use document_repo::InMemoryDocumentRepository;

/// A neutral byte stream used to hand file content to a [`BlobStorage`].
pub type StorageStream = BoxStream<'static, std::io::Result<Bytes>>;

/// Keyed storage of document snapshots.
///
/// Implementations must hand out copies: mutating a returned [`Document`] never
/// affects stored state until it is passed back to [`DocumentRepository::save`].
#[async_trait]
pub trait DocumentRepository: Send + Sync + 'static {
    /// # Errors
    /// Returns `AppError::DocumentNotFound` if no document is stored under `id`.
    async fn find_by_id(&self, id: &DocumentId) -> Result<Document>;

    /// Unconditionally replaces the stored copy. Last writer wins: no version
    /// check is made, so two concurrent read-modify-write cycles on the same id
    /// can lose one update.
    async fn save(&self, document: &Document) -> Result<()>;

    async fn exists(&self, id: &DocumentId) -> Result<bool>;

    async fn list_ids(&self) -> Result<Vec<DocumentId>>;

    /// Removes the record. Returns whether anything was removed.
    async fn delete(&self, id: &DocumentId) -> Result<bool>;

    /// Removes the record only if the stored copy is still at `expected_version`.
    /// The check and the removal happen atomically. Returns whether anything was
    /// removed; a missing or newer record is left alone.
    async fn delete_if_version(&self, id: &DocumentId, expected_version: u64) -> Result<bool>;
}

/// Keyed storage of attachment bytes, independent of document metadata.
#[async_trait]
pub trait BlobStorage: Send + Sync + 'static {
    /// Buffers the whole stream and stores it under `id`, overwriting any
    /// previous payload. Returns the number of bytes stored.
    async fn store(&self, id: &AttachmentId, stream: StorageStream) -> Result<u64>;

    /// # Errors
    /// Returns `AppError::BlobNotFound` if nothing is stored under `id`.
    async fn retrieve(&self, id: &AttachmentId) -> Result<Bytes>;

    /// Idempotent: deleting an absent id succeeds.
    async fn delete(&self, id: &AttachmentId) -> Result<()>;

    async fn exists(&self, id: &AttachmentId) -> Result<bool>;
}
