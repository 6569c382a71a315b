use crate::domain::AttachmentId;
use crate::error::{AppError, Result};
use crate::storage::{BlobStorage, StorageStream};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Process-lifetime blob store with its own reader/writer lock.
#[derive(Debug, Default)]
pub struct InMemoryBlobStorage {
    blobs: RwLock<HashMap<AttachmentId, Bytes>>,
}

impl InMemoryBlobStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

#[async_trait]
impl BlobStorage for InMemoryBlobStorage {
    #[tracing::instrument(level = "debug", skip(self, stream), fields(attachment_id = %id, size = tracing::field::Empty))]
    async fn store(&self, id: &AttachmentId, mut stream: StorageStream) -> Result<u64> {
        // Buffer outside the lock; readers are never blocked on a slow upload.
        let mut buffer = BytesMut::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                tracing::warn!(error = %e, "Failed to read upload stream");
                AppError::Storage(format!("failed to read file content: {e}"))
            })?;
            buffer.extend_from_slice(&chunk);
        }

        let data = buffer.freeze();
        let size = u64::try_from(data.len()).unwrap_or(u64::MAX);
        tracing::Span::current().record("size", size);

        self.blobs.write().await.insert(id.clone(), data);
        Ok(size)
    }

    async fn retrieve(&self, id: &AttachmentId) -> Result<Bytes> {
        self.blobs.read().await.get(id).cloned().ok_or(AppError::BlobNotFound)
    }

    #[tracing::instrument(level = "debug", skip(self), fields(attachment_id = %id))]
    async fn delete(&self, id: &AttachmentId) -> Result<()> {
        self.blobs.write().await.remove(id);
        Ok(())
    }

    async fn exists(&self, id: &AttachmentId) -> Result<bool> {
        Ok(self.blobs.read().await.contains_key(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn stream_of(chunks: &[&'static [u8]]) -> StorageStream {
        stream::iter(chunks.iter().map(|c| Ok(Bytes::from_static(c))).collect::<Vec<_>>()).boxed()
    }

    #[tokio::test]
    async fn test_store_and_retrieve() {
        let storage = InMemoryBlobStorage::new();
        let id = AttachmentId::new("f1");

        let size = storage.store(&id, stream_of(&[b"hello ", b"world!"])).await.unwrap();
        assert_eq!(size, 12);
        assert!(storage.exists(&id).await.unwrap());
        assert_eq!(storage.retrieve(&id).await.unwrap(), Bytes::from_static(b"hello world!"));
    }

    #[tokio::test]
    async fn test_store_overwrites() {
        let storage = InMemoryBlobStorage::new();
        let id = AttachmentId::new("f1");

        storage.store(&id, stream_of(&[b"first"])).await.unwrap();
        storage.store(&id, stream_of(&[b"second"])).await.unwrap();
        assert_eq!(storage.retrieve(&id).await.unwrap(), Bytes::from_static(b"second"));
    }

    #[tokio::test]
    async fn test_retrieved_views_are_independent() {
        let storage = InMemoryBlobStorage::new();
        let id = AttachmentId::new("f1");
        storage.store(&id, stream_of(&[b"abc"])).await.unwrap();

        let first = storage.retrieve(&id).await.unwrap();
        storage.delete(&id).await.unwrap();

        assert_eq!(first, Bytes::from_static(b"abc"));
        assert_eq!(storage.retrieve(&id).await.unwrap_err(), AppError::BlobNotFound);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let storage = InMemoryBlobStorage::new();
        let id = AttachmentId::new("never-stored");
        assert!(storage.delete(&id).await.is_ok());
        assert!(storage.delete(&id).await.is_ok());
        assert!(!storage.exists(&id).await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_stream_stores_nothing() {
        let storage = InMemoryBlobStorage::new();
        let id = AttachmentId::new("f1");
        let failing: StorageStream = stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(std::io::Error::other("connection reset")),
        ])
        .boxed();

        assert!(matches!(storage.store(&id, failing).await, Err(AppError::Storage(_))));
        assert!(!storage.exists(&id).await.unwrap());
    }
}
