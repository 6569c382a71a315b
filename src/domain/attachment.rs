use crate::domain::document::DocumentId;
use crate::domain::expiration::ExpirationTime;
use crate::domain::file::{FileName, FileSize, MimeType};
use rand::{RngCore, rngs::OsRng};
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttachmentId(String);

impl AttachmentId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a random 128-bit identifier, hex encoded.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        OsRng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AttachmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A file attached to a document. Immutable once created.
///
/// `document_id` is bookkeeping only; ownership lives in the document's attachment map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    id: AttachmentId,
    document_id: DocumentId,
    file_name: FileName,
    mime_type: MimeType,
    size: FileSize,
    uploaded_at: OffsetDateTime,
    expires_at: ExpirationTime,
}

impl Attachment {
    #[must_use]
    pub fn new(
        id: AttachmentId,
        document_id: DocumentId,
        file_name: FileName,
        mime_type: MimeType,
        size: FileSize,
        now: OffsetDateTime,
    ) -> Self {
        Self {
            id,
            document_id,
            file_name,
            mime_type,
            size,
            uploaded_at: now,
            expires_at: ExpirationTime::default_from(now),
        }
    }

    #[must_use]
    pub const fn restore(
        id: AttachmentId,
        document_id: DocumentId,
        file_name: FileName,
        mime_type: MimeType,
        size: FileSize,
        uploaded_at: OffsetDateTime,
        expires_at: ExpirationTime,
    ) -> Self {
        Self { id, document_id, file_name, mime_type, size, uploaded_at, expires_at }
    }

    #[must_use]
    pub const fn id(&self) -> &AttachmentId {
        &self.id
    }

    #[must_use]
    pub const fn document_id(&self) -> &DocumentId {
        &self.document_id
    }

    #[must_use]
    pub const fn file_name(&self) -> &FileName {
        &self.file_name
    }

    #[must_use]
    pub const fn mime_type(&self) -> &MimeType {
        &self.mime_type
    }

    #[must_use]
    pub const fn size(&self) -> FileSize {
        self.size
    }

    #[must_use]
    pub const fn uploaded_at(&self) -> OffsetDateTime {
        self.uploaded_at
    }

    #[must_use]
    pub const fn expires_at(&self) -> ExpirationTime {
        self.expires_at
    }

    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.expires_at.is_expired_at(now)
    }
}
