use crate::domain::attachment::{Attachment, AttachmentId};
use crate::domain::content::Content;
use crate::domain::expiration::ExpirationTime;
use crate::domain::policy::ExpirationPolicy;
use crate::error::{AppError, Result};
use std::collections::HashMap;
use time::{Duration, OffsetDateTime};

pub const DEFAULT_DOCUMENT_ID: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(String);

impl DocumentId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Maps a missing or blank caller-supplied id onto the default document.
    #[must_use]
    pub fn or_default(id: Option<&str>) -> Self {
        match id.map(str::trim) {
            Some(id) if !id.is_empty() => Self(id.to_string()),
            _ => Self::default(),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self(DEFAULT_DOCUMENT_ID.to_string())
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The document aggregate: content plus owned attachments, versioned as one unit.
///
/// Every operation that changes state bumps `version` by exactly one. Failed
/// operations leave the aggregate untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    id: DocumentId,
    content: Content,
    attachments: HashMap<AttachmentId, Attachment>,
    last_updated: OffsetDateTime,
    expires_at: ExpirationTime,
    version: u64,
}

impl Document {
    #[must_use]
    pub fn new(id: DocumentId, now: OffsetDateTime) -> Self {
        Self {
            id,
            content: Content::empty(),
            attachments: HashMap::new(),
            last_updated: now,
            expires_at: ExpirationTime::default_from(now),
            version: 1,
        }
    }

    #[must_use]
    pub fn restore(
        id: DocumentId,
        content: Content,
        attachments: impl IntoIterator<Item = Attachment>,
        last_updated: OffsetDateTime,
        expires_at: ExpirationTime,
        version: u64,
    ) -> Self {
        let attachments = attachments.into_iter().map(|a| (a.id().clone(), a)).collect();
        Self { id, content, attachments, last_updated, expires_at, version }
    }

    #[must_use]
    pub const fn id(&self) -> &DocumentId {
        &self.id
    }

    #[must_use]
    pub const fn content(&self) -> &Content {
        &self.content
    }

    #[must_use]
    pub const fn last_updated(&self) -> OffsetDateTime {
        self.last_updated
    }

    #[must_use]
    pub const fn expires_at(&self) -> ExpirationTime {
        self.expires_at
    }

    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.expires_at.is_expired_at(now)
    }

    /// Replaces the content and renews expiration. Equal content is a no-op.
    ///
    /// # Errors
    /// Returns `AppError::Expired` if the document has expired.
    pub fn update_content(&mut self, content: Content, now: OffsetDateTime) -> Result<()> {
        self.ensure_active(now)?;
        if self.content == content {
            return Ok(());
        }

        self.content = content;
        self.touch(now);
        self.expires_at = ExpirationTime::default_from(now);
        Ok(())
    }

    /// # Errors
    /// Returns `AppError::Expired` if the document has expired, or
    /// `AppError::DuplicateAttachment` if the id is already present.
    pub fn add_attachment(&mut self, attachment: Attachment, now: OffsetDateTime) -> Result<()> {
        self.ensure_active(now)?;
        if self.attachments.contains_key(attachment.id()) {
            return Err(AppError::DuplicateAttachment);
        }

        self.attachments.insert(attachment.id().clone(), attachment);
        self.touch(now);
        self.expires_at = ExpirationTime::default_from(now);
        Ok(())
    }

    /// Removes an attachment. Allowed after expiration and does not renew it.
    ///
    /// # Errors
    /// Returns `AppError::AttachmentNotFound` if the id is absent.
    pub fn remove_attachment(&mut self, id: &AttachmentId, now: OffsetDateTime) -> Result<Attachment> {
        let removed = self.attachments.remove(id).ok_or(AppError::AttachmentNotFound)?;
        self.touch(now);
        Ok(removed)
    }

    /// Empties the content and renews expiration. No expiration check is made.
    pub fn clear(&mut self, now: OffsetDateTime) {
        self.content = Content::empty();
        self.touch(now);
        self.expires_at = ExpirationTime::default_from(now);
    }

    /// # Errors
    /// Returns `AppError::Expired` if the document has already expired.
    pub fn extend_expiration(&mut self, by: Duration, now: OffsetDateTime) -> Result<()> {
        self.ensure_active(now)?;
        self.expires_at = self.expires_at.extend_by(by, now);
        self.touch(now);
        Ok(())
    }

    /// # Errors
    /// Returns `AppError::AttachmentNotFound` if the id is absent.
    pub fn attachment(&self, id: &AttachmentId) -> Result<&Attachment> {
        self.attachments.get(id).ok_or(AppError::AttachmentNotFound)
    }

    /// Snapshot of all attachments, in no particular order.
    #[must_use]
    pub fn attachments(&self) -> Vec<Attachment> {
        self.attachments.values().cloned().collect()
    }

    /// Attachments whose own expiration has not yet passed.
    #[must_use]
    pub fn active_attachments(&self, now: OffsetDateTime) -> Vec<Attachment> {
        self.attachments.values().filter(|a| !a.is_expired_at(now)).cloned().collect()
    }

    #[must_use]
    pub fn attachment_count(&self) -> usize {
        self.attachments.len()
    }

    fn ensure_active(&self, now: OffsetDateTime) -> Result<()> {
        ExpirationPolicy::default().validate_access(self, now)
    }

    fn touch(&mut self, now: OffsetDateTime) {
        self.last_updated = now;
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::expiration::DEFAULT_EXPIRATION;
    use crate::domain::file::{FileName, FileSize, MimeType};
    use std::collections::HashSet;

    fn t0() -> OffsetDateTime {
        OffsetDateTime::UNIX_EPOCH + Duration::days(20_000)
    }

    fn attachment(id: &str, now: OffsetDateTime) -> Attachment {
        Attachment::new(
            AttachmentId::new(id),
            DocumentId::new("d1"),
            FileName::new("notes.txt").unwrap(),
            MimeType::new("text/plain"),
            FileSize::new(12).unwrap(),
            now,
        )
    }

    fn expired_document(now: OffsetDateTime) -> Document {
        Document::restore(
            DocumentId::new("d1"),
            Content::new("old").unwrap(),
            [attachment("f1", now - Duration::days(2))],
            now - Duration::days(2),
            ExpirationTime::from_instant(now - Duration::hours(1)),
            5,
        )
    }

    #[test]
    fn test_new_document() {
        let doc = Document::new(DocumentId::new("d1"), t0());
        assert_eq!(doc.version(), 1);
        assert!(doc.content().is_empty());
        assert_eq!(doc.attachment_count(), 0);
        assert_eq!(doc.expires_at().remaining(t0()), DEFAULT_EXPIRATION);
    }

    #[test]
    fn test_update_content_bumps_version_once() {
        let mut doc = Document::new(DocumentId::new("d1"), t0());
        let later = t0() + Duration::hours(3);

        doc.update_content(Content::new("hello").unwrap(), later).unwrap();
        assert_eq!(doc.version(), 2);
        assert_eq!(doc.content().as_str(), "hello");
        assert_eq!(doc.last_updated(), later);
        assert_eq!(doc.expires_at().instant(), later + DEFAULT_EXPIRATION);

        let even_later = later + Duration::hours(1);
        doc.update_content(Content::new("hello").unwrap(), even_later).unwrap();
        assert_eq!(doc.version(), 2);
        assert_eq!(doc.last_updated(), later);
        assert_eq!(doc.expires_at().instant(), later + DEFAULT_EXPIRATION);
    }

    #[test]
    fn test_expired_document_rejects_mutation_unchanged() {
        let now = t0();
        let mut doc = expired_document(now);
        let before = doc.clone();

        assert_eq!(doc.update_content(Content::new("new").unwrap(), now), Err(AppError::Expired));
        assert_eq!(doc.add_attachment(attachment("f2", now), now), Err(AppError::Expired));
        assert_eq!(doc.extend_expiration(Duration::hours(1), now), Err(AppError::Expired));
        assert_eq!(doc, before);
    }

    #[test]
    fn test_expired_document_allows_removal() {
        let now = t0();
        let mut doc = expired_document(now);
        let expires_at = doc.expires_at();

        let removed = doc.remove_attachment(&AttachmentId::new("f1"), now).unwrap();
        assert_eq!(removed.id().as_str(), "f1");
        assert_eq!(doc.version(), 6);
        assert_eq!(doc.attachment_count(), 0);
        assert_eq!(doc.expires_at(), expires_at);
    }

    #[test]
    fn test_add_attachment_renews_expiration() {
        let mut doc = Document::new(DocumentId::new("d1"), t0());
        let later = t0() + Duration::hours(20);

        doc.add_attachment(attachment("f1", later), later).unwrap();
        assert_eq!(doc.version(), 2);
        assert_eq!(doc.attachment_count(), 1);
        assert_eq!(doc.expires_at().instant(), later + DEFAULT_EXPIRATION);
        assert_eq!(doc.attachment(&AttachmentId::new("f1")).unwrap().file_name().as_str(), "notes.txt");
    }

    #[test]
    fn test_duplicate_attachment_rejected() {
        let now = t0();
        let mut doc = Document::new(DocumentId::new("d1"), now);
        doc.add_attachment(attachment("f1", now), now).unwrap();
        let before = doc.clone();

        assert_eq!(doc.add_attachment(attachment("f1", now), now + Duration::minutes(1)), Err(AppError::DuplicateAttachment));
        assert_eq!(doc, before);
    }

    #[test]
    fn test_remove_missing_attachment() {
        let mut doc = Document::new(DocumentId::new("d1"), t0());
        assert_eq!(doc.remove_attachment(&AttachmentId::new("nope"), t0()).unwrap_err(), AppError::AttachmentNotFound);
        assert_eq!(doc.version(), 1);
        assert_eq!(doc.attachment(&AttachmentId::new("nope")).unwrap_err(), AppError::AttachmentNotFound);
    }

    #[test]
    fn test_clear_ignores_expiration() {
        let now = t0();
        let mut doc = expired_document(now);

        doc.clear(now);
        assert!(doc.content().is_empty());
        assert_eq!(doc.version(), 6);
        assert!(!doc.is_expired_at(now));
        assert_eq!(doc.expires_at().instant(), now + DEFAULT_EXPIRATION);
    }

    #[test]
    fn test_extend_expiration() {
        let now = t0();
        let mut doc = Document::new(DocumentId::new("d1"), now);

        doc.extend_expiration(Duration::hours(2), now).unwrap();
        assert_eq!(doc.version(), 2);
        assert_eq!(doc.expires_at().instant(), now + DEFAULT_EXPIRATION + Duration::hours(2));
    }

    #[test]
    fn test_attachments_snapshot_is_detached() {
        let now = t0();
        let mut doc = Document::new(DocumentId::new("d1"), now);
        for id in ["a", "b", "c"] {
            doc.add_attachment(attachment(id, now), now).unwrap();
        }

        let ids: HashSet<String> = doc.attachments().iter().map(|a| a.id().to_string()).collect();
        assert_eq!(ids, HashSet::from(["a".to_string(), "b".to_string(), "c".to_string()]));
        assert_eq!(doc.version(), 4);
    }

    #[test]
    fn test_active_attachments_skip_expired_files() {
        let now = t0();
        let mut doc = Document::new(DocumentId::new("d1"), now);
        doc.add_attachment(attachment("old", now - Duration::days(2)), now).unwrap();
        doc.add_attachment(attachment("new", now), now).unwrap();

        let active = doc.active_attachments(now);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id().as_str(), "new");
        assert_eq!(doc.attachment_count(), 2);
    }

    #[test]
    fn test_document_id_defaults() {
        assert_eq!(DocumentId::or_default(None).as_str(), DEFAULT_DOCUMENT_ID);
        assert_eq!(DocumentId::or_default(Some("  ")).as_str(), DEFAULT_DOCUMENT_ID);
        assert_eq!(DocumentId::or_default(Some("d1")).as_str(), "d1");
    }
}
