use crate::api::schemas::files::AttachmentResponse;
use crate::domain::{Attachment, Document};
use crate::services::DocumentView;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// `?document=<id>`; absent or blank selects the default document.
#[derive(Debug, Default, Deserialize)]
pub struct DocumentQuery {
    pub document: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateContentRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ExtendExpirationRequest {
    pub seconds: u64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentResponse {
    pub document_id: String,
    pub content: String,
    pub version: u64,
    pub last_updated: i64,
    pub expires_at: i64,
    pub expires_in: String,
    pub attachments: Vec<AttachmentResponse>,
}

impl ContentResponse {
    /// Renders a document as seen at `now`, listing only live attachments.
    #[must_use]
    pub fn new(document: &Document, now: OffsetDateTime) -> Self {
        Self::build(document, &document.active_attachments(now), now)
    }

    fn build(document: &Document, attachments: &[Attachment], now: OffsetDateTime) -> Self {
        Self {
            document_id: document.id().to_string(),
            content: document.content().as_str().to_string(),
            version: document.version(),
            last_updated: document.last_updated().unix_timestamp(),
            expires_at: document.expires_at().instant().unix_timestamp(),
            expires_in: document.expires_at().human_readable(now),
            attachments: attachments.iter().map(AttachmentResponse::from).collect(),
        }
    }
}

impl From<&DocumentView> for ContentResponse {
    fn from(view: &DocumentView) -> Self {
        Self::build(&view.document, &view.attachments, view.as_of)
    }
}
