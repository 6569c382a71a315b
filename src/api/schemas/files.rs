use crate::domain::Attachment;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub name: String,
    pub document: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentResponse {
    pub id: String,
    pub document_id: String,
    pub file_name: String,
    pub mime_type: String,
    pub size: u64,
    pub uploaded_at: i64,
    pub expires_at: i64,
}

impl From<&Attachment> for AttachmentResponse {
    fn from(attachment: &Attachment) -> Self {
        Self {
            id: attachment.id().to_string(),
            document_id: attachment.document_id().to_string(),
            file_name: attachment.file_name().as_str().to_string(),
            mime_type: attachment.mime_type().as_str().to_string(),
            size: attachment.size().bytes(),
            uploaded_at: attachment.uploaded_at().unix_timestamp(),
            expires_at: attachment.expires_at().instant().unix_timestamp(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentListResponse {
    pub document_id: String,
    pub attachments: Vec<AttachmentResponse>,
}
