pub mod attachment_service;
pub mod document_service;
pub mod health_service;

pub use attachment_service::{AttachmentService, UploadRequest};
pub use document_service::{DocumentService, DocumentView};
pub use health_service::HealthService;
