use crate::api::AppState;
use crate::api::schemas::content::{ContentResponse, DocumentQuery};
use crate::api::schemas::files::{AttachmentListResponse, AttachmentResponse, UploadQuery};
use crate::domain::{AttachmentId, DocumentId, FileName, MimeType};
use crate::error::{AppError, Result};
use crate::services::UploadRequest;
use axum::{
    Json,
    body::Body,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use futures::StreamExt;

/// Lists the document's live attachments.
///
/// # Errors
/// Returns a storage error if the document store fails.
pub async fn list_files(
    State(state): State<AppState>,
    Query(query): Query<DocumentQuery>,
) -> Result<Json<AttachmentListResponse>> {
    let id = DocumentId::or_default(query.document.as_deref());
    let attachments = state.attachment_service.list(&id).await?;
    Ok(Json(AttachmentListResponse {
        document_id: id.to_string(),
        attachments: attachments.iter().map(AttachmentResponse::from).collect(),
    }))
}

/// Uploads the raw request body as a file. The `Content-Type` header is the
/// file's type; without one the type is guessed from the file extension.
///
/// # Errors
/// Returns `AppError::BadRequest` without a `Content-Length`, or any validation
/// or expiration error from the upload.
pub async fn upload_file(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Body,
) -> Result<impl IntoResponse> {
    let size = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(|| AppError::BadRequest("Content-Length header is required".into()))?;

    let mime_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| FileName::new(&query.name).ok().map(|name| MimeType::guess_from(&name).as_str().to_string()));

    // Bridge Axum Body -> StorageStream (using neutral std::io::Error)
    let content = body.into_data_stream().map(|res| res.map_err(|e| std::io::Error::other(e.to_string()))).boxed();

    let attachment = state
        .attachment_service
        .upload(UploadRequest {
            document_id: DocumentId::or_default(query.document.as_deref()),
            file_name: query.name,
            mime_type,
            size,
            content,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(AttachmentResponse::from(&attachment))))
}

/// Downloads a file's bytes.
///
/// # Errors
/// Returns a not-found error if the document, the attachment or its bytes are missing.
pub async fn download_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<DocumentQuery>,
) -> Result<Response> {
    let document_id = DocumentId::or_default(query.document.as_deref());
    let (attachment, data) = state.attachment_service.retrieve(&document_id, &AttachmentId::new(id)).await?;

    let content_type = HeaderValue::from_str(attachment.mime_type().as_str())
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    // Browsers render images and text in place; everything else is saved.
    let mime_type = attachment.mime_type();
    let disposition_type = if mime_type.is_image() || mime_type.is_text() { "inline" } else { "attachment" };
    let disposition = HeaderValue::from_str(&format!(
        "{disposition_type}; filename=\"{}\"",
        attachment.file_name().as_str().replace('"', "")
    ));

    let mut response = Response::new(Body::from(data));
    let response_headers = response.headers_mut();
    response_headers.insert(header::CONTENT_TYPE, content_type);
    response_headers.insert(header::CONTENT_LENGTH, HeaderValue::from(attachment.size().bytes()));
    if let Ok(disposition) = disposition {
        response_headers.insert(header::CONTENT_DISPOSITION, disposition);
    }

    Ok(response)
}

/// Deletes a file and returns the updated document.
///
/// # Errors
/// Returns a not-found error if the document or the attachment is missing.
pub async fn delete_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<DocumentQuery>,
) -> Result<Json<ContentResponse>> {
    let document_id = DocumentId::or_default(query.document.as_deref());
    let document = state.attachment_service.delete(&document_id, &AttachmentId::new(id)).await?;
    Ok(Json(ContentResponse::new(&document, state.attachment_service.now())))
}
